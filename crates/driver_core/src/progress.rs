//! Route-progress tracking: maps live positions to the current instruction.
//!
//! Two selection modes:
//!
//! - **Cursor** (default): searches from the current cursor forward for the
//!   instruction anchor closest to the position and advances the cursor to it.
//!   The cursor never moves backwards, so GPS noise cannot regress progress.
//! - **Nearest**: searches the whole route on every update.
//!
//! In both modes equidistant anchors resolve to the earlier index.

use serde::{Deserialize, Serialize};

use crate::geo::{distance_meters, Coordinate};
use crate::route::{Instruction, Route};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressMode {
    #[default]
    Cursor,
    Nearest,
}

/// Derived progress for one position update. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NavigationProgress {
    /// The route has no instructions to follow.
    NoInstruction,
    OnRoute {
        current_instruction_index: usize,
        /// Index of the following instruction, if any.
        next_instruction_index: Option<usize>,
        /// Distance from the position to the current instruction's anchor.
        distance_to_next_instruction_m: f64,
    },
}

impl NavigationProgress {
    pub fn current_index(&self) -> Option<usize> {
        match self {
            NavigationProgress::NoInstruction => None,
            NavigationProgress::OnRoute {
                current_instruction_index,
                ..
            } => Some(*current_instruction_index),
        }
    }

    pub fn distance_m(&self) -> Option<f64> {
        match self {
            NavigationProgress::NoInstruction => None,
            NavigationProgress::OnRoute {
                distance_to_next_instruction_m,
                ..
            } => Some(*distance_to_next_instruction_m),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RouteProgressTracker {
    route: Route,
    mode: ProgressMode,
    cursor: usize,
    last_announced_instruction_index: Option<usize>,
    last_progress: NavigationProgress,
}

impl RouteProgressTracker {
    pub fn new(route: Route, mode: ProgressMode) -> Self {
        Self {
            route,
            mode,
            cursor: 0,
            last_announced_instruction_index: None,
            last_progress: NavigationProgress::NoInstruction,
        }
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn mode(&self) -> ProgressMode {
        self.mode
    }

    pub fn last_progress(&self) -> NavigationProgress {
        self.last_progress
    }

    pub fn last_announced_instruction_index(&self) -> Option<usize> {
        self.last_announced_instruction_index
    }

    pub fn mark_announced(&mut self, index: usize) {
        self.last_announced_instruction_index = Some(index);
    }

    /// Instruction selected by the most recent update.
    pub fn current_instruction(&self) -> Option<&Instruction> {
        self.last_progress
            .current_index()
            .and_then(|idx| self.route.instruction(idx))
    }

    /// Recompute progress for a new position.
    pub fn update(&mut self, position: Coordinate) -> NavigationProgress {
        let instructions = self.route.instructions();
        let search_from = match self.mode {
            ProgressMode::Cursor => self.cursor.min(instructions.len()),
            ProgressMode::Nearest => 0,
        };

        let progress = match closest_anchor(&instructions[search_from..], position) {
            None => NavigationProgress::NoInstruction,
            Some((offset, distance)) => {
                let index = search_from + offset;
                if self.mode == ProgressMode::Cursor {
                    self.cursor = index;
                }
                let next = index + 1;
                NavigationProgress::OnRoute {
                    current_instruction_index: index,
                    next_instruction_index: (next < instructions.len()).then_some(next),
                    distance_to_next_instruction_m: distance,
                }
            }
        };

        self.last_progress = progress;
        progress
    }
}

/// Index (relative to the slice) and distance of the closest anchor. The
/// strict comparison keeps the earliest index on ties.
fn closest_anchor(instructions: &[Instruction], position: Coordinate) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, instruction) in instructions.iter().enumerate() {
        let distance = distance_meters(position, instruction.anchor);
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((idx, distance)),
        }
    }
    best
}
