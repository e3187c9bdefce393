//! Route model: decoded path plus ordered turn-by-turn instructions.
//!
//! A [`Route`] is built once from the directions provider's encoded polyline
//! and step list and is never mutated afterwards. Recalculation produces a new
//! route that replaces the old one wholesale.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::geo::{BoundingBox, Coordinate};
use crate::polyline::decode_polyline;

/// Discrete maneuver kinds understood by the voice and progress layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Maneuver {
    #[default]
    Straight,
    TurnLeft,
    TurnRight,
    TurnSlightLeft,
    TurnSlightRight,
    TurnSharpLeft,
    TurnSharpRight,
    UturnLeft,
    UturnRight,
    KeepLeft,
    KeepRight,
    ForkLeft,
    ForkRight,
    RampLeft,
    RampRight,
    Merge,
    RoundaboutLeft,
    RoundaboutRight,
    Ferry,
}

impl Maneuver {
    /// Parse a provider maneuver string such as `turn-left`. Unknown or empty
    /// values fall back to [`Maneuver::Straight`].
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Maneuver::Straight;
        };
        match raw {
            "turn-left" => Maneuver::TurnLeft,
            "turn-right" => Maneuver::TurnRight,
            "turn-slight-left" => Maneuver::TurnSlightLeft,
            "turn-slight-right" => Maneuver::TurnSlightRight,
            "turn-sharp-left" => Maneuver::TurnSharpLeft,
            "turn-sharp-right" => Maneuver::TurnSharpRight,
            "uturn-left" => Maneuver::UturnLeft,
            "uturn-right" => Maneuver::UturnRight,
            "keep-left" => Maneuver::KeepLeft,
            "keep-right" => Maneuver::KeepRight,
            "fork-left" => Maneuver::ForkLeft,
            "fork-right" => Maneuver::ForkRight,
            "ramp-left" => Maneuver::RampLeft,
            "ramp-right" => Maneuver::RampRight,
            "merge" => Maneuver::Merge,
            "roundabout-left" => Maneuver::RoundaboutLeft,
            "roundabout-right" => Maneuver::RoundaboutRight,
            "ferry" | "ferry-train" => Maneuver::Ferry,
            _ => Maneuver::Straight,
        }
    }
}

impl fmt::Display for Maneuver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Maneuver::Straight => "continue straight",
            Maneuver::TurnLeft => "turn left",
            Maneuver::TurnRight => "turn right",
            Maneuver::TurnSlightLeft => "turn slightly left",
            Maneuver::TurnSlightRight => "turn slightly right",
            Maneuver::TurnSharpLeft => "turn sharp left",
            Maneuver::TurnSharpRight => "turn sharp right",
            Maneuver::UturnLeft | Maneuver::UturnRight => "make a U-turn",
            Maneuver::KeepLeft => "keep left",
            Maneuver::KeepRight => "keep right",
            Maneuver::ForkLeft => "take the left fork",
            Maneuver::ForkRight => "take the right fork",
            Maneuver::RampLeft => "take the ramp on the left",
            Maneuver::RampRight => "take the ramp on the right",
            Maneuver::Merge => "merge",
            Maneuver::RoundaboutLeft | Maneuver::RoundaboutRight => "enter the roundabout",
            Maneuver::Ferry => "take the ferry",
        };
        f.write_str(text)
    }
}

/// One step as supplied by the directions provider, before cleanup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawStep {
    /// Instruction text, possibly containing HTML markup.
    pub instruction_html: String,
    pub distance_text: String,
    pub duration_text: String,
    pub maneuver: Option<String>,
    /// Where the maneuver takes place.
    pub start_location: Coordinate,
}

/// A cleaned, immutable turn-by-turn instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub text: String,
    pub distance_text: String,
    pub duration_text: String,
    pub maneuver: Maneuver,
    pub anchor: Coordinate,
    pub street_name: Option<String>,
}

impl Instruction {
    pub fn from_raw(step: &RawStep) -> Self {
        Self {
            text: strip_markup(&step.instruction_html),
            distance_text: step.distance_text.trim().to_string(),
            duration_text: step.duration_text.trim().to_string(),
            maneuver: Maneuver::parse(step.maneuver.as_deref()),
            anchor: step.start_location,
            street_name: extract_street_name(&step.instruction_html),
        }
    }
}

/// A calculated route owned by a single navigation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    path: Vec<Coordinate>,
    instructions: Vec<Instruction>,
    total_distance_text: String,
    total_duration_text: String,
    bounds: Option<BoundingBox>,
}

impl Route {
    pub fn path(&self) -> &[Coordinate] {
        &self.path
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn instruction(&self, index: usize) -> Option<&Instruction> {
        self.instructions.get(index)
    }

    pub fn total_distance_text(&self) -> &str {
        &self.total_distance_text
    }

    pub fn total_duration_text(&self) -> &str {
        &self.total_duration_text
    }

    pub fn bounds(&self) -> Option<BoundingBox> {
        self.bounds
    }

    pub fn destination(&self) -> Option<Coordinate> {
        self.path.last().copied()
    }

    /// Returns the route with its summary texts set.
    pub fn with_summary(mut self, distance_text: &str, duration_text: &str) -> Self {
        self.total_distance_text = distance_text.trim().to_string();
        self.total_duration_text = duration_text.trim().to_string();
        self
    }
}

/// Build a route from an encoded polyline and raw provider steps.
///
/// A malformed polyline yields an empty path instead of an error so the
/// progress tracker keeps working off the instruction anchors. When no bounds
/// are supplied they are computed from the decoded path.
pub fn build_route(encoded_polyline: &str, steps: &[RawStep], bounds: Option<BoundingBox>) -> Route {
    let path = match decode_polyline(encoded_polyline) {
        Ok(path) => path,
        Err(err) => {
            warn!(error = %err, "discarding malformed route polyline");
            Vec::new()
        }
    };
    let bounds = bounds.or_else(|| BoundingBox::enclosing(&path));
    Route {
        instructions: steps.iter().map(Instruction::from_raw).collect(),
        path,
        total_distance_text: String::new(),
        total_duration_text: String::new(),
        bounds,
    }
}

/// Remove HTML tags, decode the handful of entities providers emit and
/// collapse runs of whitespace.
pub fn strip_markup(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => {
                in_tag = true;
                text.push(' ');
            }
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }
    let text = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Pull the street name out of instruction text like `Turn left onto <b>Main St</b>`.
///
/// Only the primary sentence is inspected; trailing `<div>` notes such as
/// "Destination will be on the right" are ignored.
pub fn extract_street_name(instruction_html: &str) -> Option<String> {
    let primary = instruction_html.split("<div").next().unwrap_or_default();
    let text = strip_markup(primary);
    let start = [" onto ", " on ", " toward "]
        .iter()
        .find_map(|marker| text.find(marker).map(|idx| idx + marker.len()))?;
    let rest = &text[start..];
    let end = [" toward ", " for ", ","]
        .iter()
        .filter_map(|marker| rest.find(marker))
        .min()
        .unwrap_or(rest.len());
    let name = rest[..end].trim();
    (!name.is_empty()).then(|| name.to_string())
}
