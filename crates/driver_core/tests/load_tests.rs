mod support;

use driver_core::clock::{DriverAction, EventQueue};
use driver_core::config::DriverConfig;
use driver_core::geo::Coordinate;
use driver_core::polyline::encode_polyline;
use driver_core::route::{build_route, RawStep};
use driver_core::runner::{run_until_empty, run_until_empty_with_hook};
use driver_core::session::NavigationSession;
use driver_core::simulation::{RouteWalker, WalkerConfig};
use driver_core::test_helpers::{sample_route, sample_route_path};

use support::events::{action, route_ready};

/// Staircase route: alternating north and east legs of roughly 300 m.
fn staircase(legs: usize) -> (Vec<Coordinate>, Vec<RawStep>) {
    let mut path = vec![Coordinate::new(16.7, 96.1)];
    for idx in 0..legs {
        let last = path[path.len() - 1];
        let next = if idx % 2 == 0 {
            Coordinate::new(last.latitude + 0.0027, last.longitude)
        } else {
            Coordinate::new(last.latitude, last.longitude + 0.0028)
        };
        path.push(next);
    }
    let steps = path[..legs]
        .iter()
        .enumerate()
        .map(|(idx, anchor)| RawStep {
            instruction_html: format!("Leg <b>{idx}</b>"),
            distance_text: "0.3 km".to_string(),
            duration_text: "1 min".to_string(),
            maneuver: Some(if idx % 2 == 0 { "turn-left" } else { "turn-right" }.to_string()),
            start_location: *anchor,
        })
        .collect();
    (path, steps)
}

#[test]
#[ignore] // Only run explicitly: cargo test --package driver_core --test load_tests -- --ignored
fn long_route_with_noisy_fixes() {
    let legs = 400;
    let (path, steps) = staircase(legs);
    let route = build_route(&encode_polyline(&path), &steps, None);
    assert_eq!(route.instructions().len(), legs);

    let mut session = NavigationSession::open(DriverConfig::default());
    let mut queue = EventQueue::default();
    queue.schedule(route_ready(0, route));
    let mut walker = RouteWalker::new(
        path,
        WalkerConfig {
            speed_kmh: 40.0,
            interval_ms: 3_000,
            jitter_m: 5.0,
            seed: Some(11),
        },
    );
    walker.schedule_trip(&mut queue, 0);
    let scheduled = queue.len();

    let mut cursor = Vec::new();
    let report = run_until_empty_with_hook(&mut session, &mut queue, 100_000, |session, _| {
        cursor.push(session.snapshot().progress.current_index());
    });

    assert_eq!(report.steps, scheduled);
    assert_eq!(report.completed.len(), 1);
    let indices: Vec<usize> = cursor.into_iter().flatten().collect();
    assert!(indices.windows(2).all(|pair| pair[1] >= pair[0]));
    assert_eq!(indices.last().copied(), Some(legs - 1));
    // Every leg gets at least its early announcement.
    assert!(report.spoken_texts().len() >= legs);
}

#[test]
#[ignore]
fn full_shift_of_back_to_back_trips() {
    let trips = 50u64;
    let mut session = NavigationSession::open(DriverConfig::default());
    let mut queue = EventQueue::default();
    let mut walker = RouteWalker::new(
        sample_route_path(),
        WalkerConfig {
            jitter_m: 4.0,
            seed: Some(3),
            ..WalkerConfig::default()
        },
    );

    let mut start_ms = 0;
    for _ in 0..trips {
        queue.schedule(route_ready(start_ms, sample_route()));
        let end_ms = walker.schedule_trip(&mut queue, start_ms);
        queue.schedule(action(end_ms + 1_000, DriverAction::ResetTrip));
        start_ms = end_ms + 60_000;
    }

    let report = run_until_empty(&mut session, &mut queue, usize::MAX);
    assert_eq!(report.completed.len(), trips as usize);
    assert_eq!(report.ignored_actions, 0);
    assert_eq!(session.log().len(), trips as usize);
    let average_km = session.log().total_distance_km() / trips as f64;
    assert!(average_km > 2.2 && average_km < 2.4, "{average_km}");
}
