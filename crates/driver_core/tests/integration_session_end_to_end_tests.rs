mod support;

use driver_core::runner::{run_until_empty, run_until_empty_with_hook};
use driver_core::trip::TripStatus;
use driver_core::voice::VoiceCommand;

use support::session::{sample_trip, TestSessionConfig};

#[test]
fn drives_sample_route_and_announces_each_turn() {
    let (mut session, mut queue, end_ms) = sample_trip(&TestSessionConfig::default());
    assert_eq!(end_ms, 240_000);

    let report = run_until_empty(&mut session, &mut queue, 1_000);
    assert_eq!(report.steps, 28);
    assert_eq!(report.ignored_actions, 0);

    let spoken = report.spoken_texts();
    assert_eq!(spoken.len(), 7, "spoken: {spoken:?}");
    assert_eq!(spoken[0], "Head north on Pyay Rd");
    assert!(spoken[1].starts_with("In ") && spoken[1].ends_with(", turn right onto Inya Rd"));
    assert_eq!(spoken[2], "Turn right onto Inya Rd");
    assert!(spoken[3].ends_with(", turn left onto Kaba Aye Pagoda Rd"));
    assert_eq!(spoken[4], "Turn left onto Kaba Aye Pagoda Rd");
    assert!(spoken[5].contains("keep right to stay on Kaba Aye Pagoda Rd"));
    assert!(spoken[6].starts_with("Keep right to stay on Kaba Aye Pagoda Rd"));
    assert_eq!(report.voice.last(), Some(&VoiceCommand::Stop));
}

#[test]
fn completed_trip_fare_matches_metered_distance() {
    let (mut session, mut queue, _) = sample_trip(&TestSessionConfig::default());
    let report = run_until_empty(&mut session, &mut queue, 1_000);

    let summary = report.completed.first().copied().expect("completed trip");
    // Corners are cut between fixes and the last few meters fall under the
    // jitter threshold, so slightly less than the 2.31 km path is metered.
    assert!(summary.distance_km > 2.2 && summary.distance_km < 2.31, "{}", summary.distance_km);
    let fare = summary.fare;
    assert_eq!(fare.base_fare, 2000);
    assert_eq!(fare.distance_charge, (summary.distance_km * 600.0).round() as u64);
    assert_eq!(fare.total, fare.base_fare + fare.distance_charge);
    assert_eq!(summary.elapsed_ms(), 240_000);
    assert_eq!(summary.active_ms(), 240_000);

    assert_eq!(session.trip().status(), TripStatus::Completed);
    assert!(session.route().is_none());
    assert_eq!(session.log().total_earnings(), fare.total);
}

#[test]
fn odometer_never_decreases() {
    let config = TestSessionConfig {
        jitter_m: 6.0,
        ..TestSessionConfig::default()
    };
    let (mut session, mut queue, _) = sample_trip(&config);
    let mut readings = Vec::new();
    run_until_empty_with_hook(&mut session, &mut queue, 1_000, |session, _| {
        readings.push(session.trip().distance_km());
    });
    assert!(readings.windows(2).all(|pair| pair[1] >= pair[0]));
    assert!(readings.last().copied().unwrap_or_default() > 2.0);
}

#[test]
fn seeded_runs_are_reproducible() {
    let config = TestSessionConfig {
        jitter_m: 6.0,
        seed: 7,
        ..TestSessionConfig::default()
    };
    let (mut first, mut first_queue, _) = sample_trip(&config);
    let (mut second, mut second_queue, _) = sample_trip(&config);
    let a = run_until_empty(&mut first, &mut first_queue, 1_000);
    let b = run_until_empty(&mut second, &mut second_queue, 1_000);
    assert_eq!(a, b);
}

#[test]
fn muted_session_still_meters_the_trip() {
    let config = TestSessionConfig {
        muted: true,
        ..TestSessionConfig::default()
    };
    let (mut session, mut queue, _) = sample_trip(&config);
    let report = run_until_empty(&mut session, &mut queue, 1_000);
    assert!(report.spoken_texts().is_empty());
    assert_eq!(report.completed.len(), 1);
    assert!(report.completed[0].distance_km > 2.2);
}
