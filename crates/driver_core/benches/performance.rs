//! Performance benchmarks for driver_core using Criterion.rs.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use driver_core::clock::{EventQueue, RouteUpdate, SessionEvent};
use driver_core::config::DriverConfig;
use driver_core::geo::Coordinate;
use driver_core::polyline::{decode_polyline, encode_polyline};
use driver_core::progress::{ProgressMode, RouteProgressTracker};
use driver_core::route::{build_route, RawStep, Route};
use driver_core::runner::run_until_empty;
use driver_core::session::NavigationSession;
use driver_core::simulation::{RouteWalker, WalkerConfig};

/// Zigzag path of `points` coordinates with one instruction per point.
fn synthetic_route(points: usize) -> (Vec<Coordinate>, Route) {
    let path: Vec<Coordinate> = (0..points)
        .map(|i| {
            let lat = 16.7 + i as f64 * 0.0009;
            let lng = 96.1 + if i % 2 == 0 { 0.0 } else { 0.0009 };
            Coordinate::new(lat, lng)
        })
        .collect();
    let steps: Vec<RawStep> = path
        .iter()
        .enumerate()
        .map(|(i, anchor)| RawStep {
            instruction_html: format!("Turn <b>left</b> onto <b>Street {i}</b>"),
            distance_text: "0.1 km".to_string(),
            duration_text: "1 min".to_string(),
            maneuver: Some("turn-left".to_string()),
            start_location: *anchor,
        })
        .collect();
    let route = build_route(&encode_polyline(&path), &steps, None);
    (path, route)
}

fn bench_polyline_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("polyline_decode");
    for points in [100, 1_000, 10_000] {
        let (path, _) = synthetic_route(points);
        let encoded = encode_polyline(&path);
        group.bench_with_input(BenchmarkId::from_parameter(points), &encoded, |b, encoded| {
            b.iter(|| black_box(decode_polyline(black_box(encoded))));
        });
    }
    group.finish();
}

fn bench_progress_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("progress_update");
    let (path, route) = synthetic_route(500);
    let position = path[path.len() / 2];
    for (name, mode) in [("cursor", ProgressMode::Cursor), ("nearest", ProgressMode::Nearest)] {
        group.bench_function(name, |b| {
            b.iter_batched(
                || RouteProgressTracker::new(route.clone(), mode),
                |mut tracker| black_box(tracker.update(black_box(position))),
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_session_loop(c: &mut Criterion) {
    let scenarios = [("small", 50), ("medium", 200), ("large", 1_000)];

    let mut group = c.benchmark_group("session_loop");
    for (name, points) in scenarios {
        let (path, route) = synthetic_route(points);
        group.bench_with_input(BenchmarkId::from_parameter(name), &(path, route), |b, (path, route)| {
            b.iter(|| {
                let mut session = NavigationSession::open(DriverConfig::default());
                let mut queue = EventQueue::default();
                queue.schedule(SessionEvent::Route {
                    at_ms: 0,
                    update: RouteUpdate::Ready(route.clone()),
                });
                let mut walker = RouteWalker::new(
                    path.clone(),
                    WalkerConfig {
                        jitter_m: 5.0,
                        seed: Some(42),
                        ..WalkerConfig::default()
                    },
                );
                walker.schedule_trip(&mut queue, 0);
                black_box(run_until_empty(&mut session, &mut queue, 1_000_000));
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_polyline_decode, bench_progress_update, bench_session_loop);
criterion_main!(benches);
