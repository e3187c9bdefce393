use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use driver_core::clock::{DriverAction, EventQueue, RouteUpdate, SessionEvent};
use driver_core::config::DriverConfig;
use driver_core::directions::parse_directions_json;
use driver_core::error::DriverError;
use driver_core::fare::{CumulativeAdditions, DemandTier, FareBreakdown};
#[cfg(feature = "directions")]
use driver_core::geo::Coordinate;
use driver_core::geo::path_length_meters;
use driver_core::polyline::decode_polyline;
use driver_core::runner::run_until_empty;
use driver_core::session::NavigationSession;
use driver_core::simulation::{demo_route, RouteWalker, WalkerConfig};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "driver", about = "Navigation and fare-meter tools for the driver app core")]
struct Cli {
    /// JSON configuration file; every field is optional
    #[arg(long, global = true, env = "DRIVER_CONFIG")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode an encoded polyline and print its coordinates as JSON
    Decode {
        polyline: String,
    },
    /// Compute a fare breakdown
    Fare {
        #[arg(long)]
        distance_km: f64,
        /// Demand surcharge in currency units
        #[arg(long, default_value_t = 0)]
        demand: u64,
        /// Cumulative addition; may be repeated
        #[arg(long = "add")]
        additions: Vec<u64>,
    },
    /// Drive a route with simulated fixes and print announcements and the trip summary
    Simulate {
        /// Directions response JSON to drive; defaults to a built-in route
        #[arg(long)]
        route_json: Option<PathBuf>,
        #[arg(long, default_value_t = 30.0)]
        speed_kmh: f64,
        #[arg(long, default_value_t = 3_000)]
        interval_ms: u64,
        #[arg(long, default_value_t = 0.0)]
        jitter_m: f64,
        #[arg(long)]
        seed: Option<u64>,
        /// Demand surcharge selected right after the trip starts
        #[arg(long, default_value_t = 0)]
        demand: u64,
    },
    /// Request a route from the configured directions endpoint
    #[cfg(feature = "directions")]
    Route {
        #[arg(long, value_parser = parse_coordinate)]
        origin: Coordinate,
        #[arg(long, value_parser = parse_coordinate)]
        destination: Coordinate,
        #[arg(long, env = "DIRECTIONS_API_KEY")]
        api_key: Option<String>,
    },
}

#[derive(Serialize)]
struct SimulationReport<'a> {
    path_length_m: f64,
    fixes: usize,
    announcements: Vec<&'a str>,
    ignored_actions: usize,
    trips: &'a [driver_core::trip::TripSummary],
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "command failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), DriverError> {
    let config = match &cli.config {
        Some(path) => DriverConfig::from_json_file(path)?,
        None => DriverConfig::default(),
    };

    match cli.command {
        Commands::Decode { polyline } => {
            let path = decode_polyline(&polyline)?;
            print_json(&path)
        }
        Commands::Fare {
            distance_km,
            demand,
            additions,
        } => {
            let mut cumulative = CumulativeAdditions::default();
            for amount in additions {
                cumulative.add(amount);
            }
            let fare = FareBreakdown::compute(&config.fare, distance_km, DemandTier(demand), &cumulative);
            print_json(&fare)
        }
        Commands::Simulate {
            route_json,
            speed_kmh,
            interval_ms,
            jitter_m,
            seed,
            demand,
        } => {
            let route = match route_json {
                Some(path) => {
                    let json = std::fs::read_to_string(&path).map_err(|err| {
                        DriverError::RouteCalculation(format!("failed to read {}: {err}", path.display()))
                    })?;
                    parse_directions_json(&json)?.into_route()
                }
                None => demo_route(),
            };
            if route.path().is_empty() {
                return Err(DriverError::RouteCalculation("route has no path to drive".into()));
            }

            let mut walker = RouteWalker::new(
                route.path().to_vec(),
                WalkerConfig {
                    speed_kmh,
                    interval_ms,
                    jitter_m,
                    seed,
                },
            );
            let fixes = walker.fixes(0).len();
            let path_length_m = path_length_meters(route.path());
            info!(fixes, path_length_m, "simulating trip");

            let mut session = NavigationSession::open(config);
            let mut queue = EventQueue::default();
            queue.schedule(SessionEvent::Route {
                at_ms: 0,
                update: RouteUpdate::Ready(route),
            });
            walker.schedule_trip(&mut queue, 0);
            if demand > 0 {
                queue.schedule(SessionEvent::Action {
                    at_ms: 0,
                    action: DriverAction::SelectDemand(DemandTier(demand)),
                });
            }
            let report = run_until_empty(&mut session, &mut queue, usize::MAX);

            print_json(&SimulationReport {
                path_length_m,
                fixes,
                announcements: report.spoken_texts(),
                ignored_actions: report.ignored_actions,
                trips: &report.completed,
            })
        }
        #[cfg(feature = "directions")]
        Commands::Route {
            origin,
            destination,
            api_key,
        } => {
            let mut directions = config.directions.clone();
            if api_key.is_some() {
                directions.api_key = api_key;
            }
            let provider = driver_core::directions::build_directions_provider(&directions)?;
            let raw = provider.calculate_route(origin, destination, &directions.route_options())?;
            print_json(&raw.into_route())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), DriverError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|err| DriverError::Config(format!("failed to serialize output: {err}")))?;
    println!("{json}");
    Ok(())
}

/// Parse `lat,lng`.
#[cfg(feature = "directions")]
fn parse_coordinate(value: &str) -> Result<Coordinate, String> {
    let (lat, lng) = value
        .split_once(',')
        .ok_or_else(|| format!("expected `lat,lng`, got `{value}`"))?;
    let lat: f64 = lat.trim().parse().map_err(|err| format!("bad latitude: {err}"))?;
    let lng: f64 = lng.trim().parse().map_err(|err| format!("bad longitude: {err}"))?;
    Ok(Coordinate::new(lat, lng))
}
