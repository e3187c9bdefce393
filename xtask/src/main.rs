use std::path::Path;
use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand, ValueEnum};

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the driver navigation workspace",
    long_about = "A unified CLI for running trip simulations, benchmarks,\n\
                  load tests and CI checks in the driver navigation workspace."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive the built-in route with simulated fixes
    Simulate {
        /// Simulated speed in km/h
        #[arg(long, default_value_t = 30.0)]
        speed_kmh: f64,
        /// GPS jitter radius in meters
        #[arg(long, default_value_t = 0.0)]
        jitter_m: f64,
        /// Seed for reproducible jitter
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Run Criterion benchmarks
    Bench,
    /// Compare benchmarks: stash changes, create baseline, restore, compare
    BenchCompare,
    /// Run CI checks (fmt, clippy, tests, benchmarks)
    Ci {
        /// Job to run
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
    /// Run load tests (ignored tests in driver_core)
    LoadTest,
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting, clippy, and tests
    Check,
    /// Build and test with the HTTP directions provider enabled
    Directions,
    /// Run benchmarks
    Bench,
    /// Run check + directions + bench
    All,
}

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn cargo(args: &[&str]) -> ExitStatus {
    eprintln!("+ cargo {}", args.join(" "));
    Command::new("cargo")
        .args(args)
        .status()
        .expect("failed to execute cargo")
}

fn git(args: &[&str]) -> ExitStatus {
    eprintln!("+ git {}", args.join(" "));
    Command::new("git")
        .args(args)
        .status()
        .expect("failed to execute git")
}

fn run_cargo(args: &[&str]) {
    let status = cargo(args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

fn run_git(args: &[&str]) {
    let status = git(args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

fn run_bench(extra: &[&str]) {
    let mut args = vec!["bench", "--package", "driver_core", "--bench", "performance"];
    if !extra.is_empty() {
        args.push("--");
        args.extend_from_slice(extra);
    }
    run_cargo(&args);
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_check() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--workspace",
        "--all-targets",
        "--",
        "-D",
        "warnings",
    ]);

    step("Test driver_core");
    run_cargo(&["test", "-p", "driver_core"]);

    step("Test driver_cli");
    run_cargo(&["test", "-p", "driver_cli"]);
}

fn ci_directions() {
    step("Clippy with directions feature");
    run_cargo(&[
        "clippy",
        "--workspace",
        "--all-targets",
        "--features",
        "driver_core/directions,driver_cli/directions",
        "--",
        "-D",
        "warnings",
    ]);

    step("Test driver_core with directions feature");
    run_cargo(&["test", "-p", "driver_core", "--features", "directions"]);
}

fn ci_bench() {
    step("Run benchmarks");
    run_bench(&[]);
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            speed_kmh,
            jitter_m,
            seed,
        } => {
            let speed = speed_kmh.to_string();
            let jitter = jitter_m.to_string();
            let seed = seed.to_string();
            run_cargo(&[
                "run",
                "-p",
                "driver_cli",
                "--release",
                "--",
                "simulate",
                "--speed-kmh",
                &speed,
                "--jitter-m",
                &jitter,
                "--seed",
                &seed,
            ]);
        }
        Commands::Bench => run_bench(&[]),
        Commands::BenchCompare => {
            let baseline_dir = Path::new("target/criterion");
            if baseline_dir.exists() {
                step("Removing existing benchmark data");
                std::fs::remove_dir_all(baseline_dir).expect("failed to remove target/criterion");
            }

            step("Stashing current changes");
            run_git(&[
                "stash",
                "push",
                "-m",
                "Temporary stash for benchmark comparison",
            ]);

            step("Running benchmark to create baseline");
            run_bench(&["--save-baseline", "main"]);

            step("Reapplying changes");
            run_git(&["stash", "pop"]);

            step("Running benchmark comparing against baseline");
            run_bench(&["--baseline", "main"]);

            eprintln!("\nDone! Check the output above to see performance comparison.");
        }
        Commands::Ci { job } => {
            match job {
                CiJob::Check => ci_check(),
                CiJob::Directions => ci_directions(),
                CiJob::Bench => ci_bench(),
                CiJob::All => {
                    ci_check();
                    ci_directions();
                    ci_bench();
                }
            }
            eprintln!("\nCI job passed.");
        }
        Commands::LoadTest => {
            run_cargo(&[
                "test",
                "-p",
                "driver_core",
                "--test",
                "load_tests",
                "--",
                "--ignored",
            ]);
        }
    }
}
