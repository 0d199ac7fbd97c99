use clap::Parser;
use clos_router_rs::RouterError;
use clos_router_rs::fabric::FabricStats;
use clos_router_rs::report::{render_heatmap, render_port_map, render_summary};
use clos_router_rs::router::{ConflictPolicy, Router, RouterConfig};
use clos_router_rs::telemetry::{DEFAULT_PROGRESS_INTERVAL, ProgressReporter};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Parser)]
#[command(
    name = "clos-router",
    about = "Route multicast connections through a C(N,N,N) Clos fabric"
)]
struct Args {
    /// Command file: one `in.out.out...` route or `!in` clear per line
    routes: PathBuf,

    /// Write the final state snapshot (JSON) to this path
    #[arg(long)]
    json: Option<PathBuf>,

    /// Clos size N (switches per stage, ports per switch)
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u16).range(1..))]
    size: u16,

    /// Try a local repair before falling back to a full repack
    #[arg(long)]
    incremental: bool,

    /// Seconds between PROGRESS log lines; 0 disables the reporter
    #[arg(long, default_value_t = DEFAULT_PROGRESS_INTERVAL.as_secs())]
    progress_secs: u64,

    /// Skip rejected lines (parse errors, out-of-range ids, conflicts) instead of halting
    #[arg(long)]
    continue_on_conflict: bool,

    /// Print heatmap, port map and fabric summary at exit
    #[arg(long)]
    summary: bool,

    /// Disable logging
    #[arg(long)]
    quiet: bool,
}

fn exit_code(err: &RouterError) -> ExitCode {
    match err {
        e if e.is_rejection() => ExitCode::from(1),
        RouterError::Infeasible(_) | RouterError::Invariant(_) => ExitCode::from(2),
        _ => ExitCode::from(3),
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(if args.quiet {
            tracing_subscriber::EnvFilter::new("off")
        } else {
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
        })
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let config = RouterConfig {
        size: usize::from(args.size),
        incremental: args.incremental,
        conflict_policy: if args.continue_on_conflict {
            ConflictPolicy::Skip
        } else {
            ConflictPolicy::Halt
        },
    };
    let mut router = Router::new(config);

    let mut reporter = if args.progress_secs > 0 {
        let interval = Duration::from_secs(args.progress_secs);
        match ProgressReporter::spawn(router.metrics().clone(), interval) {
            Ok(reporter) => Some(reporter),
            Err(e) => {
                warn!(error = %e, "progress reporter unavailable");
                None
            }
        }
    } else {
        None
    };

    let result = File::open(&args.routes)
        .map_err(RouterError::from)
        .and_then(|file| router.run(BufReader::new(file)));

    if let Some(reporter) = reporter.as_mut() {
        reporter.stop();
    }

    let metrics = router.metrics().snapshot();
    let mut code = match &result {
        Ok(summary) => {
            println!(
                "done: lines={}, resolves={}, rejected={}, repacks={}, repairs={}, solve_nodes={}, repair_nodes={}",
                summary.lines,
                summary.resolves,
                summary.rejected,
                metrics.repack_count,
                metrics.repair_count,
                metrics.solve_nodes_total,
                metrics.repair_nodes_total
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            exit_code(e)
        }
    };

    // Halts still emit whatever state and counters were reached.
    if let Some(path) = &args.json {
        match router.snapshot().write_to(path) {
            Ok(()) => println!("Wrote {}", path.display()),
            Err(e) => {
                eprintln!("error: {e}");
                code = ExitCode::from(3);
            }
        }
    }

    if args.summary {
        let state = router.state();
        println!();
        print!("{}", render_heatmap(state));
        println!();
        print!("{}", render_port_map(state));
        println!();
        print!("{}", render_summary(&FabricStats::compute(state), state.topology().n()));
    }

    code
}
