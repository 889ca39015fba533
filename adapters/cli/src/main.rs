#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a Neon Heist mission headlessly.

mod generation;
mod layout;
mod simulation;

use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use clap::Parser;
use neon_heist_core::{FailureReason, MissionOutcome, MissionReport};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{generation::Scatter, layout::MazeLayout, simulation::Simulation};

/// Command-line arguments accepted by the Neon Heist adapter.
#[derive(Debug, Parser)]
#[command(name = "neon-heist", about = "Runs a Neon Heist mission on autopilot")]
struct Args {
    /// TOML maze layout; defaults to the built-in blueprint extraction maze.
    #[arg(long, value_name = "FILE")]
    layout: Option<PathBuf>,
    /// Scatters extra seeded walls over the maze.
    #[arg(long, value_name = "N")]
    seed: Option<u64>,
    /// Simulated time cap in seconds; defaults to the mission time limit plus one.
    #[arg(long, value_name = "SECONDS")]
    max_seconds: Option<u64>,
    /// Prints the final report as JSON.
    #[arg(long)]
    json: bool,
}

/// Entry point for the Neon Heist command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let layout = match &args.layout {
        Some(path) => MazeLayout::load(path)
            .with_context(|| format!("failed to load layout {}", path.display()))?,
        None => MazeLayout::blueprint_extraction(),
    };

    let layout = match args.seed {
        Some(seed) => match generation::scatter_walls(&layout, seed)
            .context("failed to generate maze")?
        {
            Scatter::Generated(layout) => layout,
            Scatter::Exhausted => bail!("seed {seed} produced no maze with reachable objectives"),
        },
        None => layout,
    };

    let setup = layout.to_setup().context("invalid maze layout")?;
    let max_time = args.max_seconds.map_or_else(
        || Duration::from_secs(u64::from(setup.time_limit_secs) + 1),
        Duration::from_secs,
    );

    let mut simulation = Simulation::new();
    let report = simulation.run(setup, max_time)?;

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("failed to encode report")?;
        println!("{json}");
    } else {
        println!("{}", simulation.welcome_banner());
        println!("{}", render_report(&report));
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn render_report(report: &MissionReport) -> String {
    let headline = match report.outcome {
        MissionOutcome::Succeeded => "Mission complete: blueprint extracted.",
        MissionOutcome::Failed { reason } => match reason {
            FailureReason::TimeExpired => "Mission failed: time ran out.",
            FailureReason::Detected => "Mission failed: spotted by a guard.",
            FailureReason::Lockdown => "Mission failed: facility locked down.",
            FailureReason::Aborted => "Mission aborted.",
        },
    };

    format!(
        "{headline}\nTime remaining: {}/{} s\nScore: {}%\nKeys collected: {}\nSecurity level: {}",
        report.time_remaining_secs,
        report.time_limit_secs,
        report.score_percent,
        report.keys_collected,
        report.security_level,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_text_report() {
        let report = MissionReport::new(MissionOutcome::Succeeded, 300, 150, 2, 0);

        assert_eq!(
            render_report(&report),
            "Mission complete: blueprint extracted.\nTime remaining: 150/300 s\nScore: 50%\n\
             Keys collected: 2\nSecurity level: 0"
        );
    }

    #[test]
    fn args_parse_all_flags() {
        let args = Args::try_parse_from([
            "neon-heist",
            "--layout",
            "maze.toml",
            "--seed",
            "9",
            "--max-seconds",
            "20",
            "--json",
        ])
        .expect("arguments parse");

        assert_eq!(args.layout, Some(PathBuf::from("maze.toml")));
        assert_eq!(args.seed, Some(9));
        assert_eq!(args.max_seconds, Some(20));
        assert!(args.json);
    }
}
