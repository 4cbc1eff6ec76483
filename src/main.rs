use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod api;
mod auth;
mod config;
mod dashboard;
mod data;
mod kudos;
mod report;
mod snapshot;
mod stats;

use api::StravaApi;
use config::Config;
use snapshot::Snapshot;

#[derive(Parser)]
#[command(name = "hlaupa")]
#[command(about = "Strava running statistics, dashboard and kudos toolkit")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch the activity history, print the report and write a snapshot
    Analyze {
        /// Where to write the JSON snapshot
        #[arg(long, default_value = "running_data.json")]
        snapshot: PathBuf,
    },
    /// Render the HTML dashboard from an existing snapshot
    Dashboard {
        /// Snapshot produced by `hlaupa analyze`
        #[arg(long, default_value = "running_data.json")]
        snapshot: PathBuf,
        /// Output HTML file
        #[arg(long, default_value = "dashboard.html")]
        out: PathBuf,
    },
    /// Scan club feeds and give kudos to every activity not yet acknowledged
    Kudos {
        /// Club to scan; repeat for several
        #[arg(long = "club", required = true)]
        clubs: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Analyze { snapshot } => analyze(snapshot).await,
        Command::Dashboard { snapshot, out } => {
            dashboard::generate(&snapshot, &out)?;
            println!("Dashboard generated: {}", out.display());
            Ok(())
        }
        Command::Kudos { clubs } => give_kudos(clubs).await,
    }
}

async fn analyze(snapshot_path: PathBuf) -> Result<()> {
    let api = StravaApi::new(Config::load());
    let token = api.access_token().await?;
    info!("access token obtained");

    let activities = api.athlete_activities(&token).await?;

    match stats::analyze(&activities) {
        Some(stats) => {
            report::print_report(&stats);
            Snapshot::from_stats(&stats).write(&snapshot_path)?;
            println!("\nSnapshot written: {}", snapshot_path.display());
        }
        None => println!("No running activities found."),
    }

    Ok(())
}

async fn give_kudos(clubs: Vec<String>) -> Result<()> {
    let api = StravaApi::new(Config::load());
    let token = api.access_token().await?;
    info!(clubs = clubs.len(), "starting kudos scan");

    let report = kudos::run(&api, &token, &clubs).await?;
    println!("{}", report.summary());

    Ok(())
}
