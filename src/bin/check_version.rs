//! Command-line version check.
//!
//! Exit codes: 0 up to date or no releases, 1 error, 2 update available.
//! With `--json` the report is printed as JSON and the exit code is 0.

use anyhow::Context;
use clap::Parser;

use cors_proxy::config::Config;
use cors_proxy::version::{VersionChecker, VersionStatus};

/// Check whether a newer release is published
#[derive(Parser, Debug)]
#[command(name = "check-version", version)]
struct Args {
    /// Output in JSON format
    #[arg(long, short = 'j')]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let cfg = Config::load().context("Failed to load configuration")?;
    let report = VersionChecker::new(cfg.version)?.check().await;

    if args.json {
        println!("{}", serde_json::to_string(&report)?);
        return Ok(());
    }

    println!("Current version: {}", report.current_version);
    match report.status {
        VersionStatus::Error => {
            println!(
                "Could not check for updates: {}",
                report.error.as_deref().unwrap_or("unknown error")
            );
        }
        VersionStatus::NoReleases => println!("No releases published yet"),
        VersionStatus::UpToDate => println!("You're running the latest version"),
        VersionStatus::UpdateAvailable => {
            println!(
                "New version available: {}",
                report.latest_version.as_deref().unwrap_or_default()
            );
            println!("Run `git pull` to update");
        }
    }

    std::process::exit(report.exit_code());
}
