use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use clap::Parser;
use log::info;
use spyglass::{report, Options};

/// Push the deployment described in model.yaml to the Spyglass dashboard.
///
/// Credentials and the target deployment come from SPYGLASS_API_KEY,
/// DEPLOYMENT_ID and SPYGLASS_API_BASE_URL.
#[derive(Parser, Debug)]
#[command(name = "spyglass-deploy", author, version)]
struct Cli {
    /// Config file to read, overrides SPYGLASS_CONFIG_PATH
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(
        long,
        env = "SPYGLASS_TIMEOUT_SECS",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    timeout: u64,

    /// Validate and print the request without sending it
    #[arg(long)]
    dry_run: bool,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // clap exits with 2 on usage errors, which is taken by environment errors.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.use_stderr() => {
            e.print()?;
            std::process::exit(1)
        }
        Err(e) => e.exit(),
    };

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_target(false)
        .try_init()?;

    info!("Starting Spyglass deployment update");

    let options = Options {
        config_path: cli.config,
        timeout: Duration::from_secs(cli.timeout),
        dry_run: cli.dry_run,
    };

    let code = match spyglass::run(|name| std::env::var(name).ok(), &options).await {
        Ok(outcome) => report::success(&outcome),
        Err(failure) => report::failure(&failure),
    };

    std::process::exit(code)
}
