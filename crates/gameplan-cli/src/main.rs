//! `gameplan` command-line front-end

mod cli;
mod report;

use anyhow::Context;
use gameplan_core::{GameplanError, Orchestrator};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    match run_cli().await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("Error: {err:#}");
            std::process::exit(1);
        }
    }
}

async fn run_cli() -> anyhow::Result<i32> {
    let argv = std::env::args_os().map(|arg| arg.to_string_lossy().into_owned());
    let invocation = match cli::Invocation::parse_from(argv) {
        Ok(invocation) => invocation,
        Err(err) => {
            err.print().context("writing usage")?;
            return Ok(err.exit_code());
        }
    };

    init_tracing(invocation.verbose);

    let cwd = std::env::current_dir().context("reading current directory")?;
    let config = invocation.into_config(&cwd);
    tracing::debug!("Run configuration: {}", serde_json::to_string(&config)?);

    match Orchestrator::new().run(&config).await {
        Ok(destination) => {
            for line in report::success(&cwd, &destination) {
                println!("{line}");
            }
            Ok(0)
        }
        Err(GameplanError::ModuleArguments(err)) => {
            err.print().context("writing gameplan usage")?;
            Ok(err.exit_code())
        }
        Err(err) => {
            tracing::debug!("Run failed: {:?}", err);
            for line in report::diagnostic(&err) {
                eprintln!("{line}");
            }
            Ok(err.exit_code())
        }
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
