use clap::Parser;
use k8s_lse::{
    Cli, Config, EffectiveConfig,
    handlers::{HandlerResult, run_list_mode, run_scan_mode},
};
use std::io::IsTerminal;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("warn,k8s_lse={default_level}"))),
        )
        .init();

    if !std::io::stderr().is_terminal() {
        colored::control::set_override(false);
    }

    let config = match &cli.config {
        Some(path) => match Config::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {e}");
                return HandlerResult::Error(2).into();
            }
        },
        None => Config::load(std::env::current_dir().ok().as_deref()),
    };

    let effective = match EffectiveConfig::from_cli_and_config(&cli, &config) {
        Ok(effective) => effective,
        Err(e) => {
            eprintln!("Error: {e}");
            return HandlerResult::Error(2).into();
        }
    };

    if effective.list {
        return run_list_mode(&effective).await;
    }
    run_scan_mode(&effective).await
}
