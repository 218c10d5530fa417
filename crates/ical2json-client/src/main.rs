//! ical2json CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use ical2json_core::{TracingConfig, init_tracing};

use ical2json_client::cli::{Cli, Command, ConfigAction};
use ical2json_client::commands;
use ical2json_client::config::ClientConfig;
use ical2json_client::error::ClientResult;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing_config = if cli.debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::cli()
    };
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("warning: failed to initialize logging: {}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let config_path = cli.config.clone().unwrap_or_else(ClientConfig::default_path);
    let config = match cli.config {
        Some(ref path) => ClientConfig::load_from(path)?,
        None => ClientConfig::load()?,
    };

    match cli.command {
        Some(Command::Config { action }) => match action {
            ConfigAction::Dump => commands::config::dump(&config, &config_path),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(),
        },
        None => {
            let request = commands::convert::ConvertRequest::resolve(&cli, &config)?;
            let json = commands::convert::run(&request).await?;
            println!("{}", json);
            Ok(())
        }
    }
}
