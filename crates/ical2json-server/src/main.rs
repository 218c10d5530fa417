//! ical2json-server entry point.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use ical2json_core::{TracingConfig, init_tracing};
use ical2json_providers::NextcloudClient;
use ical2json_server::{ServerArgs, ServerResult};

#[tokio::main]
async fn main() -> ExitCode {
    let args = ServerArgs::parse();

    let tracing_config = if args.debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::server()
    };
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "server failed");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: ServerArgs) -> ServerResult<()> {
    let config = args.into_config()?;
    let client = NextcloudClient::new(config.nextcloud.clone())?;
    ical2json_server::serve(config, Arc::new(client)).await
}
