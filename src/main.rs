use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use cvbot::app::init_tracing;
use cvbot::cli::commands::{handle_ask, handle_config, handle_index, handle_serve};
use cvbot::cli::output::get_formatter;
use cvbot::cli::{Cli, Commands};
use cvbot::models::{Config, LoadedConfig, OutputFormat};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let format = cli.format.unwrap_or_default();

    match run(cli, format).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let message = get_formatter(format).format_error(&format!("{e:#}"));
            eprintln!("{}", message.trim_end());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, format: OutputFormat) -> Result<()> {
    let loaded = Config::load(cli.config.as_deref())?;
    let verbose = cli.verbose;

    // The server handles the signal itself and drains in-flight requests.
    let serving = matches!(cli.command, Commands::Serve(_));
    let command = run_command(cli.command, loaded, format, verbose);
    if serving {
        return command.await;
    }

    tokio::select! {
        result = command => result,
        _ = cvbot::shutdown_signal() => {
            eprintln!("\nReceived shutdown signal, exiting...");
            Ok(())
        }
    }
}

async fn run_command(
    command: Commands,
    loaded: LoadedConfig,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    match command {
        Commands::Serve(args) => {
            handle_serve(args, loaded.config, verbose).await?;
        }
        Commands::Ask(args) => {
            handle_ask(args, loaded.config, format, verbose).await?;
        }
        Commands::Index(args) => {
            handle_index(args, loaded.config, format, verbose).await?;
        }
        Commands::Config(cmd) => {
            handle_config(cmd, &loaded, format).await?;
        }
    }

    Ok(())
}
