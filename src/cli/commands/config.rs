use anyhow::{Context, Result};
use clap::Subcommand;

use crate::cli::output::get_formatter;
use crate::models::{API_KEY_ENV, Config, LoadedConfig, OutputFormat, api_key_from_env};

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    #[command(about = "Write a config file with default values")]
    Init {
        #[arg(
            long,
            short = 'g',
            help = "Create the user config instead of ./cvbot.toml"
        )]
        global: bool,
        #[arg(long, help = "Force overwrite existing config")]
        force: bool,
    },
    #[command(about = "Show the effective configuration")]
    Show,
    #[command(about = "Show configuration file paths")]
    Path,
}

pub async fn handle_config(
    cmd: ConfigCommand,
    loaded: &LoadedConfig,
    format: OutputFormat,
) -> Result<()> {
    match cmd {
        ConfigCommand::Init { global, force } => handle_init(global, force, format),
        ConfigCommand::Show => handle_show(loaded, format),
        ConfigCommand::Path => handle_path(loaded, format),
    }
}

fn handle_init(global: bool, force: bool, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format);
    let path = if global {
        Config::global_path()
            .ok_or_else(|| anyhow::anyhow!("could not determine config directory"))?
    } else {
        Config::local_path()
    };

    if path.exists() && !force {
        anyhow::bail!(
            "Config already exists at: {}\nUse --force to overwrite.",
            path.display()
        );
    }

    Config::default()
        .save(&path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!(
        "{}",
        formatter.format_message(&format!("Created config at: {}", path.display()))
    );
    Ok(())
}

fn handle_show(loaded: &LoadedConfig, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&loaded.config)?);
        return Ok(());
    }

    match loaded.path {
        Some(ref path) => println!("# Loaded from: {}", path.display()),
        None => println!("# No config file found, using defaults"),
    }
    let key_state = if api_key_from_env().is_some() {
        "set"
    } else {
        "not set"
    };
    println!("# {API_KEY_ENV}: {key_state}");
    println!();
    print!("{}", toml::to_string_pretty(&loaded.config)?);
    Ok(())
}

fn handle_path(loaded: &LoadedConfig, format: OutputFormat) -> Result<()> {
    let candidates = Config::search_paths(None);

    if format == OutputFormat::Json {
        let output = serde_json::json!({
            "active": loaded.path,
            "search_paths": candidates,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Configuration paths (in lookup order):");
    println!();
    for path in &candidates {
        let marker = if loaded.path.as_deref() == Some(path.as_path()) {
            "active"
        } else if path.exists() {
            "shadowed"
        } else {
            "missing"
        };
        println!("  {} ({marker})", path.display());
    }
    if let Some(ref path) = loaded.path
        && !candidates.contains(path)
    {
        println!("  {} (active, from --config)", path.display());
    }

    Ok(())
}
