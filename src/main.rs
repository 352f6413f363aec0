use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use lifetime_di::config::logging_config::validate_level;
use lifetime_di::config::{AppConfig, ConfigLoader};
use lifetime_di::infrastructure::container::{Registry, ServiceContainer};
use lifetime_di::logging::{init_logging, LogFormat, LoggingConfig};
use lifetime_di::sample::{register_duck_services, run_walkthrough, NameCounter, Transcript};

/// 演示程序命令行参数
#[derive(Parser, Debug)]
#[clap(
    name = "lifetime-di",
    version,
    about = "Transient and scoped service lifetimes, demonstrated with ducks"
)]
struct Cli {
    /// Configuration file (defaults to the per-user config location)
    #[clap(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log filter level, overrides config and environment
    #[clap(long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Log output format
    #[clap(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

/// 支持的子命令
#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Replay the duck-feeding walkthrough
    Demo,
    /// List the sample registry's services and lifetimes
    Registrations,
    /// Print the effective configuration as TOML
    ShowConfig,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path.clone()),
        None => ConfigLoader::new().load_config(),
    }
    .context("failed to load configuration")?;

    if let Some(level) = &cli.log_level {
        config.logging.level = validate_level(level).context("invalid --log-level")?;
    }
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }

    init_logging(LoggingConfig::from_section(&config.logging))
        .map_err(|e| anyhow!(e))
        .context("failed to initialize logging")?;

    match cli.command {
        Command::Demo => demo(&config),
        Command::Registrations => registrations(),
        Command::ShowConfig => {
            print!("{}", config.to_toml().context("failed to render configuration")?);
            Ok(())
        }
    }
}

fn sample_registry(transcript: &Transcript) -> Result<Registry> {
    let mut registry = Registry::new();
    register_duck_services(&mut registry, NameCounter::default(), transcript.clone())
        .context("failed to register sample services")?;
    Ok(registry)
}

fn demo(config: &AppConfig) -> Result<()> {
    let transcript = Transcript::default();
    let container = ServiceContainer::with_config(
        sample_registry(&transcript)?,
        config.container.clone(),
    );

    run_walkthrough(&container).context("walkthrough failed")?;

    for line in transcript.lines() {
        println!("{}", line);
    }

    tracing::info!("{}", container.get_performance_summary());
    Ok(())
}

fn registrations() -> Result<()> {
    let registry = sample_registry(&Transcript::default())?;

    for registration in registry.iter() {
        let disposable = if registration.is_disposable() { ", disposable" } else { "" };
        println!(
            "{:<40} {}{}",
            registration.key().short_name(),
            registration.lifetime(),
            disposable
        );
    }
    Ok(())
}
