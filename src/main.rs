//! Entity Registry main binary
//!
//! This binary provides the entity registry server and the client
//! commands for validating and uploading entity documents.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use entity_registry::api::EntityRegistryApi;
use entity_registry::batch::{
    self, AutoConfirm, BatchOptions, BatchReport, StdinPrompt, VersionPrompter,
};
use entity_registry::client::RemoteClient;
use entity_registry::registry::RegistryManager;
use entity_registry::{RegistryConfig, ENTITY_REGISTRY_VERSION};

#[derive(Parser)]
#[command(name = "entity-registry")]
#[command(about = "SOFT/DLite Entity Registry")]
#[command(version = ENTITY_REGISTRY_VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Output format for validation reports
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Yaml,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the entity registry server
    Serve {
        /// Configuration file path
        #[arg(short, long, default_value = "config/entity-registry.toml")]
        config: PathBuf,

        /// API host
        #[arg(long)]
        host: Option<String>,

        /// API port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Validate entity files or directories
    Validate {
        /// Entity files or directories (directories are read one level deep)
        #[arg(required = true)]
        sources: Vec<PathBuf>,

        /// Report format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Abort on the first failure
        #[arg(long)]
        fail_fast: bool,

        /// Skip the remote existence check
        #[arg(long)]
        no_external_calls: bool,

        /// Treat a differing remote entity as an error
        #[arg(long)]
        strict: bool,
    },

    /// Validate and upload entity files or directories
    Upload {
        /// Entity files or directories (directories are read one level deep)
        #[arg(required = true)]
        sources: Vec<PathBuf>,

        /// Abort on the first failure
        #[arg(long)]
        fail_fast: bool,

        /// Accept proposed version bumps without prompting
        #[arg(long)]
        auto_confirm: bool,

        /// Treat a differing remote entity as an error
        #[arg(long)]
        strict: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Generate example configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "entity-registry.toml")]
        output: PathBuf,
    },

    /// Validate configuration file
    Validate {
        /// Configuration file path
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Show current configuration
    Show {
        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

/// Serializable per-entity line of a validation report
#[derive(Serialize)]
struct ReportEntry {
    uri: String,
    variant: entity_registry::EntityVariant,
    source: String,
    state: String,
}

/// Serializable per-file failure line
#[derive(Serialize)]
struct ReportFailure {
    source: String,
    error: String,
}

#[derive(Serialize)]
struct ReportSummary {
    validated: Vec<ReportEntry>,
    failures: Vec<ReportFailure>,
}

impl ReportSummary {
    fn from_report(report: &BatchReport) -> Self {
        Self {
            validated: report
                .entries
                .iter()
                .map(|entry| ReportEntry {
                    uri: entry.entity.uri().to_string(),
                    variant: entry.entity.variant(),
                    source: entry.source.display().to_string(),
                    state: entry.state.to_string(),
                })
                .collect(),
            failures: report
                .failures
                .iter()
                .map(|failure| ReportFailure {
                    source: failure.source.display().to_string(),
                    error: failure.error.to_string(),
                })
                .collect(),
        }
    }
}

fn print_report(report: &BatchReport, format: OutputFormat) -> Result<()> {
    let summary = ReportSummary::from_report(report);
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(&summary)?),
        OutputFormat::Text => {
            for entry in &summary.validated {
                println!(
                    "ok   {} [{}] ({}) {}",
                    entry.uri, entry.variant, entry.state, entry.source
                );
            }
            for failure in &summary.failures {
                println!("FAIL {}: {}", failure.source, failure.error);
            }
            println!(
                "{} validated, {} failed",
                summary.validated.len(),
                summary.failures.len()
            );
        }
    }
    Ok(())
}

fn load_config(path: &PathBuf) -> Result<RegistryConfig> {
    let config = if path.exists() {
        let config = RegistryConfig::from_file(path)?;
        info!("Configuration loaded from: {}", path.display());
        config
    } else {
        warn!(
            "Configuration file not found: {}. Using defaults.",
            path.display()
        );
        RegistryConfig::load_with_defaults()?
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config, host, port } => {
            let mut config = match load_config(&config) {
                Ok(config) => config,
                Err(e) => {
                    error!("Failed to load configuration: {}", e);
                    std::process::exit(1);
                }
            };

            // Override configuration with CLI arguments
            if let Some(host) = host {
                config.api.host = host;
            }
            if let Some(port) = port {
                config.api.port = port;
            }

            if let Err(e) = config.validate() {
                error!("Configuration validation failed: {}", e);
                std::process::exit(1);
            }

            let manager = Arc::new(RegistryManager::new(config)?);
            let api = EntityRegistryApi::new(manager.clone());
            api.serve().await?;

            manager.shutdown().await?;
        }

        Commands::Validate {
            sources,
            format,
            fail_fast,
            no_external_calls,
            strict,
        } => {
            let config = RegistryConfig::load_with_defaults()?;
            let grammar = config.uri_grammar()?;
            let options = BatchOptions {
                fail_fast,
                no_external_calls,
                strict,
            };

            let report =
                batch::validate_batch(&sources, &grammar, &RemoteClient::new(), &options)
                    .await?;
            print_report(&report, format)?;

            if report.failed() {
                std::process::exit(1);
            }
        }

        Commands::Upload {
            sources,
            fail_fast,
            auto_confirm,
            strict,
        } => {
            let config = RegistryConfig::load_with_defaults()?;
            let grammar = config.uri_grammar()?;
            let endpoint = format!("{}/_api/entities", config.base_url);
            let options = BatchOptions {
                fail_fast,
                no_external_calls: false,
                strict,
            };
            let prompter: Box<dyn VersionPrompter> = if auto_confirm {
                Box::new(AutoConfirm)
            } else {
                Box::new(StdinPrompt)
            };

            let report = batch::upload_batch(
                &sources,
                &grammar,
                &RemoteClient::new(),
                &endpoint,
                &options,
                prompter.as_ref(),
            )
            .await?;

            println!(
                "{} uploaded, {} skipped, {} failed",
                report.uploaded,
                report.skipped,
                report.failures.len()
            );
            for failure in &report.failures {
                println!("FAIL {}: {}", failure.source.display(), failure.error);
            }

            if report.failed() {
                std::process::exit(1);
            }
        }

        Commands::Config { command } => match command {
            ConfigCommands::Generate { output } => {
                std::fs::write(&output, RegistryConfig::generate_example())?;
                println!("Configuration file generated: {}", output.display());
            }

            ConfigCommands::Validate {
                config: config_path,
            } => {
                let config = match RegistryConfig::from_file(&config_path) {
                    Ok(config) => config,
                    Err(e) => {
                        error!("Failed to load configuration file: {}", e);
                        std::process::exit(1);
                    }
                };

                match config.validate() {
                    Ok(()) => {
                        println!("Configuration validation passed");
                        println!("  Base URL: {}", config.base_url);
                        println!("  API: {}:{}", config.api.host, config.api.port);
                        println!("  Storage Backend: {:?}", config.storage.backend);
                        println!("  Log Level: {}", config.monitoring.log_level);
                    }
                    Err(e) => {
                        error!("Configuration validation failed: {}", e);
                        std::process::exit(1);
                    }
                }
            }

            ConfigCommands::Show { config } => {
                let config = match config {
                    Some(path) => RegistryConfig::from_file(&path)?,
                    None => RegistryConfig::load_with_defaults()?,
                };

                println!("Current Configuration:");
                println!("  Base URL: {}", config.base_url);
                println!("  API: {}:{}", config.api.host, config.api.port);
                println!("  Storage Backend: {:?}", config.storage.backend);
                println!("  Log Level: {}", config.monitoring.log_level);
            }
        },
    }

    Ok(())
}
