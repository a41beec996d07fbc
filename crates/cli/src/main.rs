//! Freshcast CLI
//!
//! Query expiry predictions, demand forecasts, anomaly reports, image
//! freshness and recipe suggestions from a running prediction service.

mod client;
mod commands;
mod config;
mod output;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use commands::{analytics, models, predict};
use engine_lib::{ExpiryRequest, FoodCategory, PackagingType, StorageMethod};
use output::OutputFormat;
use serde::de::DeserializeOwned;
use std::path::PathBuf;

/// Freshcast CLI
#[derive(Parser)]
#[command(name = "fcast")]
#[command(author, version, about = "CLI for the Freshcast prediction service", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via FRESHCAST_API_URL env var)
    #[arg(long, env = "FRESHCAST_API_URL")]
    pub api_url: Option<String>,

    /// Output format (defaults to the config file setting, then table)
    #[arg(long, short)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Predict when an item will expire
    Expiry {
        /// Product name
        #[arg(long)]
        name: String,

        /// Food category (fruits, vegetables, dairy, meat, ...)
        #[arg(long)]
        category: String,

        /// Purchase date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        purchase_date: Option<NaiveDate>,

        /// Storage method (fridge, freezer, pantry, counter, outside)
        #[arg(long, default_value = "fridge", value_parser = parse_wire::<StorageMethod>)]
        storage: StorageMethod,

        /// Packaging (plastic, glass, metal, paper, clamshell, vacuum, none)
        #[arg(long, default_value = "plastic", value_parser = parse_wire::<PackagingType>)]
        packaging: PackagingType,

        /// Household usage rate in servings per week
        #[arg(long, default_value_t = 3.0)]
        usage: f64,

        /// Storage temperature in °C
        #[arg(long)]
        temperature: Option<f64>,

        /// Relative humidity in percent
        #[arg(long)]
        humidity: Option<f64>,
    },

    /// Forecast demand from a JSON request file
    Forecast {
        /// Path to a demand forecast request
        #[arg(long)]
        file: PathBuf,

        /// Override the forecast horizon in days
        #[arg(long)]
        horizon: Option<u32>,
    },

    /// Detect anomalies in a JSON series file
    Anomalies {
        /// Path to an anomaly detection request
        #[arg(long)]
        file: PathBuf,

        /// Override the detection sensitivity (0.1 - 0.99)
        #[arg(long)]
        sensitivity: Option<f64>,
    },

    /// Classify a food photo and assess its freshness
    Classify {
        /// Path to a PNG, JPEG or WebP image
        #[arg(long)]
        image: PathBuf,

        /// Category you expect the item to be
        #[arg(long)]
        expected: Option<String>,
    },

    /// Suggest recipes for items about to expire
    Recipes {
        /// Items that are about to expire
        #[arg(required = true)]
        items: Vec<String>,

        /// Dietary preferences
        #[arg(long = "diet")]
        diet: Vec<String>,
    },

    /// Show inference monitoring metrics
    Metrics,

    /// Model management
    #[command(subcommand)]
    Models(ModelsCommands),

    /// Show or update the CLI configuration file
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the current configuration
    Show,

    /// Update configuration values
    Set {
        /// Default API endpoint URL
        #[arg(long)]
        api_url: Option<String>,

        /// Default output format
        #[arg(long)]
        default_format: Option<OutputFormat>,

        /// Name sent with retraining requests
        #[arg(long)]
        operator: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ModelsCommands {
    /// Show model status
    Status,

    /// Start model retraining
    Retrain {
        /// Who requested the retraining (defaults to the configured operator)
        #[arg(long)]
        initiated_by: Option<String>,
    },
}

/// Parse a value using its lowercase wire name
fn parse_wire<T: DeserializeOwned>(value: &str) -> Result<T, String> {
    serde_json::from_value(serde_json::Value::String(value.to_lowercase()))
        .map_err(|_| format!("unknown value '{}'", value))
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = config::Config::load()?;

    let api_url = config.resolve_api_url(cli.api_url);
    let format = cli
        .format
        .or_else(|| config.default_format.as_deref().and_then(OutputFormat::from_name))
        .unwrap_or_default();

    if cli.verbose {
        output::print_info(&format!("Using API at {}", api_url));
    }

    // Config commands must work even when the stored URL is broken
    let connect = || client::ApiClient::new(&api_url);

    match cli.command {
        Commands::Expiry {
            name,
            category,
            purchase_date,
            storage,
            packaging,
            usage,
            temperature,
            humidity,
        } => {
            let purchase_date = purchase_date.unwrap_or_else(|| Utc::now().date_naive());
            let mut request = ExpiryRequest::new(name, category, purchase_date, storage, packaging, usage);
            request.temperature_c = temperature;
            request.humidity_percent = humidity;
            predict::predict_expiry(&connect()?, &request, format).await?;
        }
        Commands::Forecast { file, horizon } => {
            analytics::forecast_demand(&connect()?, &file, horizon, format).await?;
        }
        Commands::Anomalies { file, sensitivity } => {
            analytics::detect_anomalies(&connect()?, &file, sensitivity, format).await?;
        }
        Commands::Classify { image, expected } => {
            let expected = expected.as_deref().map(FoodCategory::from_label);
            predict::classify_image(&connect()?, &image, expected, format).await?;
        }
        Commands::Recipes { items, diet } => {
            predict::suggest_recipes(&connect()?, items, diet, format).await?;
        }
        Commands::Metrics => {
            models::show_metrics(&connect()?, format).await?;
        }
        Commands::Models(models_cmd) => match models_cmd {
            ModelsCommands::Status => {
                models::show_status(&connect()?, format).await?;
            }
            ModelsCommands::Retrain { initiated_by } => {
                let initiated_by = initiated_by
                    .or_else(|| config.operator.clone())
                    .unwrap_or_else(|| "cli-user".to_string());
                models::retrain(&connect()?, initiated_by, format).await?;
            }
        },
        Commands::Config(config_cmd) => update_config(config, config_cmd)?,
    }

    Ok(())
}

fn update_config(mut config: config::Config, command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => output::print_json(&config),
        ConfigCommands::Set {
            api_url,
            default_format,
            operator,
        } => {
            if let Some(url) = api_url {
                url::Url::parse(&url).context("Invalid API URL")?;
                config.api_url = Some(url);
            }
            if let Some(format) = default_format {
                config.default_format = Some(format.name().to_string());
            }
            if operator.is_some() {
                config.operator = operator;
            }
            let path = config.save()?;
            output::print_success(&format!("Saved configuration to {}", path.display()));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_expiry_command() {
        let cli = Cli::try_parse_from([
            "fcast",
            "expiry",
            "--name",
            "Greek yogurt",
            "--category",
            "dairy",
            "--storage",
            "Freezer",
            "--packaging",
            "none",
            "--purchase-date",
            "2024-06-01",
        ])
        .unwrap();

        match cli.command {
            Commands::Expiry {
                storage,
                packaging,
                purchase_date,
                usage,
                ..
            } => {
                assert_eq!(storage, StorageMethod::Freezer);
                assert_eq!(packaging, PackagingType::Unpackaged);
                assert_eq!(purchase_date, NaiveDate::from_ymd_opt(2024, 6, 1));
                assert_eq!(usage, 3.0);
            }
            _ => panic!("expected expiry command"),
        }
    }

    #[test]
    fn test_unknown_storage_is_rejected() {
        let result = Cli::try_parse_from([
            "fcast", "expiry", "--name", "milk", "--category", "dairy", "--storage", "cellar",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_recipes_require_items() {
        assert!(Cli::try_parse_from(["fcast", "recipes"]).is_err());

        let cli = Cli::try_parse_from(["fcast", "recipes", "banana", "tomato", "--diet", "vegan"]).unwrap();
        match cli.command {
            Commands::Recipes { items, diet } => {
                assert_eq!(items, vec!["banana", "tomato"]);
                assert_eq!(diet, vec!["vegan"]);
            }
            _ => panic!("expected recipes command"),
        }
    }

    #[test]
    fn test_format_flag() {
        let cli = Cli::try_parse_from(["fcast", "--format", "json", "models", "status"]).unwrap();
        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert!(matches!(cli.command, Commands::Models(ModelsCommands::Status)));
    }

    #[test]
    fn test_config_set() {
        let cli = Cli::try_parse_from([
            "fcast",
            "config",
            "set",
            "--api-url",
            "http://pantry.local:8000",
            "--default-format",
            "json",
        ])
        .unwrap();
        match cli.command {
            Commands::Config(ConfigCommands::Set {
                api_url,
                default_format,
                operator,
            }) => {
                assert_eq!(api_url.as_deref(), Some("http://pantry.local:8000"));
                assert_eq!(default_format, Some(OutputFormat::Json));
                assert!(operator.is_none());
            }
            _ => panic!("expected config set command"),
        }
    }

    #[test]
    fn test_parse_wire_names() {
        assert_eq!(parse_wire::<StorageMethod>("PANTRY"), Ok(StorageMethod::Pantry));
        assert!(parse_wire::<PackagingType>("foil").is_err());
    }
}
