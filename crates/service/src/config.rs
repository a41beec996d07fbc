//! Service configuration
//!
//! Read from an optional `freshcast.toml` in the working directory, then from
//! `FRESHCAST_*` environment variables, which take precedence.

use anyhow::{Context, Result};
use engine_lib::monitor::{DEFAULT_INFERENCE_CAPACITY, DEFAULT_RETRAINING_CAPACITY};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Name attached to every structured log event
    #[serde(default = "default_instance_name")]
    pub instance_name: String,

    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Inference events kept by the monitor
    #[serde(default = "default_inference_buffer")]
    pub inference_buffer: usize,

    /// Retraining events kept by the monitor
    #[serde(default = "default_retraining_buffer")]
    pub retraining_buffer: usize,

    /// Directory served to `file_path` image requests; disabled when unset
    #[serde(default)]
    pub image_dir: Option<String>,
}

fn default_instance_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "freshcast".to_string())
}

fn default_api_port() -> u16 {
    8000
}

fn default_inference_buffer() -> usize {
    DEFAULT_INFERENCE_CAPACITY
}

fn default_retraining_buffer() -> usize {
    DEFAULT_RETRAINING_CAPACITY
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            instance_name: default_instance_name(),
            api_port: default_api_port(),
            inference_buffer: default_inference_buffer(),
            retraining_buffer: default_retraining_buffer(),
            image_dir: None,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from the optional config file and the environment
    pub fn load() -> Result<Self> {
        Self::load_from("freshcast")
    }

    /// Load with an explicit config file stem (extension is detected)
    pub fn load_from(file_stem: &str) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(file_stem).required(false))
            .add_source(config::Environment::with_prefix("FRESHCAST").try_parsing(true))
            .build()
            .context("failed to read configuration")?;

        config
            .try_deserialize()
            .context("invalid service configuration")
    }
}
