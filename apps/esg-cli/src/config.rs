//! TOML configuration for the command-line tool
//!
//! Every section and field is optional; an empty file is a valid
//! configuration pointing at the public OpenAI endpoint.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use report_engine::ContactDetails;
use report_pipeline::{GenerateOptions, DEFAULT_API_KEY_ENV, DEFAULT_BASE_URL, DEFAULT_MODEL};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub output: OutputConfig,
    pub resources: ResourcesConfig,
    pub branding: BrandingConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(s).context("Failed to parse TOML configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Use `path` when given, otherwise `esg.toml` if present, otherwise defaults
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..=2.0).contains(&self.service.temperature) {
            anyhow::bail!(
                "service.temperature must be between 0 and 2, got {}",
                self.service.temperature
            );
        }
        if self.service.timeout_secs == 0 {
            anyhow::bail!("service.timeout_secs must be greater than zero");
        }
        Ok(())
    }
}

pub const DEFAULT_CONFIG_FILE: &str = "esg.toml";

/// Text generation service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Per-call limit in seconds (default: 120)
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: report_pipeline::DEFAULT_TEMPERATURE,
            max_tokens: None,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            timeout_secs: 120,
        }
    }
}

impl ServiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn generate_options(&self) -> GenerateOptions {
        GenerateOptions {
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory the rendered reports are written to
    pub directory: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("reports"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourcesConfig {
    /// Directory searched for cover, back cover and logo images
    pub directory: PathBuf,
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("assets"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrandingConfig {
    pub header_title: String,
    pub disclaimer_title: String,
    pub contact: ContactDetails,
}

impl Default for BrandingConfig {
    fn default() -> Self {
        Self {
            header_title: "ESG Starter's Kit".to_string(),
            disclaimer_title: "Disclaimer".to_string(),
            contact: ContactDetails::default(),
        }
    }
}
