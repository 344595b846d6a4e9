mod schema;

pub use schema::*;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_TAG: &str = "v3.12.2";
pub const DEFAULT_OUTPUT: &str = "generated";
pub const ROOT_DOCUMENT: &str = "openmaptiles.yaml";

const GITHUB_RAW_BASE: &str = "https://raw.githubusercontent.com/openmaptiles/openmaptiles";

/// Settings for one generator run, layered from defaults, an optional YAML
/// file and `TILEGEN_*` environment variables.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GeneratorConfig {
    pub tag: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub schema_dir: Option<PathBuf>,
    pub output: PathBuf,
    pub format: OutputFormat,
}

impl GeneratorConfig {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut builder = ::config::Config::builder()
            .set_default("tag", DEFAULT_TAG)?
            .set_default("output", DEFAULT_OUTPUT)?
            .set_default("format", "rust")?;
        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path));
        }
        let settings = builder
            .add_source(::config::Environment::with_prefix("TILEGEN"))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Base that schema references are resolved against when fetching over
    /// HTTP, always ending in `/`.
    pub fn base_url(&self) -> String {
        let base = match &self.base_url {
            Some(url) => url.clone(),
            None => format!("{}/{}/", GITHUB_RAW_BASE, self.tag),
        };
        if base.ends_with('/') {
            base
        } else {
            format!("{base}/")
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            tag: DEFAULT_TAG.to_string(),
            base_url: None,
            schema_dir: None,
            output: PathBuf::from(DEFAULT_OUTPUT),
            format: OutputFormat::Rust,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Rust modules (`schema.rs`, `tables.rs`)
    Rust,
    /// A single `schema.json` manifest
    Json,
}
