use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use crate::config::{GeneratorConfig, OutputFormat, ROOT_DOCUMENT};
use crate::emit::{init_emitter, write_files};
use crate::fetch::{DirFetcher, Fetcher, HttpFetcher, crawl};
use crate::pipeline::build_artifacts;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Generator configuration file (YAML)
    #[arg(short, long, env = "TILEGEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// OpenMapTiles release tag to read the schema from (default: v3.12.2)
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Base URL the schema documents are fetched from
    #[arg(long, conflicts_with = "schema_dir")]
    pub base_url: Option<String>,

    /// Read the schema from a local checkout instead of fetching it
    #[arg(long)]
    pub schema_dir: Option<PathBuf>,

    /// Output directory (default: generated)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format (default: rust)
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Resolve the run configuration: defaults, then the config file and
/// environment, then explicit flags.
pub fn resolve_config(cli: &Cli) -> Result<GeneratorConfig> {
    let mut config = GeneratorConfig::load(cli.config.as_deref())
        .context("CLI: Failed to load configuration")?;

    if let Some(tag) = &cli.tag {
        config.tag = tag.clone();
    }
    if let Some(base_url) = &cli.base_url {
        config.base_url = Some(base_url.clone());
        config.schema_dir = None;
    }
    if let Some(schema_dir) = &cli.schema_dir {
        config.schema_dir = Some(schema_dir.clone());
    }
    if let Some(output) = &cli.output {
        config.output = output.clone();
    }
    if let Some(format) = cli.format {
        config.format = format;
    }
    Ok(config)
}

/// Fetcher for the configured schema location and a label naming it.
pub fn init_fetcher(config: &GeneratorConfig) -> Result<(Box<dyn Fetcher>, String)> {
    match &config.schema_dir {
        Some(dir) => Ok((
            Box::new(DirFetcher::new(dir)),
            dir.display().to_string(),
        )),
        None => {
            let base = config.base_url();
            let fetcher = HttpFetcher::new(base.clone()).context("CLI: Failed to build HTTP client")?;
            Ok((Box::new(fetcher), base))
        }
    }
}

/// Crawl, compile and render everything in memory, then write the output.
/// Nothing is written if any step fails.
pub fn generate(config: &GeneratorConfig) -> Result<usize> {
    let (fetcher, source) = init_fetcher(config)?;
    tracing::info!("Reading schema from {}", source);

    let schema = crawl(fetcher.as_ref(), ROOT_DOCUMENT)
        .with_context(|| format!("Crawl: Failed to read schema from {}", source))?;

    let artifacts = build_artifacts(&schema, &source).context("Compile: Invalid schema")?;

    let files = init_emitter(config.format)
        .render(&artifacts)
        .context("Emit: Failed to render output")?;

    write_files(&config.output, &files)?;
    Ok(files.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        std::io::Write::write_all(&mut file, b"tag: v3.14\nformat: json\noutput: from-file\n")
            .unwrap();

        let cli = Cli::parse_from([
            "tilegen",
            "--config",
            file.path().to_str().unwrap(),
            "--output",
            "from-flag",
        ]);
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.tag, "v3.14");
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.output, PathBuf::from("from-flag"));
    }

    #[test]
    fn base_url_and_schema_dir_conflict() {
        let result = Cli::try_parse_from([
            "tilegen",
            "--base-url",
            "http://localhost/",
            "--schema-dir",
            "schema",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn schema_dir_selects_local_fetcher() {
        let config = GeneratorConfig {
            schema_dir: Some(PathBuf::from("checkout")),
            ..Default::default()
        };
        let (_, source) = init_fetcher(&config).unwrap();
        assert_eq!(source, "checkout");
    }
}
