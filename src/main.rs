mod app;
mod config;
mod dsl;
mod emit;
mod error;
mod fetch;
mod mapping;
mod pipeline;
mod tables;
mod utils;

use anyhow::Result;
use clap::Parser;

use app::{Cli, generate, resolve_config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = resolve_config(&cli)?;

    let start = std::time::Instant::now();
    let written = generate(&config)?;

    tracing::info!(
        "Done! Wrote {} files to {:?} in {:.2}s",
        written,
        config.output,
        start.elapsed().as_secs_f64()
    );

    Ok(())
}
