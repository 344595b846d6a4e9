use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub mod json;
pub mod rust;

pub use self::json::JsonEmitter;
pub use self::rust::RustEmitter;

use crate::config::OutputFormat;
use crate::pipeline::ArtifactSet;

pub const GENERATED_HEADER: &str = "// AUTOGENERATED BY tilegen -- DO NOT MODIFY";

#[derive(Clone, Debug, PartialEq)]
pub struct RenderedFile {
    pub name: String,
    pub contents: String,
}

impl RenderedFile {
    pub fn new(name: impl Into<String>, contents: String) -> Self {
        Self {
            name: name.into(),
            contents,
        }
    }
}

pub trait Emitter {
    fn render(&self, artifacts: &ArtifactSet) -> Result<Vec<RenderedFile>>;
}

pub fn init_emitter(format: OutputFormat) -> Box<dyn Emitter> {
    match format {
        OutputFormat::Rust => Box::new(RustEmitter),
        OutputFormat::Json => Box::new(JsonEmitter),
    }
}

/// Replace `output` with a directory holding exactly `files`.
///
/// Files are written into a staging directory next to `output`, which is then
/// renamed into place, so a failure part way leaves the previous output
/// untouched and files from earlier runs never linger.
pub fn write_files(output: &Path, files: &[RenderedFile]) -> Result<()> {
    let parent = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent)
        .with_context(|| format!("Emit: Failed to create directory {:?}", parent))?;

    let staging = tempfile::Builder::new()
        .prefix(".tilegen-")
        .tempdir_in(&parent)
        .with_context(|| format!("Emit: Failed to create staging directory in {:?}", parent))?;
    for file in files {
        let path = staging.path().join(&file.name);
        std::fs::write(&path, &file.contents)
            .with_context(|| format!("Emit: Failed to write {:?}", path))?;
        tracing::debug!("Staged {:?} ({} bytes)", path, file.contents.len());
    }

    // Move the previous output aside so it is restored if the swap fails and
    // removed with `previous` otherwise.
    let previous = tempfile::Builder::new()
        .prefix(".tilegen-old-")
        .tempdir_in(&parent)
        .with_context(|| format!("Emit: Failed to create directory in {:?}", parent))?;
    let replaced = previous.path().join("output");
    let had_output = output.exists();
    if had_output {
        tracing::info!("Replacing {:?}", output);
        std::fs::rename(output, &replaced)
            .with_context(|| format!("Emit: Failed to move aside {:?}", output))?;
    }

    if let Err(err) = std::fs::rename(staging.path(), output) {
        if had_output {
            std::fs::rename(&replaced, output)
                .with_context(|| format!("Emit: Failed to restore {:?}", output))?;
        }
        return Err(err).with_context(|| format!("Emit: Failed to move output into {:?}", output));
    }
    // Already renamed away; keep the guard from deleting the new output.
    let _ = staging.keep();

    for file in files {
        tracing::info!("Wrote {:?} ({} bytes)", output.join(&file.name), file.contents.len());
    }
    Ok(())
}
