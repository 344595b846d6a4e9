use super::{Emitter, RenderedFile};
use crate::pipeline::ArtifactSet;
use anyhow::Result;

/// Writes the whole artifact set as `schema.json`.
pub struct JsonEmitter;

impl Emitter for JsonEmitter {
    fn render(&self, artifacts: &ArtifactSet) -> Result<Vec<RenderedFile>> {
        let mut contents = serde_json::to_string_pretty(artifacts)?;
        contents.push('\n');
        Ok(vec![RenderedFile::new("schema.json", contents)])
    }
}
