//! Walks the schema from the root tileset to every imposm3 mapping file.

use indexmap::{IndexMap, IndexSet};

use super::{FetchError, Fetcher, load};
use crate::config::{
    IMPOSM3, Layer, LayerDocument, MappingDocument, TableConfig, Tileset, TilesetDocument,
};

/// Everything the generator reads from a schema.
#[derive(Debug)]
pub struct Schema {
    pub tileset: Tileset,
    pub layers: Vec<Layer>,
    pub tables: IndexMap<String, TableConfig>,
}

/// Read the root document, then each layer it lists, then each imposm3
/// mapping file those layers reference.
///
/// Mapping files shared by several layers are read once. A table defined in
/// more than one mapping file keeps its first position and its last
/// definition.
pub fn crawl(fetcher: &dyn Fetcher, root: &str) -> Result<Schema, FetchError> {
    let root_doc: TilesetDocument = load(fetcher, root)?;
    let tileset = root_doc.tileset;

    let mut layers = Vec::with_capacity(tileset.layers.len());
    let mut mapping_files = IndexSet::new();
    for layer_file in &tileset.layers {
        let doc: LayerDocument = load(fetcher, layer_file)?;
        for datasource in &doc.datasources {
            match (datasource.kind.as_str(), &datasource.mapping_file) {
                (IMPOSM3, Some(mapping_file)) => {
                    mapping_files.insert(resolve_sibling(layer_file, mapping_file));
                }
                (IMPOSM3, None) => {
                    tracing::warn!("imposm3 datasource without mapping_file in {}", layer_file);
                }
                (other, _) => {
                    tracing::warn!("Unknown datasource type: {} in {}", other, layer_file);
                }
            }
        }
        layers.push(doc.layer);
    }

    let mut tables = IndexMap::new();
    for mapping_file in &mapping_files {
        let doc: MappingDocument = load(fetcher, mapping_file)?;
        tables.extend(doc.tables);
    }

    tracing::info!(
        "Schema {} {}: {} layers, {} mapping files, {} tables",
        tileset.name,
        tileset.version,
        layers.len(),
        mapping_files.len(),
        tables.len()
    );

    Ok(Schema {
        tileset,
        layers,
        tables,
    })
}

/// Resolve `relative` against the directory containing `reference`,
/// normalizing `.` and `..` segments.
///
/// `resolve_sibling("layers/water/water.yaml", "./mapping.yaml")` is
/// `layers/water/mapping.yaml`.
pub fn resolve_sibling(reference: &str, relative: &str) -> String {
    let mut segments: Vec<&str> = reference.split('/').collect();
    segments.pop();

    for segment in relative.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if matches!(segments.last(), None | Some(&"..")) {
                    segments.push("..");
                } else {
                    segments.pop();
                }
            }
            other => segments.push(other),
        }
    }
    segments.retain(|s| !s.is_empty() && *s != ".");
    segments.join("/")
}
