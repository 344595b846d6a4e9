//! Compiles a crawled schema into the artifact set handed to an emitter.

use serde::Serialize;

use crate::config::{Layer, Tileset};
use crate::error::SchemaResult;
use crate::fetch::Schema;
use crate::mapping::{MultiExpressionIndex, allowed_values, field_mapping, value_filters};
use crate::tables::{CompiledTable, FieldTypes, RowConstructor, compile_tables, row_index};

/// Everything an emitter renders. Built completely before anything is
/// written.
#[derive(Debug, Serialize)]
pub struct ArtifactSet {
    /// Where the schema came from (tag, URL or directory)
    pub source: String,
    pub tileset: Tileset,
    pub layers: Vec<LayerArtifact>,
    pub tables: Vec<CompiledTable>,
    pub field_types: FieldTypes,
    pub row_index: MultiExpressionIndex<RowConstructor>,
}

#[derive(Debug, Serialize)]
pub struct LayerArtifact {
    pub id: String,
    pub description: String,
    pub buffer_size: f64,
    pub fields: Vec<LayerField>,
}

#[derive(Debug, Serialize)]
pub struct LayerField {
    pub name: String,
    pub description: String,
    pub allowed_values: Vec<String>,
    /// Present when the schema derives this field's value from tags
    pub mapping: Option<MultiExpressionIndex<String>>,
}

pub fn build_artifacts(schema: &Schema, source: &str) -> SchemaResult<ArtifactSet> {
    let layers = schema
        .layers
        .iter()
        .map(compile_layer)
        .collect::<SchemaResult<Vec<_>>>()?;

    let mut field_types = FieldTypes::new();
    let tables = compile_tables(&schema.tables, &mut field_types)?;
    let row_index = row_index(&tables);

    tracing::info!(
        "Compiled {} layers, {} tables ({} dispatch rules), {} distinct fields",
        layers.len(),
        tables.len(),
        row_index.len(),
        field_types.len()
    );

    Ok(ArtifactSet {
        source: source.to_string(),
        tileset: schema.tileset.clone(),
        layers,
        tables,
        field_types,
        row_index,
    })
}

fn compile_layer(layer: &Layer) -> SchemaResult<LayerArtifact> {
    let mut fields = Vec::with_capacity(layer.fields.len());
    for (name, field) in &layer.fields {
        let context = || format!("field '{name}' of layer '{}'", layer.id);
        let (allowed, mapping) = match field.values() {
            Some(values) => (
                allowed_values(values).map_err(|e| e.in_context(context()))?,
                value_filters(values)
                    .map(field_mapping)
                    .transpose()
                    .map_err(|e| e.in_context(context()))?,
            ),
            None => (Vec::new(), None),
        };
        if let Some(mapping) = &mapping {
            tracing::debug!(
                "Layer {} field {}: {} mapping rules",
                layer.id,
                name,
                mapping.len()
            );
        }
        fields.push(LayerField {
            name: name.clone(),
            description: field.description().to_string(),
            allowed_values: allowed,
            mapping,
        });
    }

    Ok(LayerArtifact {
        id: layer.id.clone(),
        description: layer.description.clone(),
        buffer_size: layer.buffer_size,
        fields,
    })
}
