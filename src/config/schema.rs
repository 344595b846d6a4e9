//! Object model of the OpenMapTiles schema documents.
//!
//! Maps are insertion-ordered so layers, fields and tables come out in the
//! order the schema declares them. Unknown keys are ignored.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::dsl::{FilterNode, TableFilters};

/// Root document (`openmaptiles.yaml`).
#[derive(Debug, Deserialize)]
pub struct TilesetDocument {
    pub tileset: Tileset,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Tileset {
    /// Layer documents, relative to the schema base
    #[serde(default)]
    pub layers: Vec<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub attribution: String,
    #[serde(default)]
    pub languages: Vec<String>,
}

/// A layer document (`layers/<id>/<id>.yaml`).
#[derive(Debug, Deserialize)]
pub struct LayerDocument {
    pub layer: Layer,
    #[serde(default)]
    pub datasources: Vec<Datasource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Layer {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub buffer_size: f64,
    #[serde(default)]
    pub fields: IndexMap<String, FieldSpec>,
}

/// A layer attribute: either just a description, or a description with the
/// values it can take.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FieldSpec {
    Description(String),
    Detailed {
        #[serde(default)]
        description: String,
        #[serde(default)]
        values: Option<FilterNode>,
    },
}

impl FieldSpec {
    pub fn description(&self) -> &str {
        match self {
            FieldSpec::Description(description) => description,
            FieldSpec::Detailed { description, .. } => description,
        }
    }

    pub fn values(&self) -> Option<&FilterNode> {
        match self {
            FieldSpec::Description(_) => None,
            FieldSpec::Detailed { values, .. } => values.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Datasource {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub mapping_file: Option<String>,
}

pub const IMPOSM3: &str = "imposm3";

/// An imposm3 mapping document (`layers/<id>/mapping.yaml`).
#[derive(Debug, Default, Deserialize)]
pub struct MappingDocument {
    #[serde(default)]
    pub tables: IndexMap<String, TableConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableConfig {
    #[serde(rename = "type")]
    pub table_type: String,
    #[serde(default)]
    pub columns: Vec<ColumnConfig>,
    #[serde(default)]
    pub mapping: Option<FilterNode>,
    #[serde(default)]
    pub type_mappings: Option<IndexMap<String, FilterNode>>,
    #[serde(default)]
    pub filters: Option<FiltersConfig>,
}

impl TableConfig {
    pub fn filters(&self) -> TableFilters<'_> {
        match &self.filters {
            Some(filters) => TableFilters {
                require: filters.require.as_ref(),
                reject: filters.reject.as_ref(),
            },
            None => TableFilters::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FiltersConfig {
    #[serde(default)]
    pub require: Option<FilterNode>,
    #[serde(default)]
    pub reject: Option<FilterNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnConfig {
    /// Column kind (`string`, `mapping_key`, ...)
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub from_member: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_layer_document() {
        let doc: LayerDocument = serde_yaml::from_str(
            r#"
layer:
  id: water
  description: |
    Water polygons.
  buffer_size: 4
  fields:
    id: The OSM id
    class:
      description: Class of the water body.
      values:
        lake: {water: [lake]}
        river: {waterway: [river]}
    intermittent:
      description: Whether the water is intermittent.
      values: [0, 1]
  datasource:
    query: ignored
datasources:
  - type: imposm3
    mapping_file: ./mapping.yaml
  - type: sql
    file: water.sql
"#,
        )
        .unwrap();

        assert_eq!(doc.layer.id, "water");
        assert_eq!(doc.layer.buffer_size, 4.0);
        let names: Vec<&str> = doc.layer.fields.keys().map(String::as_str).collect();
        assert_eq!(names, ["id", "class", "intermittent"]);
        assert_eq!(doc.layer.fields["id"].description(), "The OSM id");
        assert!(doc.layer.fields["id"].values().is_none());
        assert!(matches!(
            doc.layer.fields["class"].values(),
            Some(FilterNode::Mapping(_))
        ));
        assert_eq!(doc.datasources.len(), 2);
        assert_eq!(doc.datasources[1].kind, "sql");
        assert!(doc.datasources[1].mapping_file.is_none());
    }

    #[test]
    fn parses_table_with_filters() {
        let doc: MappingDocument = serde_yaml::from_str(
            r#"
generalized_tables: {}
tables:
  landcover_polygon:
    type: polygon
    columns:
      - {name: osm_id, type: id}
      - {name: subclass, type: mapping_value}
    filters:
      reject:
        area: ["no"]
    mapping:
      landuse: [allotments, farm]
"#,
        )
        .unwrap();
        let table = &doc.tables["landcover_polygon"];
        assert_eq!(table.table_type, "polygon");
        assert_eq!(table.columns.len(), 2);
        assert!(table.filters().reject.is_some());
        assert!(table.filters().require.is_none());
        assert!(table.type_mappings.is_none());
    }
}
