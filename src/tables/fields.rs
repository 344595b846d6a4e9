//! Typed row fields derived from imposm3 column definitions.

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

use crate::config::{ColumnConfig, TableConfig};
use crate::error::{SchemaError, SchemaResult};

pub const RELATION_MEMBER: &str = "relation_member";

/// Declared type of an extracted field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldType {
    String,
    Boolean,
    Integer,
    RawElement,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::String => "String",
            FieldType::Boolean => "Boolean",
            FieldType::Integer => "Integer",
            FieldType::RawElement => "RawElement",
        };
        write!(f, "{name}")
    }
}

/// How a field's value is read from the source element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Extraction {
    /// Tag value as a string
    Attribute(String),
    /// Tag value parsed as a boolean
    AttributeAsBool(String),
    /// Tag value parsed as an integer
    AttributeAsInt(String),
    /// z-order computed from the way's tags
    WayZOrder,
    /// Direction (-1, 0, 1) from a `oneway`-style tag
    Direction(String),
    /// The mapping key that matched this element
    MappingKey,
    /// Value of the tag named by the mapping key that matched
    MappingValue,
    /// The source element itself
    SourceElement,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableField {
    pub declared_type: FieldType,
    pub name: String,
    pub extraction: Extraction,
}

impl TableField {
    fn new(declared_type: FieldType, name: impl Into<String>, extraction: Extraction) -> Self {
        TableField {
            declared_type,
            name: name.into(),
            extraction,
        }
    }

    /// The trailing field every row carries.
    pub fn source() -> Self {
        TableField::new(FieldType::RawElement, "source", Extraction::SourceElement)
    }
}

/// Ordered fields of one table's rows, ending with the source element.
///
/// Structural columns (ids, geometries, areas, tag blobs and relation member
/// positions) are skipped since the source element already exposes them.
pub fn extract_fields(table_name: &str, table: &TableConfig) -> SchemaResult<Vec<TableField>> {
    let relation_member = table.table_type == RELATION_MEMBER;
    let mut fields = Vec::with_capacity(table.columns.len() + 1);

    for column in &table.columns {
        if relation_member && column.from_member {
            continue;
        }
        if let Some((declared_type, extraction)) = classify_column(table_name, column)? {
            fields.push(TableField::new(declared_type, &column.name, extraction));
        }
    }

    fields.push(TableField::source());
    Ok(fields)
}

fn classify_column(
    table_name: &str,
    column: &ColumnConfig,
) -> SchemaResult<Option<(FieldType, Extraction)>> {
    let key = || {
        column
            .key
            .clone()
            .ok_or_else(|| SchemaError::MissingColumnKey {
                table: table_name.to_string(),
                column: column.name.clone(),
                kind: column.kind.clone(),
            })
    };

    let field = match column.kind.as_str() {
        "id" | "validated_geometry" | "area" | "hstore_tags" | "geometry" => None,
        "member_id" | "member_role" | "member_type" | "member_index" => None,
        "mapping_key" => Some((FieldType::String, Extraction::MappingKey)),
        "mapping_value" => Some((FieldType::String, Extraction::MappingValue)),
        "string" => Some((FieldType::String, Extraction::Attribute(key()?))),
        "bool" => Some((FieldType::Boolean, Extraction::AttributeAsBool(key()?))),
        "integer" => Some((FieldType::Integer, Extraction::AttributeAsInt(key()?))),
        "wayzorder" => Some((FieldType::Integer, Extraction::WayZOrder)),
        "direction" => Some((FieldType::Integer, Extraction::Direction(key()?))),
        other => {
            return Err(SchemaError::UnsupportedColumnKind {
                table: table_name.to_string(),
                column: column.name.clone(),
                kind: other.to_string(),
            });
        }
    };
    Ok(field)
}

/// Attribute name to declared type across every table of a schema.
///
/// Entries keep the order in which names were first seen.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldTypes {
    types: IndexMap<String, FieldType>,
}

impl FieldTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the fields of `table`, failing if a name was already declared
    /// with another type.
    pub fn register(&mut self, table: &str, fields: &[TableField]) -> SchemaResult<()> {
        for field in fields {
            match self.types.get(&field.name) {
                Some(existing) if *existing != field.declared_type => {
                    return Err(SchemaError::ConflictingFieldType {
                        field: field.name.clone(),
                        existing: *existing,
                        found: field.declared_type,
                        table: table.to_string(),
                    });
                }
                Some(_) => {}
                None => {
                    self.types.insert(field.name.clone(), field.declared_type);
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<FieldType> {
        self.types.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, FieldType)> {
        self.types.iter().map(|(name, ty)| (name.as_str(), *ty))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }
}
