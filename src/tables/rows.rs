//! Table match expressions and the row dispatch index.

use indexmap::IndexMap;
use serde::Serialize;

use super::fields::{FieldTypes, RELATION_MEMBER, TableField, extract_fields};
use crate::config::TableConfig;
use crate::dsl::{Expression, compile_table, compile_type_mappings};
use crate::error::SchemaResult;
use crate::mapping::{MultiExpressionIndex, Rule};
use crate::utils::upper_camel;

/// Identifies the row type an element is parsed into when a table matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowConstructor {
    pub table: String,
    pub row_type: String,
}

/// One table after compilation.
#[derive(Debug, Clone, Serialize)]
pub struct CompiledTable {
    /// Key in the mapping file, e.g. `water_polygon`
    pub key: String,
    /// Name of the table imposm3 would create, e.g. `osm_water_polygon`
    pub table_name: String,
    pub row_type: String,
    pub table_type: String,
    pub expression: Expression,
    pub fields: Vec<TableField>,
}

impl CompiledTable {
    pub fn is_relation_member(&self) -> bool {
        self.table_type == RELATION_MEMBER
    }

    pub fn row_constructor(&self) -> RowConstructor {
        RowConstructor {
            table: self.table_name.clone(),
            row_type: self.row_type.clone(),
        }
    }
}

/// Expression selecting the elements that belong in a table.
pub fn table_expression(table: &TableConfig) -> SchemaResult<Expression> {
    match &table.type_mappings {
        Some(type_mappings) => compile_type_mappings(
            type_mappings.iter().map(|(ty, node)| (ty.as_str(), node)),
            table.filters(),
        ),
        None => compile_table(&table.table_type, table.mapping.as_ref(), table.filters()),
    }
}

/// Compile every table, registering its fields in `field_types`.
pub fn compile_tables(
    tables: &IndexMap<String, TableConfig>,
    field_types: &mut FieldTypes,
) -> SchemaResult<Vec<CompiledTable>> {
    let mut compiled = Vec::with_capacity(tables.len());
    for (key, table) in tables {
        let fields = extract_fields(key, table)?;
        field_types.register(key, &fields)?;

        let expression =
            table_expression(table).map_err(|e| e.in_context(format!("table '{key}'")))?;
        tracing::debug!("Table {}: {}", key, expression);

        let table_name = format!("osm_{key}");
        compiled.push(CompiledTable {
            key: key.clone(),
            row_type: upper_camel(&table_name),
            table_name,
            table_type: table.table_type.clone(),
            expression,
            fields,
        });
    }
    Ok(compiled)
}

/// Dispatch index from table expression to row constructor.
///
/// Relation member tables are left out: consumers read relation members
/// themselves.
pub fn row_index(tables: &[CompiledTable]) -> MultiExpressionIndex<RowConstructor> {
    MultiExpressionIndex::build(
        tables
            .iter()
            .filter(|table| !table.is_relation_member())
            .map(|table| Rule::new(table.row_constructor(), table.expression.clone())),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::{Element, and, match_any, match_type};
    use crate::tables::{Extraction, FieldType};

    fn tables(yaml: &str) -> IndexMap<String, TableConfig> {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn end_to_end_point_table() {
        let t = tables(
            r#"
amenity_point:
  type: point
  mapping:
    amenity: [restaurant, cafe]
  columns:
    - {type: mapping_key, name: amenity_key}
    - {type: string, name: name, key: name}
"#,
        );
        let mut types = FieldTypes::new();
        let compiled = compile_tables(&t, &mut types).unwrap();
        assert_eq!(compiled.len(), 1);

        let table = &compiled[0];
        assert_eq!(table.table_name, "osm_amenity_point");
        assert_eq!(table.row_type, "OsmAmenityPoint");
        assert_eq!(
            table.expression,
            and([
                match_any("amenity", ["restaurant", "cafe"]),
                match_type("point"),
            ])
        );
        let fields: Vec<(FieldType, &str, &Extraction)> = table
            .fields
            .iter()
            .map(|f| (f.declared_type, f.name.as_str(), &f.extraction))
            .collect();
        assert_eq!(
            fields,
            vec![
                (FieldType::String, "amenity_key", &Extraction::MappingKey),
                (
                    FieldType::String,
                    "name",
                    &Extraction::Attribute("name".into())
                ),
                (FieldType::RawElement, "source", &Extraction::SourceElement),
            ]
        );
        assert_eq!(types.len(), 3);
    }

    #[test]
    fn type_mappings_table() {
        let t = tables(
            r#"
place:
  type: geometry
  type_mappings:
    points: {place: [city, town]}
    polygons: {place: [island]}
  filters:
    reject: {name: [__any__]}
  columns: []
"#,
        );
        let compiled = compile_tables(&t, &mut FieldTypes::new()).unwrap();
        let expr = &compiled[0].expression;
        let city = Element::new(["point"]).with_tag("place", "city");
        let named = city.clone().with_tag("name", "Springfield");
        let island = Element::new(["polygon"]).with_tag("place", "island");
        let wrong_type = Element::new(["polygon"]).with_tag("place", "city");
        assert!(crate::dsl::evaluate(expr, &city));
        assert!(!crate::dsl::evaluate(expr, &named));
        assert!(crate::dsl::evaluate(expr, &island));
        assert!(!crate::dsl::evaluate(expr, &wrong_type));
    }

    #[test]
    fn row_index_skips_relation_members_and_keeps_order() {
        let t = tables(
            r#"
water_polygon:
  type: polygon
  mapping: {natural: [water]}
  columns: []
route_member:
  type: relation_member
  mapping: {route: [bus]}
  columns: []
waterway_linestring:
  type: linestring
  mapping: {waterway: [river]}
  columns: []
"#,
        );
        let compiled = compile_tables(&t, &mut FieldTypes::new()).unwrap();
        let index = row_index(&compiled);
        let rows: Vec<&str> = index
            .rules()
            .iter()
            .map(|r| r.result.row_type.as_str())
            .collect();
        assert_eq!(rows, ["OsmWaterPolygon", "OsmWaterwayLinestring"]);
    }

    #[test]
    fn malformed_mapping_names_the_table() {
        let t = tables(
            r#"
broken:
  type: point
  mapping: {__AND__: [], amenity: []}
  columns: []
"#,
        );
        let err = compile_tables(&t, &mut FieldTypes::new()).unwrap_err();
        assert!(err.to_string().contains("table 'broken'"), "{err}");
    }
}
