//! Renders the artifact set as Rust modules.
//!
//! `schema.rs` holds tileset metadata and one module per layer with its
//! attribute names, allowed values and value mappings. `tables.rs` holds one
//! row type per imposm3 table with a handler trait layers implement to receive
//! it, an accessor trait per distinct field, the index from table expression
//! to row constructor, and the map dispatching rows to subscribed layers.
//!
//! The generated code expects the consuming crate to provide
//! `crate::expression` (expression constructors and `MultiExpression`),
//! `crate::reader::SourceFeature` and `crate::reader::FeatureCollector`.

use anyhow::{Result, bail};
use std::collections::HashMap;
use std::fmt::Write;

use super::{Emitter, GENERATED_HEADER, RenderedFile};
use crate::pipeline::{ArtifactSet, LayerArtifact, LayerField};
use crate::tables::{CompiledTable, Extraction, FieldType};
use crate::utils::{constant_case, doc_line, snake_ident, upper_camel};

/// Notice carried by every file derived from the OpenMapTiles schema.
pub const SCHEMA_LICENSE: &str = "/*
Copyright (c) 2016, KlokanTech.com & OpenMapTiles contributors.
All rights reserved.

Code license: BSD 3-Clause License

Redistribution and use in source and binary forms, with or without
modification, are permitted provided that the following conditions are met:

* Redistributions of source code must retain the above copyright notice, this
  list of conditions and the following disclaimer.

* Redistributions in binary form must reproduce the above copyright notice,
  this list of conditions and the following disclaimer in the documentation
  and/or other materials provided with the distribution.

* Neither the name of the copyright holder nor the names of its
  contributors may be used to endorse or promote products derived from
  this software without specific prior written permission.

THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS \"AS IS\"
AND ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT LIMITED TO, THE
IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE
FOR ANY DIRECT, INDIRECT, INCIDENTAL, SPECIAL, EXEMPLARY, OR CONSEQUENTIAL
DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER
CAUSED AND ON ANY THEORY OF LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY,
OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE
OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

Design license: CC-BY 4.0

See https://github.com/openmaptiles/openmaptiles/blob/master/LICENSE.md for details on usage
*/";

const ALLOWED_LINTS: &str = "#![allow(dead_code, unused_imports, unused_mut, unused_variables)]";

const EXPRESSION_IMPORTS: &str =
    "use crate::expression::{Expression, MultiExpression, and, match_any, match_field, match_type, not, or};";

pub struct RustEmitter;

impl Emitter for RustEmitter {
    fn render(&self, artifacts: &ArtifactSet) -> Result<Vec<RenderedFile>> {
        Ok(vec![
            RenderedFile::new("schema.rs", render_schema(artifacts)?),
            RenderedFile::new("tables.rs", render_tables(artifacts)?),
        ])
    }
}

/// Generated identifiers of one namespace, with the schema name that claimed
/// each.
#[derive(Default)]
struct Scope {
    claimed: HashMap<String, String>,
}

impl Scope {
    /// Claim `ident` for `name`. Returns the name already holding it on a
    /// collision.
    fn claim(&mut self, ident: &str, name: &str) -> Option<String> {
        if let Some(holder) = self.claimed.get(ident) {
            return Some(holder.clone());
        }
        self.claimed.insert(ident.to_string(), name.to_string());
        None
    }
}

fn write_preamble(out: &mut String) -> Result<()> {
    writeln!(out, "{SCHEMA_LICENSE}")?;
    writeln!(out, "{GENERATED_HEADER}")?;
    Ok(())
}

fn render_schema(artifacts: &ArtifactSet) -> Result<String> {
    let info = &artifacts.tileset;
    let mut out = String::new();

    write_preamble(&mut out)?;
    writeln!(
        out,
        "//! Vector tile layer definitions, attributes and allowed values generated"
    )?;
    writeln!(out, "//! from the OpenMapTiles schema {}.", doc_line(&artifacts.source))?;
    writeln!(out)?;
    writeln!(out, "{ALLOWED_LINTS}")?;
    writeln!(out)?;
    writeln!(out, "{EXPRESSION_IMPORTS}")?;
    writeln!(out)?;
    writeln!(out, "pub const NAME: &str = {:?};", info.name)?;
    writeln!(out, "pub const DESCRIPTION: &str = {:?};", info.description)?;
    writeln!(out, "pub const VERSION: &str = {:?};", info.version)?;
    writeln!(out, "pub const ATTRIBUTION: &str = {:?};", info.attribution)?;
    writeln!(out, "pub const LANGUAGES: &[&str] = &{:?};", info.languages)?;
    let layer_ids: Vec<&str> = artifacts.layers.iter().map(|l| l.id.as_str()).collect();
    writeln!(out, "pub const LAYERS: &[&str] = &{:?};", layer_ids)?;

    let mut modules = Scope::default();
    for layer in &artifacts.layers {
        if let Some(holder) = modules.claim(&snake_ident(&layer.id), &layer.id) {
            bail!(
                "Layers '{}' and '{}' both map to module {}",
                holder,
                layer.id,
                snake_ident(&layer.id)
            );
        }
        writeln!(out)?;
        render_layer(&mut out, layer)?;
    }
    Ok(out)
}

fn render_layer(out: &mut String, layer: &LayerArtifact) -> Result<()> {
    if !layer.description.trim().is_empty() {
        writeln!(out, "/// {}", doc_line(&layer.description))?;
    }
    writeln!(out, "pub mod {} {{", snake_ident(&layer.id))?;
    writeln!(out, "    use super::*;")?;
    writeln!(out)?;
    writeln!(out, "    pub const LAYER_NAME: &str = {:?};", layer.id)?;
    writeln!(out, "    pub const BUFFER_SIZE: f64 = {:?};", layer.buffer_size)?;
    writeln!(out)?;

    writeln!(out, "    /// Attribute names for map elements in the {} layer.", layer.id)?;
    writeln!(out, "    pub mod fields {{")?;
    let mut names = Scope::default();
    for field in &layer.fields {
        let ident = constant_case(&field.name);
        if let Some(holder) = names.claim(&ident, &field.name) {
            skip_collision(layer, &field.name, &holder, &ident);
            continue;
        }
        write_field_doc(out, field)?;
        writeln!(out, "        pub const {ident}: &str = {:?};", field.name)?;
    }
    writeln!(out, "    }}")?;
    writeln!(out)?;

    writeln!(out, "    /// Attribute values for map elements in the {} layer.", layer.id)?;
    writeln!(out, "    pub mod field_values {{")?;
    let mut values = Scope::default();
    for field in layer.fields.iter().filter(|f| !f.allowed_values.is_empty()) {
        let prefix = constant_case(&field.name);
        for value in &field.allowed_values {
            let ident = format!("{}_{}", prefix, constant_case(value));
            let name = format!("{}={}", field.name, value);
            if let Some(holder) = values.claim(&ident, &name) {
                skip_collision(layer, &name, &holder, &ident);
                continue;
            }
            writeln!(out, "        pub const {ident}: &str = {value:?};")?;
        }
        let ident = format!("{prefix}_VALUES");
        if let Some(holder) = values.claim(&ident, &field.name) {
            skip_collision(layer, &field.name, &holder, &ident);
            continue;
        }
        writeln!(
            out,
            "        pub const {ident}: &[&str] = &{:?};",
            field.allowed_values
        )?;
    }
    writeln!(out, "    }}")?;
    writeln!(out)?;

    writeln!(
        out,
        "    /// Mappings from OSM element tags to attribute values in the {} layer.",
        layer.id
    )?;
    writeln!(out, "    pub mod field_mappings {{")?;
    writeln!(out, "        use super::*;")?;
    let mut functions = Scope::default();
    for field in &layer.fields {
        let Some(mapping) = &field.mapping else {
            continue;
        };
        let ident = snake_ident(&field.name);
        if let Some(holder) = functions.claim(&ident, &field.name) {
            skip_collision(layer, &field.name, &holder, &ident);
            continue;
        }
        writeln!(out)?;
        writeln!(out, "        pub fn {ident}() -> MultiExpression<&'static str> {{")?;
        writeln!(out, "            MultiExpression::of(vec![")?;
        for rule in mapping.rules() {
            writeln!(out, "                ({:?}, {}),", rule.result, rule.expression)?;
        }
        writeln!(out, "            ])")?;
        writeln!(out, "        }}")?;
    }
    writeln!(out, "    }}")?;
    writeln!(out, "}}")?;
    Ok(())
}

fn skip_collision(layer: &LayerArtifact, name: &str, holder: &str, ident: &str) {
    tracing::warn!(
        "Layer {}: {} collides with {} as {}, skipping it",
        layer.id,
        name,
        holder,
        ident
    );
}

fn write_field_doc(out: &mut String, field: &LayerField) -> Result<()> {
    let description = doc_line(&field.description);
    if !description.is_empty() {
        writeln!(out, "        /// {description}")?;
    }
    if !field.allowed_values.is_empty() {
        if !description.is_empty() {
            writeln!(out, "        ///")?;
        }
        writeln!(out, "        /// Allowed values:")?;
        for value in &field.allowed_values {
            writeln!(out, "        /// - `{value}`")?;
        }
    }
    Ok(())
}

fn render_tables(artifacts: &ArtifactSet) -> Result<String> {
    let mut out = String::new();

    write_preamble(&mut out)?;
    writeln!(
        out,
        "//! OSM element parsers generated from the imposm3 table definitions in the"
    )?;
    writeln!(out, "//! OpenMapTiles schema {}.", doc_line(&artifacts.source))?;
    writeln!(out, "//!")?;
    writeln!(
        out,
        "//! Each row type holds the typed columns imposm3 would store for an element."
    )?;
    writeln!(
        out,
        "//! Every table whose mapping matches an element produces a row; there is no"
    )?;
    writeln!(out, "//! priority between tables. Layers subscribe to the rows they render")?;
    writeln!(out, "//! through [`TableSubscriber`] and [`dispatch_map`].")?;
    writeln!(out)?;
    writeln!(out, "{ALLOWED_LINTS}")?;
    writeln!(out)?;
    writeln!(out, "use std::any::Any;")?;
    writeln!(out, "use std::collections::HashMap;")?;
    writeln!(out)?;
    writeln!(out, "{EXPRESSION_IMPORTS}")?;
    writeln!(out, "use crate::reader::{{FeatureCollector, SourceFeature}};")?;
    writeln!(out)?;
    writeln!(
        out,
        "/// A parsed OSM element that would appear in a row of an imposm3 table."
    )?;
    writeln!(out, "pub trait Row: WithSource {{")?;
    writeln!(out, "    fn as_any(&self) -> &dyn Any;")?;
    writeln!(out, "}}")?;
    writeln!(out)?;
    writeln!(
        out,
        "/// Builds a row from a source element and the mapping key that matched it."
    )?;
    writeln!(
        out,
        "pub type Constructor = fn(&SourceFeature, &str) -> Box<dyn Row>;"
    )?;
    writeln!(out)?;
    writeln!(out, "#[derive(Clone, Copy)]")?;
    writeln!(out, "pub struct RowConstructor {{")?;
    writeln!(out, "    pub table: &'static str,")?;
    writeln!(out, "    pub create: Constructor,")?;
    writeln!(out, "}}")?;
    writeln!(out)?;
    writeln!(
        out,
        "/// A layer's handler for one table, accepting any row and ignoring rows of"
    )?;
    writeln!(out, "/// other tables.")?;
    writeln!(
        out,
        "pub type RowHandler<'a> = Box<dyn Fn(&dyn Row, &mut FeatureCollector) + 'a>;"
    )?;

    let rows: Vec<&CompiledTable> = artifacts
        .tables
        .iter()
        .filter(|t| !t.is_relation_member())
        .collect();

    let mut types = Scope::default();
    for table in &rows {
        let handler = handler_name(table);
        for ident in [&table.row_type, &handler] {
            if let Some(holder) = types.claim(ident, &table.key) {
                bail!(
                    "Tables '{}' and '{}' both generate type {}",
                    holder,
                    table.key,
                    ident
                );
            }
        }
    }
    let mut accessors = Scope::default();
    for (name, _) in artifacts.field_types.iter() {
        let ident = accessor_trait(name);
        if let Some(holder) = accessors.claim(&ident, name) {
            bail!("Fields '{}' and '{}' both generate trait {}", holder, name, ident);
        }
    }

    for table in &rows {
        writeln!(out)?;
        render_row(&mut out, table)?;
    }

    for (name, field_type) in artifacts.field_types.iter() {
        writeln!(out)?;
        writeln!(out, "/// Rows with a {} `{}` attribute.", field_type, name)?;
        writeln!(out, "pub trait {} {{", accessor_trait(name))?;
        writeln!(
            out,
            "    fn {}(&self) -> {};",
            snake_ident(name),
            accessor_type(field_type)
        )?;
        writeln!(out, "}}")?;
    }

    writeln!(out)?;
    writeln!(
        out,
        "/// Index choosing the tables an element belongs to from its tags. All matching"
    )?;
    writeln!(out, "/// entries apply.")?;
    writeln!(out, "pub fn mappings() -> MultiExpression<RowConstructor> {{")?;
    writeln!(out, "    MultiExpression::of(vec![")?;
    for rule in artifacts.row_index.rules() {
        let row = &rule.result.row_type;
        writeln!(out, "        (")?;
        writeln!(out, "            RowConstructor {{")?;
        writeln!(out, "                table: {row}::TABLE,")?;
        writeln!(
            out,
            "                create: |source, key| Box::new({row}::new(source, key)),"
        )?;
        writeln!(out, "            }},")?;
        writeln!(out, "            {row}::mapping(),")?;
        writeln!(out, "        ),")?;
    }
    writeln!(out, "    ])")?;
    writeln!(out, "}}")?;

    render_dispatch(&mut out, &rows)?;
    Ok(out)
}

fn handler_name(table: &CompiledTable) -> String {
    format!("{}Handler", table.row_type)
}

fn accessor_trait(field: &str) -> String {
    upper_camel(&format!("with_{field}"))
}

fn render_dispatch(out: &mut String, rows: &[&CompiledTable]) -> Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "/// Implemented by layers to subscribe to the tables they render. Each method"
    )?;
    writeln!(
        out,
        "/// returns the layer's handler for one table, or `None` to skip that table."
    )?;
    writeln!(out, "pub trait TableSubscriber {{")?;
    for (i, table) in rows.iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        writeln!(
            out,
            "    fn {}(&self) -> Option<&dyn {}> {{",
            snake_ident(&table.table_name),
            handler_name(table)
        )?;
        writeln!(out, "        None")?;
        writeln!(out, "    }}")?;
    }
    writeln!(out, "}}")?;
    writeln!(out)?;

    writeln!(
        out,
        "/// Map from table name to the handlers subscribed to it, in subscriber order."
    )?;
    writeln!(out, "pub fn dispatch_map<'a>(")?;
    writeln!(out, "    subscribers: &[&'a dyn TableSubscriber],")?;
    writeln!(out, ") -> HashMap<&'static str, Vec<RowHandler<'a>>> {{")?;
    writeln!(
        out,
        "    let mut result: HashMap<&'static str, Vec<RowHandler<'a>>> = HashMap::new();"
    )?;
    writeln!(out, "    for &subscriber in subscribers {{")?;
    for table in rows {
        let row = &table.row_type;
        writeln!(
            out,
            "        if let Some(handler) = subscriber.{}() {{",
            snake_ident(&table.table_name)
        )?;
        writeln!(out, "            result.entry({row}::TABLE).or_default().push(Box::new(")?;
        writeln!(
            out,
            "                move |row: &dyn Row, features: &mut FeatureCollector| {{"
        )?;
        writeln!(
            out,
            "                    if let Some(row) = row.as_any().downcast_ref::<{row}>() {{"
        )?;
        writeln!(out, "                        handler.process(row, features);")?;
        writeln!(out, "                    }}")?;
        writeln!(out, "                }},")?;
        writeln!(out, "            ));")?;
        writeln!(out, "        }}")?;
    }
    writeln!(out, "    }}")?;
    writeln!(out, "    result")?;
    writeln!(out, "}}")?;
    Ok(())
}

fn render_row(out: &mut String, table: &CompiledTable) -> Result<()> {
    let row = &table.row_type;
    let uses_key = table.fields.iter().any(|f| {
        matches!(
            f.extraction,
            Extraction::MappingKey | Extraction::MappingValue
        )
    });
    let key_param = if uses_key { "mapping_key" } else { "_mapping_key" };

    writeln!(
        out,
        "/// An OSM element that would appear in the `{}` table generated by imposm3.",
        table.table_name
    )?;
    writeln!(out, "#[derive(Debug, Clone)]")?;
    writeln!(out, "pub struct {row} {{")?;
    for field in &table.fields {
        writeln!(
            out,
            "    pub {}: {},",
            snake_ident(&field.name),
            stored_type(field.declared_type)
        )?;
    }
    writeln!(out, "}}")?;
    writeln!(out)?;

    writeln!(out, "impl {row} {{")?;
    writeln!(out, "    pub const TABLE: &'static str = {:?};", table.table_name)?;
    writeln!(out)?;
    writeln!(
        out,
        "    /// imposm3 \"mapping\" selecting the elements that appear in this table."
    )?;
    writeln!(out, "    pub fn mapping() -> Expression {{")?;
    writeln!(out, "        {}", table.expression)?;
    writeln!(out, "    }}")?;
    writeln!(out)?;
    writeln!(
        out,
        "    pub fn new(source: &SourceFeature, {key_param}: &str) -> Self {{"
    )?;
    writeln!(out, "        Self {{")?;
    for field in &table.fields {
        writeln!(
            out,
            "            {}: {},",
            snake_ident(&field.name),
            extraction_code(&field.extraction)
        )?;
    }
    writeln!(out, "        }}")?;
    writeln!(out, "    }}")?;
    writeln!(out, "}}")?;
    writeln!(out)?;
    writeln!(out, "impl Row for {row} {{")?;
    writeln!(out, "    fn as_any(&self) -> &dyn Any {{")?;
    writeln!(out, "        self")?;
    writeln!(out, "    }}")?;
    writeln!(out, "}}")?;
    writeln!(out)?;
    writeln!(
        out,
        "/// Layers implement this to receive [`{row}`] rows through [`TableSubscriber`]."
    )?;
    writeln!(out, "pub trait {} {{", handler_name(table))?;
    writeln!(
        out,
        "    fn process(&self, element: &{row}, features: &mut FeatureCollector);"
    )?;
    writeln!(out, "}}")?;

    for field in &table.fields {
        let ident = snake_ident(&field.name);
        writeln!(out)?;
        writeln!(out, "impl {} for {row} {{", accessor_trait(&field.name))?;
        writeln!(
            out,
            "    fn {ident}(&self) -> {} {{",
            accessor_type(field.declared_type)
        )?;
        writeln!(out, "        {}", accessor_body(field.declared_type, &ident))?;
        writeln!(out, "    }}")?;
        writeln!(out, "}}")?;
    }
    Ok(())
}

fn stored_type(field_type: FieldType) -> &'static str {
    match field_type {
        FieldType::String => "Option<String>",
        FieldType::Boolean => "bool",
        FieldType::Integer => "i64",
        FieldType::RawElement => "SourceFeature",
    }
}

fn accessor_type(field_type: FieldType) -> &'static str {
    match field_type {
        FieldType::String => "Option<&str>",
        FieldType::Boolean => "bool",
        FieldType::Integer => "i64",
        FieldType::RawElement => "&SourceFeature",
    }
}

fn accessor_body(field_type: FieldType, ident: &str) -> String {
    match field_type {
        FieldType::String => format!("self.{ident}.as_deref()"),
        FieldType::Boolean | FieldType::Integer => format!("self.{ident}"),
        FieldType::RawElement => format!("&self.{ident}"),
    }
}

fn extraction_code(extraction: &Extraction) -> String {
    match extraction {
        Extraction::Attribute(key) => format!("source.get_string({key:?})"),
        Extraction::AttributeAsBool(key) => format!("source.get_bool({key:?})"),
        Extraction::AttributeAsInt(key) => format!("source.get_long({key:?})"),
        Extraction::WayZOrder => "source.way_zorder()".to_string(),
        Extraction::Direction(key) => format!("source.direction({key:?})"),
        Extraction::MappingKey => "Some(mapping_key.to_string())".to_string(),
        Extraction::MappingValue => "source.get_string(mapping_key)".to_string(),
        Extraction::SourceElement => "source.clone()".to_string(),
    }
}
