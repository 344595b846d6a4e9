//! Compiles imposm3-style filter documents into [`Expression`]s.
//!
//! A mapping `{highway: [primary, trunk], railway: __any__}` is satisfied when
//! any of its fields match. `{__AND__: [...]}` and `{__OR__: [...]}` compose
//! explicitly and must be the only key of their mapping. Nested lists are
//! flattened everywhere, and `null` contributes nothing.

use super::ast::{Expression, and, match_any, match_field, match_type, not, or};
use super::node::{ANY_VALUE, FilterNode, FilterShape};
use crate::error::SchemaResult;

/// Compile a filter document into an unsimplified expression: the `Or` of
/// everything the document lists.
pub fn compile(node: &FilterNode) -> SchemaResult<Expression> {
    Ok(or(compile_items(node)?))
}

fn compile_items(node: &FilterNode) -> SchemaResult<Vec<Expression>> {
    let mut out = Vec::new();
    for leaf in node.leaves() {
        match FilterShape::classify(leaf)? {
            FilterShape::Empty => {}
            FilterShape::AndCombinator(inner) => out.push(and(compile_items(inner)?)),
            FilterShape::OrCombinator(inner) => out.push(or(compile_items(inner)?)),
            FilterShape::FieldMap(fields) => {
                for (field, values) in fields {
                    out.push(compile_field(field, values)?);
                }
            }
        }
    }
    Ok(out)
}

fn compile_field(field: &str, values: &FilterNode) -> SchemaResult<Expression> {
    let literals = values.literals()?;
    if literals.is_empty() || literals.contains(&ANY_VALUE) {
        Ok(match_field(field))
    } else {
        Ok(match_any(field, literals))
    }
}

/// Filters that further restrict a table's mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableFilters<'a> {
    pub require: Option<&'a FilterNode>,
    pub reject: Option<&'a FilterNode>,
}

/// Expression for an element of `table_type` that matches `mapping`,
/// satisfies every `require` entry and no `reject` entry.
pub fn compile_table(
    table_type: &str,
    mapping: Option<&FilterNode>,
    filters: TableFilters<'_>,
) -> SchemaResult<Expression> {
    let items = |node: Option<&FilterNode>| match node {
        Some(node) => compile_items(node),
        None => Ok(Vec::new()),
    };

    Ok(and([
        or(items(mapping)?),
        and(items(filters.require)?),
        not(or(items(filters.reject)?)),
        match_type(singularize(table_type)),
    ])
    .simplify())
}

/// Combine the per-type expressions of a table that declares `type_mappings`.
pub fn compile_type_mappings<'a>(
    type_mappings: impl IntoIterator<Item = (&'a str, &'a FilterNode)>,
    filters: TableFilters<'_>,
) -> SchemaResult<Expression> {
    let mut branches = Vec::new();
    for (table_type, mapping) in type_mappings {
        branches.push(compile_table(table_type, Some(mapping), filters)?);
    }
    Ok(or(branches).simplify())
}

/// Strip one trailing "s": `ways` -> `way`. Only handles regular plurals.
pub fn singularize(type_tag: &str) -> &str {
    type_tag.strip_suffix('s').unwrap_or(type_tag)
}
