//! Field-value mappings declared in layer schemas.

use indexmap::{IndexMap, IndexSet};

use super::index::{MultiExpressionIndex, Rule};
use crate::dsl::{FilterNode, compile};
use crate::error::SchemaResult;
use crate::utils::documented_value;

/// Build the index that derives a layer field's value from element tags.
///
/// Each `value: filter` entry becomes a rule producing `value`. Entries whose
/// filter reduces to a constant (matches nothing, or everything) carry no
/// information and are left out.
pub fn field_mapping(
    values: &IndexMap<String, FilterNode>,
) -> SchemaResult<MultiExpressionIndex<String>> {
    let mut rules = Vec::with_capacity(values.len());
    for (value, filter) in values {
        let expression = compile(filter)
            .map_err(|e| e.in_context(format!("value '{value}'")))?
            .simplify();
        if expression.is_false() || expression.is_true() {
            tracing::debug!("Skipping constant mapping for value '{}'", value);
            continue;
        }
        rules.push(Rule::new(value.clone(), expression));
    }
    Ok(MultiExpressionIndex::build(rules))
}

/// Allowed values documented for a layer field, in schema order.
///
/// A mapping documents values derived from filters (its keys, verbatim). A
/// list documents plain values, where anything after the first space is an
/// annotation and dropped.
pub fn allowed_values(values: &FilterNode) -> SchemaResult<Vec<String>> {
    let values: IndexSet<String> = match values {
        FilterNode::Mapping(map) => map.keys().cloned().collect(),
        FilterNode::Null => IndexSet::new(),
        other => other
            .literals()?
            .into_iter()
            .map(|literal| documented_value(literal).to_string())
            .collect(),
    };
    Ok(values.into_iter().collect())
}

/// Mapping form of a field's `values`, if it has one.
pub fn value_filters(values: &FilterNode) -> Option<&IndexMap<String, FilterNode>> {
    match values {
        FilterNode::Mapping(map) => Some(map),
        _ => None,
    }
}
