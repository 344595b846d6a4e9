//! Filter documents as read from the schema, before compilation.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_yaml::Value;

use crate::error::{SchemaError, SchemaResult};

pub const AND_KEY: &str = "__AND__";
pub const OR_KEY: &str = "__OR__";
pub const ANY_VALUE: &str = "__any__";

/// A filter document node.
///
/// Scalars keep their literal text: numbers and booleans are stringified so
/// that `lanes: [2]` matches the tag value `"2"`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub enum FilterNode {
    Null,
    Scalar(String),
    Sequence(Vec<FilterNode>),
    Mapping(IndexMap<String, FilterNode>),
}

impl From<Value> for FilterNode {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FilterNode::Null,
            Value::Bool(b) => FilterNode::Scalar(b.to_string()),
            Value::Number(n) => FilterNode::Scalar(n.to_string()),
            Value::String(s) => FilterNode::Scalar(s),
            Value::Sequence(items) => {
                FilterNode::Sequence(items.into_iter().map(FilterNode::from).collect())
            }
            Value::Mapping(map) => FilterNode::Mapping(
                map.into_iter()
                    .map(|(key, value)| (key_text(key), FilterNode::from(value)))
                    .collect(),
            ),
            Value::Tagged(tagged) => FilterNode::from(tagged.value),
        }
    }
}

fn key_text(key: Value) -> String {
    match key {
        Value::String(s) => s,
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => "null".to_string(),
        Value::Tagged(tagged) => key_text(tagged.value),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

impl FilterNode {
    /// All non-sequence nodes reachable through nested sequences, in order.
    ///
    /// `[[[a, b], c], [d]]` yields `a, b, c, d`; a non-sequence node yields
    /// itself.
    pub fn leaves(&self) -> Vec<&FilterNode> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a FilterNode>) {
        match self {
            FilterNode::Sequence(items) => {
                for item in items {
                    item.collect_leaves(out);
                }
            }
            other => out.push(other),
        }
    }

    /// Literal strings of a field's value list. Nulls are ignored.
    pub fn literals(&self) -> SchemaResult<Vec<&str>> {
        let mut values = Vec::new();
        for leaf in self.leaves() {
            match leaf {
                FilterNode::Scalar(s) => values.push(s.as_str()),
                FilterNode::Null => {}
                FilterNode::Mapping(_) => {
                    return Err(SchemaError::malformed(
                        "value lists may only contain literals",
                    ));
                }
                FilterNode::Sequence(_) => unreachable!("leaves are never sequences"),
            }
        }
        Ok(values)
    }
}

/// The shape of one flattened filter leaf.
#[derive(Debug)]
pub enum FilterShape<'a> {
    AndCombinator(&'a FilterNode),
    OrCombinator(&'a FilterNode),
    FieldMap(&'a IndexMap<String, FilterNode>),
    Empty,
}

impl<'a> FilterShape<'a> {
    /// Classify a leaf produced by [`FilterNode::leaves`].
    pub fn classify(node: &'a FilterNode) -> SchemaResult<Self> {
        match node {
            FilterNode::Null => Ok(FilterShape::Empty),
            FilterNode::Mapping(map) => {
                if let Some(inner) = map.get(AND_KEY) {
                    ensure_alone(map, AND_KEY)?;
                    Ok(FilterShape::AndCombinator(inner))
                } else if let Some(inner) = map.get(OR_KEY) {
                    ensure_alone(map, OR_KEY)?;
                    Ok(FilterShape::OrCombinator(inner))
                } else {
                    Ok(FilterShape::FieldMap(map))
                }
            }
            FilterNode::Scalar(s) => Err(SchemaError::malformed(format!(
                "expected a mapping, a list or null, got '{s}'"
            ))),
            FilterNode::Sequence(_) => Err(SchemaError::malformed(
                "nested lists must be flattened before classification",
            )),
        }
    }
}

fn ensure_alone(map: &IndexMap<String, FilterNode>, key: &str) -> SchemaResult<()> {
    if map.len() > 1 {
        return Err(SchemaError::malformed(format!(
            "cannot combine {key} with other keys"
        )));
    }
    Ok(())
}
