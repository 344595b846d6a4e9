//! Evaluator for compiled expressions.

use super::ast::Expression;
use std::collections::HashMap;

/// A raw element as seen by a matcher: the type tags it satisfies
/// (e.g. `way` and `linestring`) and its string tags.
#[derive(Debug, Clone, Default)]
pub struct Element {
    pub types: Vec<String>,
    pub tags: HashMap<String, String>,
}

impl Element {
    pub fn new<S: Into<String>>(types: impl IntoIterator<Item = S>) -> Self {
        Element {
            types: types.into_iter().map(Into::into).collect(),
            tags: HashMap::new(),
        }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

/// Evaluate an expression against an element.
pub fn evaluate(expr: &Expression, element: &Element) -> bool {
    match expr {
        Expression::And(exprs) => exprs.iter().all(|e| evaluate(e, element)),

        Expression::Or(exprs) => exprs.iter().any(|e| evaluate(e, element)),

        Expression::Not(inner) => !evaluate(inner, element),

        Expression::MatchField(key) => element.tags.get(key).is_some_and(|v| !v.is_empty()),

        Expression::MatchAny(key, values) => element
            .tags
            .get(key)
            .is_some_and(|actual| values.contains(actual)),

        Expression::MatchType(kind) => element.types.iter().any(|t| t == kind),
    }
}
