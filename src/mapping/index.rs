//! Ordered multi-expression index.

use serde::Serialize;

use crate::dsl::{Element, Expression, evaluate};

/// One `expression => result` entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule<T> {
    pub expression: Expression,
    pub result: T,
}

impl<T> Rule<T> {
    pub fn new(result: T, expression: Expression) -> Self {
        Rule { expression, result }
    }
}

/// An ordered list of rules where every matching rule fires.
///
/// Order is kept exactly as built and only affects enumeration order; there
/// is no first-match priority and duplicates are never merged.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MultiExpressionIndex<T> {
    rules: Vec<Rule<T>>,
}

impl<T> MultiExpressionIndex<T> {
    pub fn build(rules: impl IntoIterator<Item = Rule<T>>) -> Self {
        MultiExpressionIndex {
            rules: rules.into_iter().collect(),
        }
    }

    pub fn rules(&self) -> &[Rule<T>] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Results of every rule satisfied by `element`, in rule order.
    pub fn matches(&self, element: &Element) -> Vec<&T> {
        self.rules
            .iter()
            .filter(|rule| evaluate(&rule.expression, element))
            .map(|rule| &rule.result)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::{match_any, match_field, match_type};

    fn poi(tags: &[(&str, &str)]) -> Element {
        tags.iter()
            .fold(Element::new(["point"]), |el, (k, v)| el.with_tag(*k, *v))
    }

    fn make_index() -> MultiExpressionIndex<&'static str> {
        MultiExpressionIndex::build([
            Rule::new("food", match_any("amenity", ["restaurant", "cafe"])),
            Rule::new("retail", match_field("shop")),
            Rule::new("named", match_field("name")),
            Rule::new("area", match_type("polygon")),
        ])
    }

    #[test]
    fn all_matching_rules_fire() {
        let index = make_index();
        assert_eq!(
            index.matches(&poi(&[("amenity", "cafe"), ("name", "Joe's")])),
            vec![&"food", &"named"]
        );
        assert_eq!(
            index.matches(&poi(&[("shop", "bakery")])),
            vec![&"retail"]
        );
    }

    #[test]
    fn no_match() {
        let index = make_index();
        assert!(index.matches(&poi(&[("highway", "primary")])).is_empty());
    }

    #[test]
    fn keeps_insertion_order() {
        let index = MultiExpressionIndex::build([
            Rule::new("second-listed-first", match_field("b")),
            Rule::new("first-listed-second", match_field("a")),
        ]);
        let results: Vec<_> = index.rules().iter().map(|r| r.result).collect();
        assert_eq!(results, ["second-listed-first", "first-listed-second"]);

        // Match order follows rule order, not which tag was inserted first
        let element = poi(&[("a", "1"), ("b", "1")]);
        assert_eq!(
            index.matches(&element),
            vec![&"second-listed-first", &"first-listed-second"]
        );
    }

    #[test]
    fn identical_expressions_are_not_merged() {
        let index = MultiExpressionIndex::build([
            Rule::new(1, match_field("a")),
            Rule::new(2, match_field("a")),
        ]);
        assert_eq!(index.len(), 2);
        assert_eq!(index.matches(&poi(&[("a", "x")])), vec![&1, &2]);
    }

    #[test]
    fn empty_index() {
        let index: MultiExpressionIndex<String> = MultiExpressionIndex::build(Vec::new());
        assert!(index.is_empty());
        assert!(index.matches(&poi(&[])).is_empty());
    }
}
