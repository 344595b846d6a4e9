//! Canonical boolean expressions over element tags.

use indexmap::IndexSet;
use serde::Serialize;
use std::fmt;

/// A predicate over an element's tags and type.
///
/// `And([])` is always true and `Or([])` is always false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Expression {
    And(Vec<Expression>),
    Or(Vec<Expression>),
    Not(Box<Expression>),

    /// Tag present with any value: `railway`
    MatchField(String),

    /// Tag equal to one of a set of values: `highway=primary|trunk`
    MatchAny(String, IndexSet<String>),

    /// Element type: `point`, `linestring`, `polygon`, `way`, ...
    MatchType(String),
}

pub fn and(children: impl IntoIterator<Item = Expression>) -> Expression {
    Expression::And(children.into_iter().collect())
}

pub fn or(children: impl IntoIterator<Item = Expression>) -> Expression {
    Expression::Or(children.into_iter().collect())
}

pub fn not(child: Expression) -> Expression {
    Expression::Not(Box::new(child))
}

pub fn match_field(field: impl Into<String>) -> Expression {
    Expression::MatchField(field.into())
}

pub fn match_any<S: Into<String>>(
    field: impl Into<String>,
    values: impl IntoIterator<Item = S>,
) -> Expression {
    Expression::MatchAny(field.into(), values.into_iter().map(Into::into).collect())
}

pub fn match_type(kind: impl Into<String>) -> Expression {
    Expression::MatchType(kind.into())
}

impl Expression {
    pub const TRUE: Expression = Expression::And(Vec::new());
    pub const FALSE: Expression = Expression::Or(Vec::new());

    pub fn is_true(&self) -> bool {
        matches!(self, Expression::And(children) if children.is_empty())
    }

    pub fn is_false(&self) -> bool {
        matches!(self, Expression::Or(children) if children.is_empty())
    }

    /// Reduce to canonical form.
    ///
    /// Nested same-operator children are merged, duplicates dropped, single
    /// children unwrapped, and constant children absorb or vanish. The result
    /// is a fixed point: simplifying it again returns it unchanged.
    pub fn simplify(self) -> Self {
        match self {
            Expression::And(children) => {
                let mut flat = Vec::new();
                for child in children {
                    match child.simplify() {
                        Expression::And(inner) => {
                            for e in inner {
                                push_unique(&mut flat, e);
                            }
                        }
                        other if other.is_false() => return Expression::FALSE,
                        other => push_unique(&mut flat, other),
                    }
                }
                collapse(flat, Expression::And)
            }
            Expression::Or(children) => {
                let mut flat = Vec::new();
                for child in children {
                    match child.simplify() {
                        Expression::Or(inner) => {
                            for e in inner {
                                push_unique(&mut flat, e);
                            }
                        }
                        other if other.is_true() => return Expression::TRUE,
                        other => push_unique(&mut flat, other),
                    }
                }
                collapse(flat, Expression::Or)
            }
            Expression::Not(inner) => match inner.simplify() {
                e if e.is_false() => Expression::TRUE,
                e if e.is_true() => Expression::FALSE,
                Expression::Not(double) => *double,
                other => not(other),
            },
            leaf => leaf,
        }
    }
}

fn push_unique(flat: &mut Vec<Expression>, expr: Expression) {
    if !flat.contains(&expr) {
        flat.push(expr);
    }
}

fn collapse(mut flat: Vec<Expression>, op: fn(Vec<Expression>) -> Expression) -> Expression {
    if flat.len() == 1 {
        flat.remove(0)
    } else {
        op(flat)
    }
}

/// Renders as constructor calls, e.g.
/// `and([match_any("amenity", ["cafe"]), match_type("point")])`.
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::And(children) => write_list(f, "and", children),
            Expression::Or(children) => write_list(f, "or", children),
            Expression::Not(child) => write!(f, "not({child})"),
            Expression::MatchField(field) => write!(f, "match_field({field:?})"),
            Expression::MatchAny(field, values) => {
                write!(f, "match_any({field:?}, [")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{value:?}")?;
                }
                write!(f, "])")
            }
            Expression::MatchType(kind) => write!(f, "match_type({kind:?})"),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, name: &str, children: &[Expression]) -> fmt::Result {
    write!(f, "{name}([")?;
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{child}")?;
    }
    write!(f, "])")
}
