//! Multi-expression indexes.
//!
//! An index evaluates every rule and reports all that match, in the order the
//! rules were declared.

mod field;
mod index;

pub use field::{allowed_values, field_mapping, value_filters};
pub use index::{MultiExpressionIndex, Rule};
