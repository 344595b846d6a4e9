//! Filter mini-language for imposm3 table mappings and layer field values.
//!
//! Shape:
//!   {tag: [v1, v2]}          - tag equals any value
//!   {tag: [] | __any__}      - tag present
//!   {a: [..], b: [..]}       - any field matches (OR)
//!   {__AND__: [f1, f2]}      - all of
//!   {__OR__: [f1, f2]}       - any of
//!   [f1, [f2, [f3]]]         - nested lists flatten
//!   ~                        - nothing

mod ast;
mod compile;
mod eval;
mod node;

pub use ast::*;
pub use compile::{TableFilters, compile, compile_table, compile_type_mappings};
pub use eval::{Element, evaluate};
pub use node::FilterNode;
