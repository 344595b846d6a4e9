//! imposm3 tables: which elements they hold and which fields their rows carry.

mod fields;
mod rows;

pub use fields::{Extraction, FieldType, FieldTypes};
pub use rows::{CompiledTable, RowConstructor, compile_tables, row_index};
