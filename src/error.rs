use thiserror::Error;

use crate::tables::FieldType;

/// Errors raised while compiling a schema into generated artifacts.
///
/// None of these are recovered from: the first one aborts the run before
/// anything is written.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A filter document that cannot be read as a filter, e.g. `__AND__`
    /// mixed with sibling keys.
    #[error("Malformed filter{}: {reason}", location(.context))]
    MalformedFilter { context: String, reason: String },

    /// A column kind outside the supported set.
    #[error("Unsupported column kind '{kind}' for column '{column}' in table '{table}'")]
    UnsupportedColumnKind {
        table: String,
        column: String,
        kind: String,
    },

    /// A keyed column kind declared without a `key`.
    #[error("Column '{column}' of kind '{kind}' in table '{table}' has no key")]
    MissingColumnKey {
        table: String,
        column: String,
        kind: String,
    },

    /// The same attribute name declared with two different types.
    #[error("Field '{field}' has both {existing} and {found} types (table '{table}')")]
    ConflictingFieldType {
        field: String,
        existing: FieldType,
        found: FieldType,
        table: String,
    },
}

impl SchemaError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        SchemaError::MalformedFilter {
            context: String::new(),
            reason: reason.into(),
        }
    }

    /// Name what was being compiled when a filter turned out malformed.
    /// Nested calls read outward: "value 'x' of field 'class'". Other variants
    /// already carry their location.
    pub fn in_context(self, context: impl Into<String>) -> Self {
        match self {
            SchemaError::MalformedFilter {
                context: inner,
                reason,
            } => {
                let context = context.into();
                SchemaError::MalformedFilter {
                    context: if inner.is_empty() {
                        context
                    } else {
                        format!("{inner} of {context}")
                    },
                    reason,
                }
            }
            other => other,
        }
    }
}

fn location(context: &str) -> String {
    if context.is_empty() {
        String::new()
    } else {
        format!(" in {context}")
    }
}

pub type SchemaResult<T> = Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_filter_names_its_location() {
        let err = SchemaError::malformed("cannot combine __AND__ with other keys")
            .in_context("table 'poi_point'");
        assert_eq!(
            err.to_string(),
            "Malformed filter in table 'poi_point': cannot combine __AND__ with other keys"
        );
    }

    #[test]
    fn contexts_nest_outward() {
        let err = SchemaError::malformed("bad")
            .in_context("value 'x'")
            .in_context("field 'class'");
        assert_eq!(
            err.to_string(),
            "Malformed filter in value 'x' of field 'class': bad"
        );
    }

    #[test]
    fn conflicting_types_message() {
        let err = SchemaError::ConflictingFieldType {
            field: "name".into(),
            existing: FieldType::String,
            found: FieldType::Integer,
            table: "roads".into(),
        };
        assert_eq!(
            err.to_string(),
            "Field 'name' has both String and Integer types (table 'roads')"
        );
    }
}
