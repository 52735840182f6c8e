use thiserror::Error;

/// Errors produced while parsing a client `where` clause.
#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("filter must be a JSON object")]
    NotAnObject,

    #[error("unknown filter operator '{operator}'")]
    UnknownOperator { operator: String },

    #[error("'{operator}' expects {expected}")]
    InvalidOperand {
        operator: String,
        expected: &'static str,
    },

    #[error("invalid value for field '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("field names must be non-empty")]
    EmptyField,
}
