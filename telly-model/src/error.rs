use std::fmt::{self, Display};

/// Errors produced while validating upstream or client supplied payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    MissingField(&'static str),
    InvalidField { field: &'static str, reason: String },
    Duplicate(String),
}

impl ModelError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ModelError::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::MissingField(field) => {
                write!(f, "missing required field `{field}`")
            }
            ModelError::InvalidField { field, reason } => {
                write!(f, "invalid `{field}`: {reason}")
            }
            ModelError::Duplicate(msg) => write!(f, "duplicate entry: {msg}"),
        }
    }
}

impl std::error::Error for ModelError {}

pub type Result<T> = std::result::Result<T, ModelError>;
