use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// A mutating operation was attempted on a frozen record.
    #[error("Can't modify frozen record of table '{table}'")]
    Frozen { table: String },

    #[error("Unknown attribute '{attribute}' for table '{table}'")]
    UnknownAttribute { table: String, attribute: String },

    /// The attribute is managed by the persistence layer.
    #[error("Attribute '{attribute}' of table '{table}' is read-only")]
    ReadOnlyAttribute { table: String, attribute: String },

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Invalid record state: {0}")]
    InvalidState(String),
}

impl RecordError {
    pub fn is_frozen(&self) -> bool {
        matches!(self, Self::Frozen { .. })
    }
}

pub type Result<T> = std::result::Result<T, RecordError>;

impl From<serde_json::Error> for RecordError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidState(err.to_string())
    }
}
