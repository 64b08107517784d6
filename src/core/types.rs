use std::fmt;

use super::{RecordError, Result, Value};
use crate::config::RecordConfig;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    Integer,
    Float,
    Text,
    Boolean,
    Timestamp,
}

impl DataType {
    pub fn is_compatible(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (Self::Integer, Value::Integer(_)) => true,
            (Self::Float, Value::Float(_)) => true,
            (Self::Float, Value::Integer(_)) => true,
            (Self::Text, Value::Text(_)) => true,
            (Self::Boolean, Value::Boolean(_)) => true,
            (Self::Timestamp, Value::Timestamp(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => write!(f, "INTEGER"),
            Self::Float => write!(f, "FLOAT"),
            Self::Text => write!(f, "TEXT"),
            Self::Boolean => write!(f, "BOOLEAN"),
            Self::Timestamp => write!(f, "TIMESTAMP"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn validate(&self, value: &Value) -> Result<()> {
        if value.is_null() {
            if !self.nullable {
                return Err(RecordError::ConstraintViolation(format!(
                    "Column '{}' cannot be NULL",
                    self.name
                )));
            }
            return Ok(());
        }

        if !self.data_type.is_compatible(value) {
            return Err(RecordError::TypeMismatch(format!(
                "Column '{}' expects type {}, got {}",
                self.name,
                self.data_type,
                value.type_name()
            )));
        }

        Ok(())
    }
}

/// Column layout of one record type.
///
/// A schema is immutable once built and is shared (behind an `Arc`) by every
/// record of its table, including duplicates and clones.
#[derive(Debug, Clone)]
pub struct Schema {
    table_name: String,
    columns: Vec<Column>,
    config: RecordConfig,
}

impl Schema {
    pub fn new(table_name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self::with_config(table_name, columns, RecordConfig::default())
    }

    pub fn with_config(
        table_name: impl Into<String>,
        columns: Vec<Column>,
        config: RecordConfig,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            columns,
            config,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn config(&self) -> &RecordConfig {
        &self.config
    }

    pub fn find_column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|col| col.name == name)
    }

    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.find_column_index(name).map(|idx| &self.columns[idx])
    }

    /// Looks up a column, failing with `UnknownAttribute` when it is absent.
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.get_column(name)
            .ok_or_else(|| RecordError::UnknownAttribute {
                table: self.table_name.clone(),
                attribute: name.to_string(),
            })
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// The primary-key column, when the schema stores it as an attribute.
    pub fn primary_key_column(&self) -> Option<&Column> {
        self.get_column(&self.config.primary_key)
    }

    /// Timestamp columns from the config that actually exist in the schema.
    pub fn timestamp_columns(&self) -> impl Iterator<Item = &Column> {
        self.config
            .timestamp_columns
            .iter()
            .filter_map(|name| self.get_column(name))
    }
}
