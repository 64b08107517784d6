use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::{RecordError, Result, Schema, Value};

/// Raw state of a stored record, as handed over by the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordState {
    pub table_name: String,
    pub id: Option<i64>,
    pub fields: serde_json::Value,
}

impl RecordState {
    pub fn new(table_name: impl Into<String>, id: Option<i64>, fields: serde_json::Value) -> Self {
        Self {
            table_name: table_name.into(),
            id,
            fields,
        }
    }

    /// Returns the fields as a JSON object, or an error if they are not an object.
    pub fn fields_object(&self) -> Result<&serde_json::Map<String, serde_json::Value>> {
        self.fields.as_object().ok_or_else(|| {
            RecordError::InvalidState("Record state fields must be a JSON object".to_string())
        })
    }

    pub fn fields_object_mut(&mut self) -> Result<&mut serde_json::Map<String, serde_json::Value>> {
        self.fields.as_object_mut().ok_or_else(|| {
            RecordError::InvalidState("Record state fields must be a JSON object".to_string())
        })
    }

    pub fn set_json_field(
        &mut self,
        name: impl Into<String>,
        value: serde_json::Value,
    ) -> Result<()> {
        let fields = self.fields_object_mut()?;
        fields.insert(name.into(), value);
        Ok(())
    }

    /// Decodes the stored fields into typed attribute values.
    ///
    /// Every schema column gets an entry; columns missing from the state are
    /// `Null`. The primary-key column, when present, takes the state's id.
    pub(crate) fn decode(&self, schema: &Schema) -> Result<BTreeMap<String, Value>> {
        if self.table_name != schema.table_name() {
            return Err(RecordError::InvalidState(format!(
                "State belongs to table '{}', expected '{}'",
                self.table_name,
                schema.table_name()
            )));
        }
        let id = self.id.ok_or_else(|| {
            RecordError::InvalidState(format!(
                "Stored record of table '{}' has no id",
                self.table_name
            ))
        })?;

        let fields = self.fields_object()?;
        if let Some(name) = fields.keys().find(|name| schema.get_column(name).is_none()) {
            return Err(RecordError::UnknownAttribute {
                table: self.table_name.clone(),
                attribute: name.clone(),
            });
        }

        let primary_key = &schema.config().primary_key;
        let mut values = BTreeMap::new();
        for column in schema.columns() {
            let value = if &column.name == primary_key {
                Value::Integer(id)
            } else {
                match fields.get(&column.name) {
                    Some(json) => Value::from_json(json, &column.data_type)?,
                    None => Value::Null,
                }
            };
            column.validate(&value)?;
            values.insert(column.name.clone(), value);
        }
        Ok(values)
    }
}
