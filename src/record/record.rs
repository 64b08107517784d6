use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use super::{AttributeStore, ChangeSet, ChangeTracker, Mutability};
use crate::core::{RecordError, Result, Schema, Value};
use crate::persist::RecordState;

/// One entity instance with identity, attributes and dirty tracking.
///
/// Records come in two copy flavours:
///
/// - [`duplicate`](Self::duplicate) builds a new, never-persisted record with
///   its own attribute storage. It is always mutable, even when the source is
///   frozen.
/// - [`shallow_clone`](Self::shallow_clone) (also `Clone::clone`) keeps the
///   id, the persisted flag and the frozen state, and shares attribute storage
///   with the source: a value set on one is read back from the other until
///   either side [`reload`](Self::reload)s or
///   [`detach_attributes`](Self::detach_attributes).
///
/// Change trackers are never shared. Both copy kinds start from an
/// independent copy of the source's tracker, persisted baseline included, and
/// [`changes`](Self::changes) always compares the values a record reads
/// against its own baseline.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use memorecord::{Column, DataType, Record, RecordState, Schema, Value};
///
/// # fn main() -> memorecord::Result<()> {
/// let schema = Arc::new(Schema::new(
///     "topics",
///     vec![
///         Column::new("id", DataType::Integer),
///         Column::new("author_name", DataType::Text),
///     ],
/// ));
/// let state = RecordState::new("topics", Some(1), serde_json::json!({ "author_name": "David" }));
/// let mut topic = Record::from_state(schema, &state)?;
///
/// let cloned = topic.shallow_clone();
/// let duped = topic.duplicate();
/// topic.set("author_name", "Aaron")?;
///
/// assert_eq!(cloned.get("author_name")?, Value::from("Aaron"));
/// assert_eq!(duped.get("author_name")?, Value::from("David"));
/// assert!(duped.is_new_record());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Record {
    schema: Arc<Schema>,
    id: Option<i64>,
    persisted: bool,
    mutability: Mutability,
    attributes: AttributeStore,
    changes: ChangeTracker,
}

impl Record {
    /// A fresh, unpersisted record with every column set to `Null`.
    pub fn new(schema: Arc<Schema>) -> Self {
        let values = schema
            .columns()
            .iter()
            .map(|column| (column.name.clone(), Value::Null))
            .collect();

        Self {
            schema,
            id: None,
            persisted: false,
            mutability: Mutability::Mutable,
            changes: ChangeTracker::with_baseline(&values),
            attributes: AttributeStore::from_values(values),
        }
    }

    /// Builds a persisted record from stored state, with no pending changes.
    pub fn from_state(schema: Arc<Schema>, state: &RecordState) -> Result<Self> {
        let values = state.decode(&schema)?;
        debug!(table = schema.table_name(), id = ?state.id, "loaded record");

        Ok(Self {
            id: state.id,
            persisted: true,
            mutability: Mutability::Mutable,
            changes: ChangeTracker::with_baseline(&values),
            attributes: AttributeStore::from_values(values),
            schema,
        })
    }

    /// Snapshot of the current values in the persistence layer's format.
    pub fn state(&self) -> RecordState {
        let fields = self
            .attributes
            .values()
            .into_iter()
            .filter(|(name, _)| name != &self.schema.config().primary_key)
            .map(|(name, value)| (name, value.to_json()))
            .collect::<serde_json::Map<_, _>>();

        RecordState::new(
            self.schema.table_name(),
            self.id,
            serde_json::Value::Object(fields),
        )
    }

    // ========================================================================
    // Copying
    // ========================================================================

    /// A new, never-persisted record with the same attribute values.
    ///
    /// The result has no id, is not frozen, owns its attribute storage and
    /// starts with a copy of this record's changes. The primary-key attribute
    /// is cleared, and so are the timestamp attributes when the schema's
    /// config asks for it.
    pub fn duplicate(&self) -> Record {
        let attributes = self.attributes.copy_independent();
        let mut changes = self.changes.copy_independent();

        let config = self.schema.config();
        if let Some(pk) = self.schema.primary_key_column() {
            attributes.set(pk.name.clone(), Value::Null);
            changes.rebase(&pk.name, Value::Null);
        }
        if config.reset_timestamps_on_duplicate {
            for column in self.schema.timestamp_columns() {
                attributes.set(column.name.clone(), Value::Null);
                changes.rebase(&column.name, Value::Null);
            }
        }

        debug!(
            table = self.schema.table_name(),
            source_id = ?self.id,
            source_frozen = self.is_frozen(),
            "duplicated record"
        );

        Record {
            schema: Arc::clone(&self.schema),
            id: None,
            persisted: false,
            mutability: Mutability::Mutable,
            attributes,
            changes,
        }
    }

    /// A copy keeping id, persisted flag and frozen state, sharing attribute
    /// storage with this record.
    pub fn shallow_clone(&self) -> Record {
        debug!(
            table = self.schema.table_name(),
            id = ?self.id,
            frozen = self.is_frozen(),
            "cloned record"
        );

        Record {
            schema: Arc::clone(&self.schema),
            id: self.id,
            persisted: self.persisted,
            mutability: self.mutability,
            attributes: self.attributes.copy_shared_reference(),
            changes: self.changes.copy_independent(),
        }
    }

    /// Whether this record and `other` read and write the same attribute
    /// storage.
    pub fn shares_attributes_with(&self, other: &Record) -> bool {
        self.attributes.shares_backing_with(&other.attributes)
    }

    // ========================================================================
    // Identity and state
    // ========================================================================

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn table_name(&self) -> &str {
        self.schema.table_name()
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    pub fn is_new_record(&self) -> bool {
        !self.persisted
    }

    pub fn is_frozen(&self) -> bool {
        self.mutability.is_frozen()
    }

    pub fn mutability(&self) -> Mutability {
        self.mutability
    }

    /// Makes this instance read-only for good.
    ///
    /// A record still sharing attribute storage with a mutable clone moves
    /// onto a private copy first, so nothing can change its values afterwards.
    /// Copies made later follow their own rules: a shallow clone is frozen too
    /// and shares the frozen storage, a duplicate is not.
    pub fn freeze(&mut self) -> &mut Self {
        if !self.is_frozen() {
            self.attributes.detach();
            debug!(table = self.schema.table_name(), id = ?self.id, "froze record");
        }
        self.mutability.freeze();
        self
    }

    /// Called by the persistence layer once the record is stored under `id`.
    ///
    /// The current values become the new baseline.
    pub fn mark_persisted(&mut self, id: i64) -> Result<()> {
        self.ensure_mutable()?;

        if let Some(pk) = self.schema.primary_key_column() {
            self.attributes.set(pk.name.clone(), Value::Integer(id));
        }
        self.id = Some(id);
        self.persisted = true;
        self.changes.rebase_all(&self.attributes.values());
        Ok(())
    }

    fn ensure_mutable(&self) -> Result<()> {
        match self.mutability {
            Mutability::Mutable => Ok(()),
            Mutability::Frozen => {
                warn!(
                    table = self.schema.table_name(),
                    id = ?self.id,
                    "rejected write to frozen record"
                );
                Err(RecordError::Frozen {
                    table: self.schema.table_name().to_string(),
                })
            }
        }
    }

    // ========================================================================
    // Attributes
    // ========================================================================

    pub fn get(&self, name: &str) -> Result<Value> {
        self.schema.column(name)?;
        Ok(self.attributes.get(name).unwrap_or(Value::Null))
    }

    pub fn attributes(&self) -> BTreeMap<String, Value> {
        self.attributes.values()
    }

    /// Writes an attribute in place and tracks the change.
    ///
    /// On a shallow clone pair the new value is visible through both records.
    /// The primary key is owned by the persistence layer and can't be set.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.ensure_mutable()?;

        let value = value.into();
        let column = self.schema.column(name)?;
        if column.name == self.schema.config().primary_key {
            return Err(RecordError::ReadOnlyAttribute {
                table: self.schema.table_name().to_string(),
                attribute: name.to_string(),
            });
        }
        column.validate(&value)?;

        let old = self
            .attributes
            .set(name.to_string(), value.clone())
            .unwrap_or(Value::Null);
        self.changes.record_change(name, old, value);
        Ok(())
    }

    /// Sets several attributes, stopping at the first failure.
    pub fn assign<I, K, V>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        for (name, value) in values {
            self.set(name.as_ref(), value)?;
        }
        Ok(())
    }

    /// Replaces the attribute storage with freshly loaded state.
    ///
    /// Pending changes are dropped. A shallow clone sharing the old storage
    /// keeps it and no longer sees this record's writes.
    pub fn reload(&mut self, state: &RecordState) -> Result<()> {
        self.ensure_mutable()?;

        let values = state.decode(&self.schema)?;
        self.changes.rebase_all(&values);
        self.attributes.replace(values);
        self.id = state.id;
        self.persisted = true;

        debug!(table = self.schema.table_name(), id = ?self.id, "reloaded record");
        Ok(())
    }

    /// Moves this record onto a private copy of its attribute storage.
    pub fn detach_attributes(&mut self) -> Result<()> {
        self.ensure_mutable()?;
        self.attributes.detach();
        Ok(())
    }

    // ========================================================================
    // Dirty tracking
    // ========================================================================

    /// Attributes whose current value differs from the persisted one.
    ///
    /// Computed from the values this record reads now, so writes made through
    /// a shallow clone sharing the storage are reflected as well.
    pub fn changes(&self) -> ChangeSet {
        self.changes.diff(&self.attributes.values())
    }

    pub fn has_changes(&self) -> bool {
        !self.changes().is_empty()
    }

    /// Names of the changed attributes, sorted.
    pub fn changed(&self) -> Vec<String> {
        self.changes().into_keys().collect()
    }

    pub fn attribute_changed(&self, name: &str) -> bool {
        self.changes().contains_key(name)
    }

    /// The persisted value of `name`, or its current value when unchanged.
    pub fn attribute_was(&self, name: &str) -> Result<Value> {
        match self.changes.baseline(name) {
            Some(old) => Ok(old.clone()),
            None => self.get(name),
        }
    }

    /// Puts the persisted value of `name` back and forgets its change.
    pub fn restore_attribute(&mut self, name: &str) -> Result<()> {
        self.ensure_mutable()?;
        self.schema.column(name)?;

        if let Some(persisted) = self.changes.baseline(name).cloned() {
            self.attributes.set(name.to_string(), persisted);
        }
        self.changes.forget(name);
        Ok(())
    }
}

impl Clone for Record {
    fn clone(&self) -> Self {
        self.shallow_clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecordConfig;
    use crate::core::{Column, DataType};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn topics(config: RecordConfig) -> Arc<Schema> {
        Arc::new(Schema::with_config(
            "topics",
            vec![
                Column::new("id", DataType::Integer),
                Column::new("title", DataType::Text),
                Column::new("author_name", DataType::Text),
                Column::new("replies_count", DataType::Integer).not_null(),
                Column::new("updated_at", DataType::Timestamp),
            ],
            config,
        ))
    }

    fn first_topic(config: RecordConfig) -> Record {
        let state = RecordState::new(
            "topics",
            Some(1),
            json!({
                "title": "The First Topic",
                "author_name": "David",
                "replies_count": 1,
                "updated_at": "2003-07-16T15:28:11Z",
            }),
        );
        Record::from_state(topics(config), &state).unwrap()
    }

    #[test]
    fn test_new_record_defaults() {
        let topic = Record::new(topics(RecordConfig::default()));
        assert!(topic.is_new_record());
        assert_eq!(topic.id(), None);
        assert!(!topic.has_changes());
        assert_eq!(topic.get("title").unwrap(), Value::Null);
    }

    #[test]
    fn test_loaded_record_is_clean() {
        let topic = first_topic(RecordConfig::default());
        assert!(topic.is_persisted());
        assert_eq!(topic.id(), Some(1));
        assert_eq!(topic.get("id").unwrap(), Value::Integer(1));
        assert!(topic.changes().is_empty());
    }

    #[test]
    fn test_set_validates_before_writing() {
        let mut topic = first_topic(RecordConfig::default());

        assert!(matches!(
            topic.set("bogus", "x"),
            Err(RecordError::UnknownAttribute { .. })
        ));
        assert!(matches!(topic.set("title", 3i64), Err(RecordError::TypeMismatch(_))));
        assert!(matches!(
            topic.set("replies_count", Value::Null),
            Err(RecordError::ConstraintViolation(_))
        ));
        assert!(!topic.has_changes());
        assert_eq!(topic.get("title").unwrap(), Value::from("The First Topic"));
    }

    #[test]
    fn test_primary_key_is_read_only() {
        let mut fresh = Record::new(topics(RecordConfig::default()));
        let err = fresh.set("id", 5i64).unwrap_err();
        assert!(matches!(
            err,
            RecordError::ReadOnlyAttribute { ref attribute, .. } if attribute == "id"
        ));
        assert_eq!(fresh.get("id").unwrap(), Value::Null);

        let mut topic = first_topic(RecordConfig::default());
        assert!(topic.assign([("id", 99i64)]).is_err());
        assert_eq!(topic.get("id").unwrap(), Value::Integer(1));
        assert_eq!(topic.id(), Some(1));
        assert!(!topic.has_changes());
    }

    #[test]
    fn test_float_changes_compare_exactly() {
        let schema = Arc::new(Schema::new(
            "scores",
            vec![Column::new("id", DataType::Integer), Column::new("value", DataType::Float)],
        ));
        let state = RecordState::new("scores", Some(1), json!({ "value": 0.3 }));
        let mut score = Record::from_state(schema, &state).unwrap();

        score.set("value", 0.1 + 0.2).unwrap();
        assert!(score.attribute_changed("value"));

        score.set("value", 0.3).unwrap();
        assert!(!score.has_changes());

        score.set("value", 2.0).unwrap();
        score.mark_persisted(1).unwrap();
        score.set("value", 2i64).unwrap();
        assert_eq!(score.changed(), vec!["value"]);
    }

    #[test]
    fn test_frozen_guards_every_mutation() {
        let mut topic = first_topic(RecordConfig::default());
        let state = topic.state();
        topic.freeze();

        assert!(topic.set("author_name", "Aaron").unwrap_err().is_frozen());
        assert!(topic.restore_attribute("author_name").unwrap_err().is_frozen());
        assert!(topic.detach_attributes().unwrap_err().is_frozen());
        assert!(topic.reload(&state).unwrap_err().is_frozen());
        assert!(topic.mark_persisted(2).unwrap_err().is_frozen());

        assert_eq!(topic.get("author_name").unwrap(), Value::from("David"));
        assert!(!topic.has_changes());
        assert!(topic.is_frozen());
    }

    #[test]
    fn test_dirty_tracking_queries() {
        let mut topic = first_topic(RecordConfig::default());
        topic.set("author_name", "Aaron").unwrap();

        assert_eq!(topic.changed(), vec!["author_name"]);
        assert!(topic.attribute_changed("author_name"));
        assert_eq!(topic.attribute_was("author_name").unwrap(), Value::from("David"));
        assert_eq!(topic.attribute_was("title").unwrap(), Value::from("The First Topic"));

        topic.restore_attribute("author_name").unwrap();
        assert!(!topic.has_changes());
        assert_eq!(topic.get("author_name").unwrap(), Value::from("David"));
    }

    #[test]
    fn test_duplicate_clears_primary_key_attribute() {
        let topic = first_topic(RecordConfig::default());
        let duped = topic.duplicate();

        assert_eq!(duped.get("id").unwrap(), Value::Null);
        assert_eq!(topic.get("id").unwrap(), Value::Integer(1));
        assert!(duped.changes().is_empty());
    }

    #[test]
    fn test_duplicate_keeps_timestamps_by_default() {
        let topic = first_topic(RecordConfig::default());
        let duped = topic.duplicate();
        let written = Utc.with_ymd_and_hms(2003, 7, 16, 15, 28, 11).unwrap();

        assert_eq!(duped.get("updated_at").unwrap(), Value::Timestamp(written));
    }

    #[test]
    fn test_duplicate_can_reset_timestamps() {
        let mut topic = first_topic(RecordConfig::new().reset_timestamps_on_duplicate(true));
        topic.set("updated_at", Utc::now()).unwrap();
        topic.set("author_name", "Aaron").unwrap();

        let duped = topic.duplicate();
        assert_eq!(duped.get("updated_at").unwrap(), Value::Null);
        assert_eq!(duped.changed(), vec!["author_name"]);
        assert!(topic.get("updated_at").unwrap().as_timestamp().is_some());
    }

    #[test]
    fn test_mark_persisted_sets_new_baseline() {
        let mut topic = Record::new(topics(RecordConfig::default()));
        topic.set("title", "Fresh").unwrap();
        topic.set("replies_count", 0i64).unwrap();
        assert!(topic.has_changes());

        topic.mark_persisted(42).unwrap();
        assert!(topic.is_persisted());
        assert_eq!(topic.id(), Some(42));
        assert_eq!(topic.get("id").unwrap(), Value::Integer(42));
        assert!(!topic.has_changes());
    }

    #[test]
    fn test_state_round_trip() {
        let topic = first_topic(RecordConfig::default());
        let state = topic.state();

        assert_eq!(state.id, Some(1));
        assert!(state.fields_object().unwrap().get("id").is_none());

        let reloaded = Record::from_state(Arc::clone(topic.schema()), &state).unwrap();
        assert_eq!(reloaded.attributes(), topic.attributes());
    }
}
