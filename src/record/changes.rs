use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::Value;

/// The persisted value of an attribute and the value it holds now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeChange {
    pub old: Value,
    pub new: Value,
}

impl AttributeChange {
    pub fn new(old: Value, new: Value) -> Self {
        Self { old, new }
    }
}

/// Serialised form of a change: `[old, new]`.
#[derive(Serialize)]
struct ChangePair(serde_json::Value, serde_json::Value);

impl Serialize for AttributeChange {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ChangePair(self.old.to_json(), self.new.to_json()).serialize(serializer)
    }
}

/// Snapshot of a tracker, keyed by attribute name.
pub type ChangeSet = BTreeMap<String, AttributeChange>;

/// Dirty tracking relative to the persisted baseline.
///
/// The tracker keeps its own copy of the persisted values. `entries` holds
/// the changes recorded through this tracker; [`diff`](Self::diff) compares
/// any set of current values against the baseline, which also catches writes
/// that reached shared storage through another record.
///
/// Backed by persistent maps, so `copy_independent` is a constant-time
/// structural clone that never observes later writes to the original.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeTracker {
    baseline: im::HashMap<String, Value>,
    entries: im::HashMap<String, AttributeChange>,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// A clean tracker whose baseline is `values`.
    pub fn with_baseline(values: &BTreeMap<String, Value>) -> Self {
        let mut tracker = Self::new();
        tracker.rebase_all(values);
        tracker
    }

    /// Records that `name` went from `old` to `new`.
    ///
    /// The baseline is the persisted value when one is known, else the `old`
    /// of an existing entry, else `old`. Returning to the baseline drops the
    /// entry.
    pub fn record_change(&mut self, name: &str, old: Value, new: Value) {
        let baseline = match (self.baseline.get(name), self.entries.get(name)) {
            (Some(persisted), _) => persisted.clone(),
            (None, Some(change)) => change.old.clone(),
            (None, None) => old,
        };

        if new.same_as(&baseline) {
            self.entries.remove(name);
        } else {
            self.entries
                .insert(name.to_string(), AttributeChange::new(baseline, new));
        }
    }

    pub fn snapshot(&self) -> ChangeSet {
        self.entries
            .iter()
            .map(|(name, change)| (name.clone(), change.clone()))
            .collect()
    }

    /// Changes of `current` relative to the baseline.
    ///
    /// Names without a known baseline fall back to the recorded entries.
    pub fn diff(&self, current: &BTreeMap<String, Value>) -> ChangeSet {
        let mut changes: ChangeSet = self
            .entries
            .iter()
            .filter(|(name, _)| !self.baseline.contains_key(*name))
            .map(|(name, change)| (name.clone(), change.clone()))
            .collect();

        for (name, persisted) in self.baseline.iter() {
            let now = current.get(name).cloned().unwrap_or(Value::Null);
            if !now.same_as(persisted) {
                changes.insert(name.clone(), AttributeChange::new(persisted.clone(), now));
            }
        }
        changes
    }

    pub fn copy_independent(&self) -> Self {
        self.clone()
    }

    pub fn get(&self, name: &str) -> Option<&AttributeChange> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// The persisted value of `name`, if known.
    pub fn baseline(&self, name: &str) -> Option<&Value> {
        self.baseline
            .get(name)
            .or_else(|| self.entries.get(name).map(|change| &change.old))
    }

    /// Makes `value` the persisted value of `name` and drops its entry.
    pub fn rebase(&mut self, name: &str, value: Value) {
        self.baseline.insert(name.to_string(), value);
        self.entries.remove(name);
    }

    /// Makes `values` the whole baseline and drops every entry.
    pub fn rebase_all(&mut self, values: &BTreeMap<String, Value>) {
        self.baseline = values
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        self.entries.clear();
    }

    pub fn forget(&mut self, name: &str) -> Option<AttributeChange> {
        self.entries.remove(name)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
