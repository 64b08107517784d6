/// Per-table record configuration
///
/// Builder-style, like the rest of the public configuration types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordConfig {
    /// Name of the primary-key attribute
    pub primary_key: String,

    /// Attributes maintained as creation/update timestamps
    pub timestamp_columns: Vec<String>,

    /// Reset timestamp attributes when a record is duplicated
    pub reset_timestamps_on_duplicate: bool,
}

impl RecordConfig {
    pub fn new() -> Self {
        Self {
            primary_key: "id".to_string(),
            timestamp_columns: vec!["created_at".to_string(), "updated_at".to_string()],
            reset_timestamps_on_duplicate: false,
        }
    }

    /// Set the primary-key attribute name
    pub fn primary_key(mut self, name: &str) -> Self {
        self.primary_key = name.to_string();
        self
    }

    /// Set the timestamp attribute names
    pub fn timestamp_columns<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.timestamp_columns = names.into_iter().map(Into::into).collect();
        self
    }

    /// Clear timestamp attributes on `duplicate`
    pub fn reset_timestamps_on_duplicate(mut self, reset: bool) -> Self {
        self.reset_timestamps_on_duplicate = reset;
        self
    }
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RecordConfig::default();
        assert_eq!(config.primary_key, "id");
        assert_eq!(config.timestamp_columns, vec!["created_at", "updated_at"]);
        assert!(!config.reset_timestamps_on_duplicate);
    }

    #[test]
    fn test_builder() {
        let config = RecordConfig::new()
            .primary_key("topic_id")
            .timestamp_columns(["written_on"])
            .reset_timestamps_on_duplicate(true);

        assert_eq!(config.primary_key, "topic_id");
        assert_eq!(config.timestamp_columns, vec!["written_on"]);
        assert!(config.reset_timestamps_on_duplicate);
    }
}
