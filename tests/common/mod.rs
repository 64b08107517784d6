#![allow(dead_code)]

//! Stand-in for the persistence layer: the `topics` table and its fixtures.

use std::sync::Arc;

use memorecord::{Column, DataType, Record, RecordConfig, RecordState, Schema};
use serde_json::json;

pub fn topics_schema() -> Arc<Schema> {
    topics_schema_with(RecordConfig::default())
}

pub fn topics_schema_with(config: RecordConfig) -> Arc<Schema> {
    Arc::new(Schema::with_config(
        "topics",
        vec![
            Column::new("id", DataType::Integer),
            Column::new("title", DataType::Text),
            Column::new("author_name", DataType::Text),
            Column::new("author_email_address", DataType::Text),
            Column::new("written_on", DataType::Timestamp),
            Column::new("approved", DataType::Boolean).not_null(),
            Column::new("replies_count", DataType::Integer).not_null(),
            Column::new("content", DataType::Text),
            Column::new("created_at", DataType::Timestamp),
            Column::new("updated_at", DataType::Timestamp),
        ],
        config,
    ))
}

pub fn first_topic_state() -> RecordState {
    RecordState::new(
        "topics",
        Some(1),
        json!({
            "title": "The First Topic",
            "author_name": "David",
            "author_email_address": "david@loudthinking.com",
            "written_on": "2003-07-16T15:28:11Z",
            "approved": false,
            "replies_count": 1,
            "content": "Have a nice day",
            "created_at": "2003-07-16T15:28:11Z",
            "updated_at": "2003-07-16T15:28:11Z",
        }),
    )
}

pub fn second_topic_state() -> RecordState {
    RecordState::new(
        "topics",
        Some(2),
        json!({
            "title": "The Second Topic of the day",
            "author_name": "Mary",
            "written_on": "2004-07-15T14:28:00Z",
            "approved": true,
            "replies_count": 0,
            "content": "Have a nice day",
        }),
    )
}

/// `Topic.first`: a persisted record with no pending changes.
pub fn first_topic() -> Record {
    Record::from_state(topics_schema(), &first_topic_state()).expect("first topic fixture loads")
}

pub fn second_topic() -> Record {
    Record::from_state(topics_schema(), &second_topic_state()).expect("second topic fixture loads")
}

pub fn all_topics() -> Vec<Record> {
    vec![first_topic(), second_topic(), Record::new(topics_schema())]
}
