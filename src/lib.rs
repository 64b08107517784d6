// ============================================================================
// memorecord Library
// ============================================================================
//
// In-memory records with persistence identity, dirty tracking and two copy
// kinds: `Record::duplicate` (a new, unsaved, independent copy) and
// `Record::shallow_clone` (same identity, shared attribute storage).
//
// ============================================================================

pub mod config;
pub mod core;
pub mod persist;
pub mod record;

pub use crate::config::RecordConfig;
pub use crate::core::{Column, DataType, RecordError, Result, Schema, Value};
pub use crate::persist::RecordState;
pub use crate::record::{AttributeChange, AttributeStore, ChangeSet, ChangeTracker, Mutability, Record};
