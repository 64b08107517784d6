pub mod attributes;
pub mod changes;
pub mod mutability;
pub mod record;

pub use attributes::AttributeStore;
pub use changes::{AttributeChange, ChangeSet, ChangeTracker};
pub use mutability::Mutability;
pub use record::Record;
