//! Boundary with the persistence layer.
//!
//! Storage itself lives outside this crate; records cross the boundary as
//! [`RecordState`] values.

pub mod state;

pub use state::RecordState;
