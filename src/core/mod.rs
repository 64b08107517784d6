pub mod error;
pub mod types;
pub mod value;

pub use error::{RecordError, Result};
pub use types::{Column, DataType, Schema};
pub use value::Value;
