//! Domain models with validation at construction
//!
//! All caller input is validated before it reaches SQL.
//! Invalid input returns ValidationError, not panic.

pub mod query;
pub mod record;
pub mod scope;
pub mod tags;
pub mod validation;

pub use query::{FieldValue, ListQuery, PayloadFilter, SortOrder, DEFAULT_LIMIT, MAX_LIMIT};
pub use record::{NewRecord, Record, RecordPatch};
pub use scope::OwnerScope;
pub use tags::Tags;
pub use validation::ValidationError;
