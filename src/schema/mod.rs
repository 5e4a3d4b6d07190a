pub mod reconcile;

pub use reconcile::{normalize_values, CanonicalSchema, SchemaChange};
