pub mod config;
pub mod error;
pub mod schema;
pub mod types;

pub use config::{load_config, AppConfig, ChainConfig, ChainEntry, FileConfig, LogFormat};
pub use error::{DroppedField, FieldViolation, ReconcileError};
pub use schema::{canonical_json_schema, CanonicalSchema, UrlRule};
pub use types::*;
