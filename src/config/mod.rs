pub mod loader;
pub mod schema;

pub use loader::{load_from_path, load_from_str, ConfigError, ConfigErrorKind};
pub use schema::{FileEntry, Metadata, MigrationManifest, ValidationError, ValidationIssue};
