use crate::config::schema::{MigrationManifest, ValidationError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// A manifest that could not be loaded, with the file it came from when known.
#[derive(Debug)]
pub struct ConfigError {
    pub path: Option<PathBuf>,
    pub kind: ConfigErrorKind,
}

#[derive(Debug)]
pub enum ConfigErrorKind {
    Read(std::io::Error),
    Parse(toml_edit::de::Error),
    Invalid(ValidationError),
}

impl ConfigError {
    fn at(mut self, path: &Path) -> Self {
        self.path.get_or_insert_with(|| path.to_path_buf());
        self
    }

    /// The collected validation issues, if the manifest parsed but was rejected.
    pub fn validation(&self) -> Option<&ValidationError> {
        match &self.kind {
            ConfigErrorKind::Invalid(source) => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigErrorKind> for ConfigError {
    fn from(kind: ConfigErrorKind) -> Self {
        Self { path: None, kind }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.kind {
            ConfigErrorKind::Read(_) => "cannot read manifest",
            ConfigErrorKind::Parse(_) => "manifest is not valid TOML",
            ConfigErrorKind::Invalid(_) => "invalid manifest",
        };
        match &self.path {
            Some(path) => write!(f, "{what} {}: ", path.display())?,
            None => write!(f, "{what}: ")?,
        }
        match &self.kind {
            ConfigErrorKind::Read(source) => write!(f, "{source}"),
            ConfigErrorKind::Parse(source) => write!(f, "{source}"),
            ConfigErrorKind::Invalid(source) => write!(f, "{source}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ConfigErrorKind::Read(source) => Some(source),
            ConfigErrorKind::Parse(source) => Some(source),
            ConfigErrorKind::Invalid(source) => Some(source),
        }
    }
}

/// Parse and validate a manifest held in memory.
pub fn load_from_str(input: &str) -> Result<MigrationManifest, ConfigError> {
    let manifest: MigrationManifest =
        toml_edit::de::from_str(input).map_err(ConfigErrorKind::Parse)?;
    manifest.validate().map_err(ConfigErrorKind::Invalid)?;
    Ok(manifest)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<MigrationManifest, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .map_err(|source| ConfigError::from(ConfigErrorKind::Read(source)).at(path))?;
    load_from_str(&contents).map_err(|error| error.at(path))
}
