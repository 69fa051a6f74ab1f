use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write config {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// A single rejected field of a configuration input
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every field error found while building a configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub struct ConfigErrors(pub Vec<FieldError>);

impl ConfigErrors {
    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|e| e.field)
    }
}

impl fmt::Display for ConfigErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid configuration")?;
        for (i, e) in self.0.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{e}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to create output directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("failed to encode session metadata: {0}")]
    Encode(#[from] serde_json::Error),
}
