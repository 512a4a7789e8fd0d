//! Error taxonomy and the tagged outcome returned by persistence operations.
//!
//! Persistence never fails loudly: public consent operations always produce a
//! usable value and report what happened through [`Status`].

use std::path::PathBuf;

use thiserror::Error;

/// Failure talking to a persistent store or cookie backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No persistent storage in this environment (sandboxed frame, SSR, ...)
    #[error("storage unavailable")]
    Unavailable,

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl PartialEq for StorageError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Unavailable, Self::Unavailable) => true,
            (Self::Backend(a), Self::Backend(b)) => a == b,
            (Self::Serialize(a), Self::Serialize(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

/// Errors that can occur while loading platform configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {origin}: {source}")]
    Parse {
        origin: String,
        source: toml::de::Error,
    },
}

/// Why a read fell back to defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Nothing was stored
    Missing,
    /// Stored data was malformed and has been purged
    Corrupt,
    /// Stored decision was past its expiry and has been purged
    Expired,
}

#[derive(Debug, PartialEq)]
pub enum Status {
    Ok,
    Recovered(Recovery),
    /// The backend failed; the value is still usable but was not persisted
    /// (writes) or could not be read (reads).
    Failed(StorageError),
}

/// A value plus how it was obtained.
#[derive(Debug, PartialEq)]
pub struct Outcome<T> {
    pub value: T,
    pub status: Status,
}

impl<T> Outcome<T> {
    pub fn ok(value: T) -> Self {
        Self {
            value,
            status: Status::Ok,
        }
    }

    pub fn recovered(value: T, recovery: Recovery) -> Self {
        Self {
            value,
            status: Status::Recovered(recovery),
        }
    }

    pub fn failed(value: T, error: StorageError) -> Self {
        Self {
            value,
            status: Status::Failed(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self.status, Status::Ok)
    }

    pub fn into_value(self) -> T {
        self.value
    }
}
