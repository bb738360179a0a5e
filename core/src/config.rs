use std::path::{Path, PathBuf};

use crate::error::{Result, StoreError};

/// The active storage backend and its connection target.
///
/// One configuration value selects both: a `postgres://` URL picks the
/// client/server engine, a `sqlite:` URL the embedded file. The selection is
/// made once at process start; there is no runtime switching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    Sqlite { path: PathBuf },
    Postgres { url: String },
}

impl BackendConfig {
    /// Read `DATABASE_URL` once, falling back to an embedded database at
    /// `default_path` when the variable is unset or empty.
    pub fn from_env(default_path: &Path) -> Result<Self> {
        match std::env::var("DATABASE_URL") {
            Ok(url) if !url.trim().is_empty() => Self::from_url(url.trim()),
            _ => Ok(Self::Sqlite {
                path: default_path.to_path_buf(),
            }),
        }
    }

    /// Parse a connection URL into a backend selection.
    pub fn from_url(url: &str) -> Result<Self> {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Ok(Self::Postgres {
                url: url.to_string(),
            })
        } else if let Some(path) = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("sqlite:")) {
            Ok(Self::Sqlite {
                path: PathBuf::from(path),
            })
        } else {
            Err(StoreError::invalid(
                "database_url",
                format!("unsupported scheme in '{url}'"),
            ))
        }
    }
}
