use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("no line contains marker '{marker}'")]
    NotFound { marker: String },

    #[error("i/o error on {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
}

impl TemplateError {
    pub(crate) fn not_found(marker: &str) -> Self {
        Self::NotFound {
            marker: marker.to_string(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type TemplateResult<T> = Result<T, TemplateError>;
