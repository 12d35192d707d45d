use std::io;
use std::path::PathBuf;

use pds4_template::TemplateError;
use thiserror::Error;

use crate::info::SegmentKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,
    NotFound = 1,
    Configuration = 2,
    InvalidContent = 3,
    Io = 4,
    Unsupported = 5,
    InvalidArguments = 6,
}

impl ExitCode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Success),
            1 => Some(Self::NotFound),
            2 => Some(Self::Configuration),
            3 => Some(Self::InvalidContent),
            4 => Some(Self::Io),
            5 => Some(Self::Unsupported),
            6 => Some(Self::InvalidArguments),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum LabelError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("segment kind {kind} has no configured sub-template")]
    UnconfiguredSegment { kind: SegmentKind },

    #[error("{field} holds '{value}', expected an integer")]
    MalformedField { field: String, value: String },

    #[error("{bits}-bit samples are not supported (only {supported}-bit data can be labelled)")]
    UnsupportedSampleWidth { bits: u8, supported: u8 },

    #[error("byte offset overflowed while placing segment kind {kind}")]
    OffsetOverflow { kind: SegmentKind },

    #[error("invalid rename pattern: {0}")]
    InvalidRenamePattern(String),

    #[error("invalid collection label: {0}")]
    InvalidCollection(String),

    #[error("invalid file info {}: {source}", .path.display())]
    InvalidInfo {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("i/o error on {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
}

impl LabelError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(field: &str, value: &str) -> Self {
        Self::MalformedField {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Template(TemplateError::NotFound { .. }) => ExitCode::NotFound,
            Self::Template(TemplateError::Io { .. }) | Self::Io { .. } => ExitCode::Io,
            Self::UnconfiguredSegment { .. } => ExitCode::Configuration,
            Self::MalformedField { .. }
            | Self::OffsetOverflow { .. }
            | Self::InvalidCollection(_)
            | Self::InvalidInfo { .. } => ExitCode::InvalidContent,
            Self::UnsupportedSampleWidth { .. } => ExitCode::Unsupported,
            Self::InvalidRenamePattern(_) => ExitCode::InvalidArguments,
        }
    }
}

pub type LabelResult<T> = Result<T, LabelError>;
