//! Error types for YAML parsing with source locations.

use crate::SourceInfo;
use thiserror::Error;

/// Result type alias for smartyaml-parser operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during YAML parsing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// YAML syntax error reported by the scanner
    #[error("YAML parse error: {message}")]
    ParseError {
        message: String,
        location: Option<SourceInfo>,
    },

    /// An alias refers to an anchor that is neither local nor shared
    #[error("unknown anchor '{name}'")]
    UnknownAnchor {
        name: String,
        location: Option<SourceInfo>,
    },

    /// Event stream did not describe a well-formed tree
    #[error("invalid YAML structure: {message}")]
    InvalidStructure {
        message: String,
        location: Option<SourceInfo>,
    },
}

impl Error {
    /// Source location of the failure, when known.
    pub fn location(&self) -> Option<&SourceInfo> {
        match self {
            Error::ParseError { location, .. }
            | Error::UnknownAnchor { location, .. }
            | Error::InvalidStructure { location, .. } => location.as_ref(),
        }
    }

    /// Attach a filename to the error location.
    pub(crate) fn in_file(mut self, filename: Option<&str>) -> Self {
        let Some(filename) = filename else {
            return self;
        };
        match &mut self {
            Error::ParseError { location, .. }
            | Error::UnknownAnchor { location, .. }
            | Error::InvalidStructure { location, .. } => {
                let info = location.take().unwrap_or_default();
                *location = Some(info.with_file(filename));
            }
        }
        self
    }
}

impl From<yaml_rust2::ScanError> for Error {
    fn from(err: yaml_rust2::ScanError) -> Self {
        let marker = err.marker();
        Error::ParseError {
            message: err.info().to_string(),
            location: Some(SourceInfo::from_marker(marker, 0)),
        }
    }
}
