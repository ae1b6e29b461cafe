//! Error type for plot operations.

use std::io;
use std::path::PathBuf;

use luxplot_types::{Ref, RecordType};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A referenced record does not exist.
    #[error("no {kind} with ref {reference}")]
    NotFound { kind: RecordType, reference: Ref },

    /// A function, template or other named item does not exist.
    #[error("{0} not found")]
    Missing(String),

    #[error("{kind} {reference} already exists")]
    RefOccupied { kind: RecordType, reference: Ref },

    #[error("malformed reference expression '{0}'")]
    MalformedReference(String),

    #[error("malformed DMX address '{0}'")]
    MalformedAddress(String),

    #[error("malformed level '{0}'")]
    MalformedLevel(String),

    /// An import line did not have the shape its keyword requires.
    #[error("line {line}: {reason}: '{text}'")]
    MalformedLine {
        line: usize,
        text: String,
        reason: String,
    },

    #[error("unknown parameter type '{0}'")]
    UnknownParameter(String),

    #[error("no free block of {needed} addresses in universe {universe}")]
    UniverseFull { universe: Ref, needed: usize },

    #[error("unsupported import target '{0}'")]
    UnsupportedTarget(String),

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl Error {
    /// Not-found errors are reported and skipped by batch operations;
    /// everything else aborts the containing command.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. } | Error::Missing(_))
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        let missing = Error::NotFound {
            kind: RecordType::Fixture,
            reference: Ref::new(3),
        };
        assert!(missing.is_not_found());
        assert_eq!(missing.to_string(), "no fixture with ref 3");
        assert!(!Error::MalformedLevel("x".into()).is_not_found());
    }
}
