// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for navigation and callout parsing
pub type Result<T> = std::result::Result<T, Error>;

/// Area index attached to a format error, if the failure was inside an area record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record(pub Option<usize>);

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(index) => write!(f, " (area record {index})"),
            None => Ok(()),
        }
    }
}

/// Errors that can occur while parsing navigation meshes or callout files
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not a navigation mesh: magic {found:#010X}")]
    BadMagic { found: u32 },

    #[error("Unsupported navigation mesh version {0}")]
    UnsupportedVersion(u32),

    #[error("Unexpected end of file at byte {offset} reading {field}{record}")]
    UnexpectedEof {
        offset: usize,
        field: &'static str,
        record: Record,
    },

    #[error("Count {count} for {field} at byte {offset} exceeds remaining data{record}")]
    CountOverflow {
        offset: usize,
        field: &'static str,
        count: usize,
        record: Record,
    },

    #[error("{field} index {index} is outside a pool of {len}{record}")]
    InvalidReference {
        field: &'static str,
        index: usize,
        len: usize,
        record: Record,
    },

    #[error("Invalid callout file: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Area record the error occurred in, for format errors
    pub fn record(&self) -> Option<usize> {
        match self {
            Error::UnexpectedEof { record, .. }
            | Error::CountOverflow { record, .. }
            | Error::InvalidReference { record, .. } => record.0,
            _ => None,
        }
    }

    /// Name of the field being decoded, for format errors
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Error::UnexpectedEof { field, .. }
            | Error::CountOverflow { field, .. }
            | Error::InvalidReference { field, .. } => Some(field),
            _ => None,
        }
    }
}
