// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading level geometry
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid glTF document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid GLB container: {0}")]
    InvalidGlb(&'static str),

    #[error("Buffer {index} cannot be resolved: {reason}")]
    UnresolvedBuffer { index: usize, reason: String },

    #[error("Invalid base64 payload in buffer {index}: {source}")]
    Base64 {
        index: usize,
        #[source]
        source: base64::DecodeError,
    },

    #[error("{what} {index} is out of bounds: {reason}")]
    OutOfBounds {
        what: &'static str,
        index: usize,
        reason: String,
    },

    #[error("OBJ line {line}: {message}")]
    Obj { line: usize, message: String },

    #[error("Unsupported mesh format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn obj(line: usize, message: impl Into<String>) -> Self {
        Error::Obj {
            line,
            message: message.into(),
        }
    }
}
