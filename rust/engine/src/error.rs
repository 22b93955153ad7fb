// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for engine setup and explicit loads
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the engine.
///
/// Visibility queries never return these; a level that cannot be loaded
/// puts the manager in fallback mode instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Geometry error: {0}")]
    Geometry(#[from] sightline_geometry::Error),

    #[error("Navigation error: {0}")]
    Navigation(#[from] sightline_core::Error),

    #[error("No mesh file found for level '{0}'")]
    LevelNotFound(String),
}
