// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Sightline Core
//!
//! Location naming for level positions.
//!
//! - **Navigation meshes**: versioned binary `.nav` files, in either the
//!   legacy axis-aligned layout (version 16) or the polygon layout
//!   (version 31 and later)
//! - **Callouts**: JSON lists of named boxes and point seeds
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sightline_core::{load_callouts, NavMesh, Point3};
//!
//! let mut nav = NavMesh::load("maps/de_dust2/de_dust2.nav".as_ref())?;
//! let callouts = load_callouts("maps/de_dust2_places.json".as_ref())?;
//! nav.assign_callout_seeds(&callouts);
//!
//! let place = nav.place_name(&Point3::new(-500.0, 1200.0, 64.0));
//! ```

pub mod callout;
pub mod error;
pub mod nav;
pub mod reader;

pub use nalgebra::Point3;

pub use callout::{find_callout, load_callouts, parse_callouts, Callout, CalloutRegion};
pub use error::{Error, Result};
pub use nav::{NavArea, NavHeader, NavLayout, NavMesh, NAV_MAGIC};
pub use reader::{ByteReader, Endian};
