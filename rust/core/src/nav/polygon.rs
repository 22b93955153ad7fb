// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polygon (version 31+) layout.
//!
//! ```text
//! corner count   u32, then 3 x f32 per corner
//! polygon count  u32, then per polygon:
//!                  u8 corner count, u32 corner indices, u32 trailer (v35+)
//! global field   u32 (v32+)
//! global field   u32 (v35+)
//! area count     u32
//! per area (area 0 little-endian, every later area big-endian):
//!   id u32, flags u32, hull index u32, polygon index u32, reserved u32
//!   padding u8
//!   per polygon edge: u32 count + u32 connected area ids
//!   gap 2 bytes
//!   ladders above, ladders below (u32 count + u32 ids)
//!   place id u16
//!   earliest occupier 2 x f32
//!   area 0 only: 4 bytes of padding (may be cut short at EOF)
//! ```
//!
//! Pools are always little-endian. The byte order flip between area 0 and
//! the rest is how real files are laid out and must not be normalized.

use super::{NavArea, NavBody, NavLayout};
use crate::error::{Error, Record, Result};
use crate::reader::{ByteReader, Endian};
use nalgebra::Point3;
use smallvec::SmallVec;

/// Version adding the per-polygon trailer and the second global field
const TRAILER_VERSION: u32 = 35;

/// Version adding the first global field
const GLOBAL_FIELD_VERSION: u32 = 32;

/// Fixed fields, padding, gap, ladder counts, place id, occupier times
const MIN_AREA_SIZE: usize = 20 + 1 + 2 + 8 + 2 + 8;

const FIRST_AREA_TRAILER: usize = 4;

/// Byte order of the area at `index`
#[inline]
fn area_endian(index: usize) -> Endian {
    if index == 0 {
        Endian::Little
    } else {
        Endian::Big
    }
}

pub(super) fn decode(r: &mut ByteReader<'_>, version: u32) -> Result<NavBody> {
    let corner_count = r.count_u32(12, "corner count")?;
    let corners = (0..corner_count)
        .map(|_| r.point("corner"))
        .collect::<Result<Vec<_>>>()?;

    let polygon_count = r.count_u32(1, "polygon count")?;
    let mut polygons: Vec<SmallVec<[u32; 8]>> = Vec::with_capacity(polygon_count);
    for _ in 0..polygon_count {
        let n = r.count_u8(4, "polygon corner count")?;
        let indices = (0..n)
            .map(|_| r.u32("polygon corner index"))
            .collect::<Result<SmallVec<_>>>()?;
        if version >= TRAILER_VERSION {
            r.skip(4, "polygon trailer")?;
        }
        polygons.push(indices);
    }

    if version >= GLOBAL_FIELD_VERSION {
        r.skip(4, "global field")?;
    }
    if version >= TRAILER_VERSION {
        r.skip(4, "global field")?;
    }

    let area_count = r.count_u32(MIN_AREA_SIZE, "area count")?;
    let mut areas = Vec::with_capacity(area_count);
    for index in 0..area_count {
        r.set_record(Some(index));
        r.set_endian(area_endian(index));
        areas.push(decode_area(r, index, &corners, &polygons)?);
    }
    r.set_record(None);
    r.set_endian(Endian::Little);

    Ok(NavBody {
        layout: NavLayout::Polygon {
            corner_count,
            polygon_count,
        },
        places: Vec::new(),
        areas,
    })
}

fn decode_area(
    r: &mut ByteReader<'_>,
    index: usize,
    corner_pool: &[Point3<f64>],
    polygons: &[SmallVec<[u32; 8]>],
) -> Result<NavArea> {
    let id = r.u32("area id")?;
    let flags = r.u32("area flags")?;
    r.skip(4, "hull index")?;
    let polygon_index = r.u32("polygon index")? as usize;
    r.skip(4, "area reserved")?;
    r.skip(1, "area padding")?;

    let polygon = polygons.get(polygon_index).ok_or(Error::InvalidReference {
        field: "polygon",
        index: polygon_index,
        len: polygons.len(),
        record: Record(Some(index)),
    })?;
    let corners = polygon
        .iter()
        .map(|&c| {
            corner_pool.get(c as usize).copied().ok_or(Error::InvalidReference {
                field: "corner",
                index: c as usize,
                len: corner_pool.len(),
                record: Record(Some(index)),
            })
        })
        .collect::<Result<SmallVec<[Point3<f64>; 4]>>>()?;

    // One connection list per boundary edge
    for _ in 0..corners.len() {
        r.skip_id_list("edge connections")?;
    }

    r.skip(2, "area gap")?;
    r.skip_id_list("ladders above")?;
    r.skip_id_list("ladders below")?;

    let place_id = r.u16("place id")?;
    r.skip(8, "earliest occupier")?;

    if index == 0 {
        let trailer = r.remaining().min(FIRST_AREA_TRAILER);
        r.skip(trailer, "first area trailer")?;
    }

    Ok(NavArea::new(id, flags, place_id, corners))
}
