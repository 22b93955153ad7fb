// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Legacy (version 16) layout.
//!
//! ```text
//! analyzed      u8
//! place count   u16
//! place names   u16 length + bytes (optional trailing NUL)
//! area count    u32
//! per area:
//!   id u32, flags u32
//!   nw xyz f32, se xyz f32, ne z f32, sw z f32
//!   4 x connection list    (u32 count + u32 ids)
//!   hiding spots           (u8 count + 17-byte records)
//!   encounter paths        (u32 count + 17-byte header + u8-counted 8-byte spots)
//!   place id u16
//!   2 x ladder list        (u32 count + u32 ids)
//!   earliest occupier      2 x f32
//! ```
//!
//! Only ids, corners and place ids are kept. Everything else is walked
//! field by field to keep the cursor aligned.

use super::{NavArea, NavBody, NavLayout};
use crate::error::Result;
use crate::reader::ByteReader;
use nalgebra::Point3;
use smallvec::smallvec;

/// id, flags, 8 floats, 4 connection counts, hiding count, encounter count,
/// place id, 2 ladder counts, 2 floats
const MIN_AREA_SIZE: usize = 4 + 4 + 32 + 16 + 1 + 4 + 2 + 8 + 8;

/// id u32, flags u8, position 3 x f32
const HIDING_SPOT_SIZE: usize = 17;

/// from id, from dir, to id, to dir (u32 each), spot count u8
const ENCOUNTER_PATH_SIZE: usize = 17;

/// order id u32, t f32
const ENCOUNTER_SPOT_SIZE: usize = 8;

pub(super) fn decode(r: &mut ByteReader<'_>) -> Result<NavBody> {
    let analyzed = r.u8("analyzed flag")? != 0;

    let place_count = r.u16("place count")? as usize;
    let place_count = r.check_count(place_count, 2, "place count")?;
    let mut places = Vec::with_capacity(place_count);
    for _ in 0..place_count {
        let len = r.u16("place name length")? as usize;
        let mut raw = r.bytes(len, "place name")?;
        if let [rest @ .., 0] = raw {
            raw = rest;
        }
        places.push(String::from_utf8_lossy(raw).into_owned());
    }

    let area_count = r.count_u32(MIN_AREA_SIZE, "area count")?;
    let mut areas = Vec::with_capacity(area_count);
    for index in 0..area_count {
        r.set_record(Some(index));
        areas.push(decode_area(r)?);
    }
    r.set_record(None);

    Ok(NavBody {
        layout: NavLayout::Legacy { analyzed },
        places,
        areas,
    })
}

fn decode_area(r: &mut ByteReader<'_>) -> Result<NavArea> {
    let id = r.u32("area id")?;
    let flags = r.u32("area flags")?;

    let nw = r.point("north-west corner")?;
    let se = r.point("south-east corner")?;
    let ne_z = r.f32("north-east height")? as f64;
    let sw_z = r.f32("south-west height")? as f64;

    let corners = smallvec![
        nw,
        Point3::new(se.x, nw.y, ne_z),
        se,
        Point3::new(nw.x, se.y, sw_z),
    ];

    for _ in 0..4 {
        r.skip_id_list("connections")?;
    }

    let hiding_spots = r.count_u8(HIDING_SPOT_SIZE, "hiding spot count")?;
    r.skip(hiding_spots * HIDING_SPOT_SIZE, "hiding spots")?;

    let encounter_paths = r.count_u32(ENCOUNTER_PATH_SIZE, "encounter path count")?;
    for _ in 0..encounter_paths {
        r.skip(ENCOUNTER_PATH_SIZE - 1, "encounter path")?;
        let spots = r.count_u8(ENCOUNTER_SPOT_SIZE, "encounter spot count")?;
        r.skip(spots * ENCOUNTER_SPOT_SIZE, "encounter spots")?;
    }

    let place_id = r.u16("place id")?;

    for _ in 0..2 {
        r.skip_id_list("ladder connections")?;
    }
    r.skip(8, "earliest occupier")?;

    Ok(NavArea::new(id, flags, place_id, corners))
}
