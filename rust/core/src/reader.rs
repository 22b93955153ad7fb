// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bounds-checked binary cursor.
//!
//! Navigation files have no checksums or sync markers, so every read names
//! the field it is decoding. A short read then reports the byte offset,
//! field and area record instead of silently producing garbage.

use crate::error::{Error, Record, Result};
use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use nalgebra::Point3;
use std::io::{self, Cursor};

/// Byte order of multi-byte fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

/// Cursor over an in-memory byte slice
#[derive(Debug)]
pub struct ByteReader<'a> {
    cursor: Cursor<&'a [u8]>,
    endian: Endian,
    record: Option<usize>,
}

impl<'a> ByteReader<'a> {
    /// Little-endian cursor at the start of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(data),
            endian: Endian::Little,
            record: None,
        }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.cursor.position() as usize
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.cursor.get_ref().len().saturating_sub(self.position())
    }

    #[inline]
    pub fn endian(&self) -> Endian {
        self.endian
    }

    pub fn set_endian(&mut self, endian: Endian) {
        self.endian = endian;
    }

    /// Attach an area index to any error raised from here on
    pub fn set_record(&mut self, record: Option<usize>) {
        self.record = record;
    }

    fn eof(&self, offset: usize, field: &'static str) -> Error {
        Error::UnexpectedEof {
            offset,
            field,
            record: Record(self.record),
        }
    }

    /// Run one read; on failure rewind to where it started
    fn read<T>(
        &mut self,
        field: &'static str,
        op: impl FnOnce(&mut Cursor<&'a [u8]>) -> io::Result<T>,
    ) -> Result<T> {
        let start = self.cursor.position();
        let result = op(&mut self.cursor);
        result.map_err(|_| {
            // Reads from a slice only fail on a short buffer
            self.cursor.set_position(start);
            self.eof(start as usize, field)
        })
    }

    /// Take the next `len` bytes
    pub fn bytes(&mut self, len: usize, field: &'static str) -> Result<&'a [u8]> {
        let data: &'a [u8] = *self.cursor.get_ref();
        let start = self.position();
        let end = start.checked_add(len).ok_or_else(|| self.eof(start, field))?;
        let slice = data.get(start..end).ok_or_else(|| self.eof(start, field))?;
        self.cursor.set_position(end as u64);
        Ok(slice)
    }

    /// Read and discard `len` bytes
    pub fn skip(&mut self, len: usize, field: &'static str) -> Result<()> {
        self.bytes(len, field).map(|_| ())
    }

    pub fn u8(&mut self, field: &'static str) -> Result<u8> {
        self.read(field, |c| c.read_u8())
    }

    pub fn u16(&mut self, field: &'static str) -> Result<u16> {
        match self.endian {
            Endian::Little => self.read(field, |c| c.read_u16::<LittleEndian>()),
            Endian::Big => self.read(field, |c| c.read_u16::<BigEndian>()),
        }
    }

    pub fn u32(&mut self, field: &'static str) -> Result<u32> {
        match self.endian {
            Endian::Little => self.read(field, |c| c.read_u32::<LittleEndian>()),
            Endian::Big => self.read(field, |c| c.read_u32::<BigEndian>()),
        }
    }

    pub fn f32(&mut self, field: &'static str) -> Result<f32> {
        match self.endian {
            Endian::Little => self.read(field, |c| c.read_f32::<LittleEndian>()),
            Endian::Big => self.read(field, |c| c.read_f32::<BigEndian>()),
        }
    }

    /// Three consecutive `f32` components
    pub fn point(&mut self, field: &'static str) -> Result<Point3<f64>> {
        let x = self.f32(field)? as f64;
        let y = self.f32(field)? as f64;
        let z = self.f32(field)? as f64;
        Ok(Point3::new(x, y, z))
    }

    /// Check that `count` records of at least `record_size` bytes can still follow.
    ///
    /// Catches counts read from a drifted offset before they drive a huge
    /// allocation or a long skip loop.
    pub fn check_count(&self, count: usize, record_size: usize, field: &'static str) -> Result<usize> {
        match count.checked_mul(record_size) {
            Some(needed) if needed <= self.remaining() => Ok(count),
            _ => Err(Error::CountOverflow {
                offset: self.position(),
                field,
                count,
                record: Record(self.record),
            }),
        }
    }

    /// `u32` count prefix, validated against the remaining bytes
    pub fn count_u32(&mut self, record_size: usize, field: &'static str) -> Result<usize> {
        let count = self.u32(field)? as usize;
        self.check_count(count, record_size, field)
    }

    /// `u8` count prefix, validated against the remaining bytes
    pub fn count_u8(&mut self, record_size: usize, field: &'static str) -> Result<usize> {
        let count = self.u8(field)? as usize;
        self.check_count(count, record_size, field)
    }

    /// Skip a `u32`-counted list of `u32` ids
    pub fn skip_id_list(&mut self, field: &'static str) -> Result<usize> {
        let count = self.count_u32(4, field)?;
        self.skip(count * 4, field)?;
        Ok(count)
    }
}
