//! The `loca` table maps each glyph to its byte range in `glyf`. It comes in
//! a short format (offsets halved, stored as `u16`) and a long format
//! (`u32`), selected by a flag in the `head` table.

use super::*;
use std::ops::Range;

/// Where the loca format flag is read from, relative to the start of `head`.
const HEAD_LOCA_FORMAT_OFFSET: u32 = 51;

/// The format of a `loca` table.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum LocaFormat {
    /// Offsets divided by two, as `u16`.
    Short,
    /// Offsets as `u32`.
    Long,
}

/// A decoded `loca` table: one offset per glyph plus a trailing sentinel.
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) struct LocaTable {
    pub format: LocaFormat,
    pub offsets: Vec<u32>,
}

impl LocaTable {
    /// Read the `loca` table of a face, in the format announced by `head`.
    pub fn read<S: FontSource>(source: &mut S, face: &Face) -> Result<Self> {
        let head = face.expect_table(Tag::HEAD)?;
        if head.length < HEAD_LOCA_FORMAT_OFFSET + 2 {
            return Err(face.error(FormatError::InvalidOffset));
        }

        source.seek(u64::from(head.offset) + u64::from(HEAD_LOCA_FORMAT_OFFSET))?;
        let format = match source.read_u16()? {
            0 => LocaFormat::Short,
            _ => LocaFormat::Long,
        };

        let loca = face.expect_table(Tag::LOCA)?;
        source.seek(u64::from(loca.offset))?;
        let data = source.read_bytes(loca.length as usize)?;

        let offsets: Vec<u32> = match format {
            LocaFormat::Short => data
                .chunks_exact(2)
                .map(|c| u32::from(u16::from_be_bytes([c[0], c[1]])) * 2)
                .collect(),
            LocaFormat::Long => data
                .chunks_exact(4)
                .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
        };

        log::debug!(
            "{}: {:?} loca table with {} entries",
            face.name(),
            format,
            offsets.len()
        );

        Ok(Self { format, offsets })
    }

    /// The number of glyphs described by the table.
    pub fn num_glyphs(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// The byte range of a glyph in `glyf`.
    ///
    /// Returns `None` if the glyph is not in the table or its offsets are
    /// decreasing.
    pub fn glyph_range(&self, glyph: u16) -> Option<Range<u32>> {
        let i = usize::from(glyph);
        let start = *self.offsets.get(i)?;
        let end = *self.offsets.get(i + 1)?;
        (start <= end).then_some(start..end)
    }
}

/// Serialize loca offsets in the given format, unpadded.
///
/// Returns `None` if an offset doesn't fit the short format.
pub(crate) fn write(format: LocaFormat, offsets: &[u32]) -> Option<Vec<u8>> {
    let mut w = match format {
        LocaFormat::Short => Writer::with_capacity(offsets.len() * 2),
        LocaFormat::Long => Writer::with_capacity(offsets.len() * 4),
    };

    for &offset in offsets {
        match format {
            LocaFormat::Short => w.write::<u16>(u16::try_from(offset / 2).ok()?),
            LocaFormat::Long => w.write::<u32>(offset),
        }
    }

    Some(w.finish())
}
