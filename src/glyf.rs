//! The `glyf` table contains the outlines of all glyphs. Subsetting it takes
//! two steps:
//! 1. We form the glyph closure. Composite glyphs reference other glyphs as
//!    their components, so if glyph 1 is requested and references glyph 2,
//!    both of them have to be kept.
//! 2. We copy the descriptions of all kept glyphs into a new `glyf` table,
//!    in ascending glyph order, and build a matching `loca` table. Glyph IDs
//!    never change: dropped glyphs simply become empty.

use super::*;
use std::collections::VecDeque;
use std::ops::Range;

const ARG_1_AND_2_ARE_WORDS: u16 = 0x0001;
const WE_HAVE_A_SCALE: u16 = 0x0008;
const MORE_COMPONENTS: u16 = 0x0020;
const WE_HAVE_AN_X_AND_Y_SCALE: u16 = 0x0040;
const WE_HAVE_A_TWO_BY_TWO: u16 = 0x0080;

/// Glyphs known to be needed, plus those not yet checked for components.
struct Closure {
    used: FxHashSet<u16>,
    pending: VecDeque<u16>,
}

impl Closure {
    fn insert(&mut self, glyph: u16) {
        if self.used.insert(glyph) {
            self.pending.push_back(glyph);
        }
    }
}

/// Form the closure of the requested glyphs under composite references.
///
/// The result always contains the `.notdef` glyph. Requested glyphs that
/// don't exist in the font are ignored.
pub(crate) fn discover<S: FontSource>(
    source: &mut S,
    face: &Face,
    loca: &LocaTable,
    requested: &[u16],
) -> Result<FxHashSet<u16>> {
    let glyf = face.expect_table(Tag::GLYF)?;
    let num_glyphs = loca.num_glyphs();

    let mut closure = Closure { used: FxHashSet::default(), pending: VecDeque::new() };
    for &glyph in requested {
        if usize::from(glyph) < num_glyphs {
            closure.insert(glyph);
        } else {
            log::warn!(
                "{}: ignoring glyph {glyph}, the font only has {num_glyphs} glyphs",
                face.name()
            );
        }
    }

    // We always include the .notdef glyph.
    closure.insert(0);

    while let Some(glyph) = closure.pending.pop_front() {
        for component in components(source, face, glyf, loca, glyph)? {
            if usize::from(component) >= num_glyphs {
                return Err(face.error(FormatError::MalformedGlyph(glyph)));
            }

            log::trace!("{}: glyph {glyph} uses glyph {component}", face.name());
            closure.insert(component);
        }
    }

    log::debug!(
        "{}: {} requested glyphs need {} glyphs",
        face.name(),
        requested.len(),
        closure.used.len()
    );

    Ok(closure.used)
}

/// The glyph IDs referenced by a glyph's components.
///
/// Parsing stays within the glyph's own bytes, so a composite glyph that
/// keeps announcing more components runs out of data and fails instead of
/// scanning forever.
fn components<S: FontSource>(
    source: &mut S,
    face: &Face,
    glyf: TableRecord,
    loca: &LocaTable,
    glyph: u16,
) -> Result<Vec<u16>> {
    let data = read_glyph(source, face, glyf, loca, glyph)?;
    if data.is_empty() {
        return Ok(vec![]);
    }

    let malformed = || face.error(FormatError::MalformedGlyph(glyph));
    let mut r = Reader::new(&data);
    let num_contours = r.read::<i16>().ok_or_else(malformed)?;
    if num_contours >= 0 {
        return Ok(vec![]);
    }

    // Bounding box.
    r.skip_bytes(8).ok_or_else(malformed)?;

    let mut components = vec![];
    loop {
        let flags = r.read::<u16>().ok_or_else(malformed)?;
        components.push(r.read::<u16>().ok_or_else(malformed)?);

        if flags & MORE_COMPONENTS == 0 {
            break;
        }

        let mut skip = if flags & ARG_1_AND_2_ARE_WORDS != 0 { 4 } else { 2 };
        if flags & WE_HAVE_A_SCALE != 0 {
            skip += 2;
        } else if flags & WE_HAVE_AN_X_AND_Y_SCALE != 0 {
            skip += 4;
        } else if flags & WE_HAVE_A_TWO_BY_TWO != 0 {
            skip += 8;
        }

        r.skip_bytes(skip).ok_or_else(malformed)?;
    }

    Ok(components)
}

/// Read the description of a single glyph from the source `glyf` table.
fn read_glyph<S: FontSource>(
    source: &mut S,
    face: &Face,
    glyf: TableRecord,
    loca: &LocaTable,
    glyph: u16,
) -> Result<Vec<u8>> {
    let range = glyph_range(face, glyf, loca, glyph)?;
    if range.is_empty() {
        return Ok(vec![]);
    }

    source.seek(u64::from(glyf.offset) + u64::from(range.start))?;
    Ok(source.read_bytes(range.len())?)
}

/// The byte range of a glyph within the `glyf` table.
fn glyph_range(
    face: &Face,
    glyf: TableRecord,
    loca: &LocaTable,
    glyph: u16,
) -> Result<Range<u32>> {
    loca.glyph_range(glyph)
        .filter(|range| range.end <= glyf.length)
        .ok_or_else(|| face.error(FormatError::InvalidOffset))
}

/// The rebuilt `glyf` table together with its `loca` offsets.
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) struct SubsetGlyf {
    /// The glyph descriptions, padded to a multiple of four bytes.
    pub data: Vec<u8>,
    /// The length of the glyph descriptions without padding.
    pub len: usize,
    /// One offset per glyph of the original font plus a trailing sentinel.
    pub loca: Vec<u32>,
}

/// Copy the descriptions of the used glyphs into a new `glyf` table.
pub(crate) fn subset<S: FontSource>(
    source: &mut S,
    face: &Face,
    loca: &LocaTable,
    used: &FxHashSet<u16>,
) -> Result<SubsetGlyf> {
    let glyf = face.expect_table(Tag::GLYF)?;

    let mut glyphs: Vec<u16> = used.iter().copied().collect();
    glyphs.sort_unstable();

    let mut ranges = Vec::with_capacity(glyphs.len());
    for &glyph in &glyphs {
        ranges.push((usize::from(glyph), glyph_range(face, glyf, loca, glyph)?));
    }

    let len: usize = ranges.iter().map(|(_, range)| range.len()).sum();
    let mut data = vec![0; (len + 3) & !3];

    let mut sub_loca = Vec::with_capacity(loca.offsets.len());
    let mut active = ranges.into_iter().peekable();
    let mut cursor = 0;

    for index in 0..loca.num_glyphs() {
        sub_loca.push(cursor as u32);

        let Some((_, range)) = active.next_if(|(glyph, _)| *glyph == index) else {
            continue;
        };

        if !range.is_empty() {
            let end = cursor + range.len();
            source.seek(u64::from(glyf.offset) + u64::from(range.start))?;
            source.read_exact(&mut data[cursor..end])?;
            cursor = end;
        }
    }

    // Write the final offset.
    sub_loca.push(cursor as u32);

    Ok(SubsetGlyf { data, len, loca: sub_loca })
}
