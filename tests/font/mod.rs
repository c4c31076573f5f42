//! Builds small but well-formed TrueType fonts for the integration tests.

pub const ARG_1_AND_2_ARE_WORDS: u16 = 0x0001;
pub const ARGS_ARE_XY_VALUES: u16 = 0x0002;
pub const WE_HAVE_A_SCALE: u16 = 0x0008;
pub const MORE_COMPONENTS: u16 = 0x0020;

/// A simple glyph with a single on-curve point at `(x, 0)`.
pub fn simple(x: i16) -> Vec<u8> {
    let mut data = vec![];
    data.extend(1i16.to_be_bytes());
    data.extend(x.to_be_bytes());
    data.extend(0i16.to_be_bytes());
    data.extend(x.to_be_bytes());
    data.extend(0i16.to_be_bytes());
    // End points, instruction length, flags.
    data.extend(0u16.to_be_bytes());
    data.extend(0u16.to_be_bytes());
    data.push(0x01);
    data.extend(x.to_be_bytes());
    data.extend(0i16.to_be_bytes());
    // Keep the length even so that short loca offsets work.
    data.push(0);
    data
}

/// A composite glyph from `(flags, component)` records. Every record gets
/// byte-sized x/y arguments, or word-sized ones if the flags say so, plus a
/// scale if requested.
pub fn composite(parts: &[(u16, u16)]) -> Vec<u8> {
    let mut data = vec![];
    data.extend((-1i16).to_be_bytes());
    data.extend([0; 8]);
    for &(flags, glyph) in parts {
        data.extend((flags | ARGS_ARE_XY_VALUES).to_be_bytes());
        data.extend(glyph.to_be_bytes());
        if flags & ARG_1_AND_2_ARE_WORDS != 0 {
            data.extend([0; 4]);
        } else {
            data.extend([0; 2]);
        }
        if flags & WE_HAVE_A_SCALE != 0 {
            data.extend(0x4000u16.to_be_bytes());
        }
    }
    data
}

pub struct FontBuilder {
    glyphs: Vec<Vec<u8>>,
    long_loca: bool,
    skip: Vec<[u8; 4]>,
}

impl FontBuilder {
    pub fn new(glyphs: Vec<Vec<u8>>) -> Self {
        Self { glyphs, long_loca: false, skip: vec![] }
    }

    /// Use the long loca format.
    pub fn long_loca(mut self) -> Self {
        self.long_loca = true;
        self
    }

    /// Leave out a table.
    pub fn without(mut self, tag: &[u8; 4]) -> Self {
        self.skip.push(*tag);
        self
    }

    pub fn num_glyphs(&self) -> u16 {
        self.glyphs.len() as u16
    }

    /// The glyf table and the offset of each glyph, plus a sentinel.
    pub fn glyf(&self) -> (Vec<u8>, Vec<u32>) {
        let mut glyf = vec![];
        let mut offsets = vec![0];
        for glyph in &self.glyphs {
            glyf.extend(glyph);
            offsets.push(glyf.len() as u32);
        }
        (glyf, offsets)
    }

    pub fn build(&self) -> Vec<u8> {
        let num_glyphs = self.num_glyphs();
        let (glyf, offsets) = self.glyf();

        let mut loca = vec![];
        for offset in offsets {
            if self.long_loca {
                loca.extend(offset.to_be_bytes());
            } else {
                loca.extend(((offset / 2) as u16).to_be_bytes());
            }
        }

        let mut head = vec![0; 54];
        head[0..4].copy_from_slice(&0x00010000u32.to_be_bytes());
        head[12..16].copy_from_slice(&0x5F0F3CF5u32.to_be_bytes());
        head[18..20].copy_from_slice(&1000u16.to_be_bytes());
        head[50..52].copy_from_slice(&(self.long_loca as i16).to_be_bytes());

        let mut hhea = vec![0; 36];
        hhea[0..4].copy_from_slice(&0x00010000u32.to_be_bytes());
        hhea[4..6].copy_from_slice(&800i16.to_be_bytes());
        hhea[6..8].copy_from_slice(&(-200i16).to_be_bytes());
        hhea[34..36].copy_from_slice(&num_glyphs.to_be_bytes());

        let mut maxp = vec![];
        maxp.extend(0x00005000u32.to_be_bytes());
        maxp.extend(num_glyphs.to_be_bytes());

        let mut hmtx = vec![];
        for i in 0..num_glyphs {
            hmtx.extend((500 + i).to_be_bytes());
            hmtx.extend(0i16.to_be_bytes());
        }

        let tables: Vec<(&[u8; 4], Vec<u8>)> = vec![
            (b"OS/2", vec![0; 78]),
            (b"cmap", vec![0, 0, 0, 0]),
            (b"cvt ", vec![0, 10, 0, 20, 0, 30]),
            (b"fpgm", vec![0xB0, 0x01]),
            (b"glyf", glyf),
            (b"head", head),
            (b"hhea", hhea),
            (b"hmtx", hmtx),
            (b"loca", loca),
            (b"maxp", maxp),
            (b"name", vec![0, 0, 0, 0, 0, 6]),
            (b"post", post()),
            (b"prep", vec![0xB0, 0x02, 0x00]),
        ];

        assemble(tables.into_iter().filter(|(tag, _)| !self.skip.contains(*tag)).collect())
    }
}

fn post() -> Vec<u8> {
    let mut post = vec![0; 32];
    post[0..4].copy_from_slice(&0x00030000u32.to_be_bytes());
    post
}

/// Wrap a font into a collection with a single member.
pub fn collection(font: &[u8]) -> Vec<u8> {
    const HEADER: u32 = 16;

    let mut data = vec![];
    data.extend(b"ttcf");
    data.extend(0x00010000u32.to_be_bytes());
    data.extend(1u32.to_be_bytes());
    data.extend(HEADER.to_be_bytes());

    // Table offsets are relative to the start of the file.
    let mut font = font.to_vec();
    for k in 0..tags(&font).len() {
        let at = 12 + 16 * k + 8;
        let offset = u32::from_be_bytes(font[at..at + 4].try_into().unwrap());
        font[at..at + 4].copy_from_slice(&(offset + HEADER).to_be_bytes());
    }

    data.extend(font);
    data
}

/// Lay out a font with the given tables, sorted by tag.
pub fn assemble(tables: Vec<(&[u8; 4], Vec<u8>)>) -> Vec<u8> {
    let count = tables.len() as u16;
    let selector = if count == 0 { 0 } else { count.ilog2() as u16 };

    let mut data = vec![];
    data.extend(0x00010000u32.to_be_bytes());
    data.extend(count.to_be_bytes());
    data.extend(((1u16 << selector) * 16).to_be_bytes());
    data.extend(selector.to_be_bytes());
    data.extend((count * 16 - (1u16 << selector) * 16).to_be_bytes());

    let mut offset = 12 + 16 * tables.len();
    for (tag, table) in &tables {
        data.extend(*tag);
        data.extend(checksum(table).to_be_bytes());
        data.extend((offset as u32).to_be_bytes());
        data.extend((table.len() as u32).to_be_bytes());
        offset += (table.len() + 3) & !3;
    }

    for (_, table) in &tables {
        data.extend(table);
        while data.len() % 4 != 0 {
            data.push(0);
        }
    }

    data
}

pub fn checksum(data: &[u8]) -> u32 {
    let mut sum = 0u32;
    for chunk in data.chunks(4) {
        let mut bytes = [0; 4];
        bytes[..chunk.len()].copy_from_slice(chunk);
        sum = sum.wrapping_add(u32::from_be_bytes(bytes));
    }
    sum
}

/// A table of the font, by tag.
pub fn table<'a>(font: &'a [u8], tag: &[u8; 4]) -> Option<&'a [u8]> {
    let (_, _, offset, length) = record(font, tag)?;
    font.get(offset as usize..(offset + length) as usize)
}

/// The directory record of a table: tag, checksum, offset and length.
pub fn record(font: &[u8], tag: &[u8; 4]) -> Option<([u8; 4], u32, u32, u32)> {
    tags(font).into_iter().find(|r| &r.0 == tag)
}

/// All directory records, in directory order.
pub fn tags(font: &[u8]) -> Vec<([u8; 4], u32, u32, u32)> {
    let u32_at = |i: usize| u32::from_be_bytes(font[i..i + 4].try_into().unwrap());
    let count = u16::from_be_bytes([font[4], font[5]]) as usize;
    (0..count)
        .map(|k| {
            let base = 12 + 16 * k;
            let tag = font[base..base + 4].try_into().unwrap();
            (tag, u32_at(base + 4), u32_at(base + 8), u32_at(base + 12))
        })
        .collect()
}
