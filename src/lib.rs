/*!
Extracts minimal, standalone TrueType fonts that contain only the glyphs a
document actually uses.

# Example
In the example below, we keep only the glyphs with IDs 68, 69, 70, which
correspond to the letters 'a', 'b' and 'c' in many fonts.

```no_run
use ttf_subset::{subset, FileSource, Profile};

# fn main() -> Result<(), Box<dyn std::error::Error>> {
let mut source = FileSource::open("fonts/NotoSans-Regular.ttf")?;

// Keep only three glyphs and the tables required for embedding the font
// in a PDF file.
let glyphs = &[68, 69, 70];
let sub = subset(&mut source, 0, Profile::pdf(glyphs))?;

std::fs::write("target/Noto-Small.ttf", sub)?;
# Ok(())
# }
```

Glyphs are never renumbered. The subsetter only drops the outlines of unused
glyphs, so glyph IDs that were valid for the original font stay valid for
the subset. Composite glyphs keep the glyphs they are built from.
*/

#![deny(unsafe_code)]
#![deny(missing_docs)]

mod directory;
mod glyf;
mod loca;
mod source;
mod stream;

pub use crate::directory::directory_offset;
pub use crate::source::{FileSource, FontSource, MemorySource};

use crate::directory::Face;
use crate::loca::LocaTable;
use crate::stream::{Reader, Writeable, Writer};
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt::{self, Debug, Display, Formatter};
use std::io;

/// Subset a TrueType font so that it only contains the given glyphs.
///
/// - `directory_offset` is the position of the face's table directory. It is
///   0 for a bare font, see [`directory_offset`] for font collections.
/// - The `profile` lists the glyphs to keep and which tables to carry over.
///
/// The source is reopened first and closed again on every exit path. A
/// failure to close it is logged but never reported.
pub fn subset<S: FontSource>(
    source: &mut S,
    directory_offset: u32,
    profile: Profile,
) -> Result<Vec<u8>> {
    let result = source
        .reopen()
        .map_err(Error::from)
        .and_then(|()| run(source, directory_offset, profile));

    if let Err(err) = source.close() {
        log::warn!("{}: failed to close font source: {err}", source.name());
    }

    result
}

/// Subset a font held in memory.
///
/// The `index` is only relevant if the data contains a font collection
/// (`.ttc` file). Otherwise, it should be 0.
pub fn subset_bytes(data: &[u8], index: u32, profile: Profile) -> Result<Vec<u8>> {
    let mut source = MemorySource::new(data);
    let offset = directory_offset(&mut source, index)?;
    subset(&mut source, offset, profile)
}

fn run<S: FontSource>(
    source: &mut S,
    directory_offset: u32,
    profile: Profile,
) -> Result<Vec<u8>> {
    let face = Face::parse(source, directory_offset)?;
    let loca = LocaTable::read(source, &face)?;
    let used = glyf::discover(source, &face, &loca, profile.glyphs)?;
    let sub_glyf = glyf::subset(source, &face, &loca, &used)?;
    let sub_loca = loca::write(loca.format, &sub_glyf.loca)
        .ok_or_else(|| face.error(FormatError::InvalidOffset))?;
    let sub_loca = Table::padded(sub_loca);
    let sub_glyf = Table { data: sub_glyf.data, len: sub_glyf.len };
    let font = construct(source, &face, profile.tables(), &sub_glyf, &sub_loca)?;
    log::debug!("{}: subset font has {} bytes", face.name(), font.len());
    Ok(font)
}

/// Which glyphs and tables end up in a subset.
#[derive(Debug, Copy, Clone)]
pub struct Profile<'a> {
    glyphs: &'a [u16],
    cmap: bool,
    extras: bool,
}

impl<'a> Profile<'a> {
    /// Keep the given glyphs and only the tables needed to embed the font in
    /// a PDF file.
    pub fn pdf(glyphs: &'a [u16]) -> Self {
        Self { glyphs, cmap: false, extras: false }
    }

    /// Whether to also keep the `cmap` table.
    pub fn with_cmap(self, cmap: bool) -> Self {
        Self { cmap, ..self }
    }

    /// Whether to also keep the `cmap`, `OS/2` and `name` tables.
    pub fn with_extras(self, extras: bool) -> Self {
        Self { extras, ..self }
    }

    /// The requested glyphs.
    pub fn glyphs(&self) -> &'a [u16] {
        self.glyphs
    }

    /// The tables to write, in output order.
    fn tables(&self) -> &'static [Tag] {
        if self.extras {
            TABLES_EXTRAS
        } else if self.cmap {
            TABLES_CMAP
        } else {
            TABLES_SIMPLE
        }
    }
}

const TABLES_SIMPLE: &[Tag] = &[
    Tag::CVT,
    Tag::FPGM,
    Tag::GLYF,
    Tag::HEAD,
    Tag::HHEA,
    Tag::HMTX,
    Tag::LOCA,
    Tag::MAXP,
    Tag::PREP,
];

const TABLES_CMAP: &[Tag] = &[
    Tag::CMAP,
    Tag::CVT,
    Tag::FPGM,
    Tag::GLYF,
    Tag::HEAD,
    Tag::HHEA,
    Tag::HMTX,
    Tag::LOCA,
    Tag::MAXP,
    Tag::PREP,
];

const TABLES_EXTRAS: &[Tag] = &[
    Tag::OS2,
    Tag::CMAP,
    Tag::CVT,
    Tag::FPGM,
    Tag::GLYF,
    Tag::HEAD,
    Tag::HHEA,
    Tag::HMTX,
    Tag::LOCA,
    Tag::MAXP,
    Tag::NAME,
    Tag::PREP,
];

/// Largest power of two not above the index, as an exponent.
const ENTRY_SELECTORS: [u16; 21] =
    [0, 0, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 3, 3, 3, 3, 4, 4, 4, 4, 4];

fn entry_selector(count: u16) -> u16 {
    ENTRY_SELECTORS
        .get(usize::from(count))
        .copied()
        .unwrap_or_else(|| count.ilog2() as u16)
}

/// A rebuilt table.
struct Table {
    /// The table data, padded to a multiple of four bytes.
    data: Vec<u8>,
    /// The length without padding.
    len: usize,
}

impl Table {
    fn padded(mut data: Vec<u8>) -> Self {
        let len = data.len();
        data.resize((len + 3) & !3, 0);
        Self { data, len }
    }
}

/// Construct a brand new font from the rebuilt `glyf` and `loca` tables and
/// the other listed tables of the original face.
fn construct<S: FontSource>(
    source: &mut S,
    face: &Face,
    tables: &[Tag],
    glyf: &Table,
    loca: &Table,
) -> Result<Vec<u8>> {
    // Optional tables the font doesn't have are skipped.
    let records: Vec<TableRecord> =
        tables.iter().filter_map(|&tag| face.table(tag)).collect();

    let count = records.len() as u16;
    let mut size = 12 + 16 * records.len();
    for record in &records {
        size += match record.tag {
            Tag::GLYF => glyf.data.len(),
            Tag::LOCA => loca.data.len(),
            _ => (record.length as usize + 3) & !3,
        };
    }

    let mut w = Writer::with_capacity(size);
    w.write::<u32>(directory::TRUE_TYPE_VERSION);

    // Write table directory.
    let selector = entry_selector(count);
    w.write::<u16>(count);
    w.write::<u16>((1 << selector) * 16);
    w.write::<u16>(selector);
    w.write::<u16>((count - (1 << selector)) * 16);

    // Write table records.
    let mut offset = 12 + 16 * records.len();
    for record in &records {
        let (sum, len) = match record.tag {
            Tag::GLYF => (checksum(&glyf.data), glyf.len),
            Tag::LOCA => (checksum(&loca.data), loca.len),
            _ => (record.checksum, record.length as usize),
        };

        w.write(TableRecord {
            tag: record.tag,
            checksum: sum,
            offset: offset as u32,
            length: len as u32,
        });

        // Increase offset, plus padding zeros to align to 4 bytes.
        offset += (len + 3) & !3;
    }

    // Write tables.
    for record in &records {
        match record.tag {
            Tag::GLYF => w.extend(&glyf.data),
            Tag::LOCA => w.extend(&loca.data),
            _ => {
                source.seek(u64::from(record.offset))?;
                w.extend(&source.read_bytes(record.length as usize)?);
                w.align(4);
            }
        }
    }

    debug_assert_eq!(w.len(), size);
    Ok(w.finish())
}

/// Calculate a checksum over the data as a wrapping sum of big-endian
/// `u32`s. A trailing partial word is ignored.
fn checksum(data: &[u8]) -> u32 {
    data.chunks_exact(4).fold(0u32, |sum, chunk| {
        sum.wrapping_add(u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
    })
}

/// A 4-byte OpenType tag.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Tag(pub [u8; 4]);

impl Tag {
    /// Character to glyph mapping.
    pub const CMAP: Self = Self(*b"cmap");
    /// Control value table.
    pub const CVT: Self = Self(*b"cvt ");
    /// Font program.
    pub const FPGM: Self = Self(*b"fpgm");
    /// Glyph data.
    pub const GLYF: Self = Self(*b"glyf");
    /// Font header.
    pub const HEAD: Self = Self(*b"head");
    /// Horizontal header.
    pub const HHEA: Self = Self(*b"hhea");
    /// Horizontal metrics.
    pub const HMTX: Self = Self(*b"hmtx");
    /// Index to location.
    pub const LOCA: Self = Self(*b"loca");
    /// Maximum profile.
    pub const MAXP: Self = Self(*b"maxp");
    /// Naming table.
    pub const NAME: Self = Self(*b"name");
    /// OS/2 and Windows specific metrics.
    pub const OS2: Self = Self(*b"OS/2");
    /// Control value program.
    pub const PREP: Self = Self(*b"prep");
}

impl Debug for Tag {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "Tag({self})")
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.pad(std::str::from_utf8(&self.0).unwrap_or("..."))
    }
}

/// Locates a table in the font file.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
struct TableRecord {
    tag: Tag,
    checksum: u32,
    offset: u32,
    length: u32,
}

impl TableRecord {
    fn read<S: FontSource>(source: &mut S) -> io::Result<Self> {
        Ok(TableRecord {
            tag: Tag(source.read_array()?),
            checksum: source.read_u32()?,
            offset: source.read_u32()?,
            length: source.read_u32()?,
        })
    }
}

impl Writeable for TableRecord {
    fn write(&self, w: &mut Writer) {
        w.write::<[u8; 4]>(self.tag.0);
        w.write::<u32>(self.checksum);
        w.write::<u32>(self.offset);
        w.write::<u32>(self.length);
    }
}

/// The result type for everything.
pub type Result<T> = std::result::Result<T, Error>;

/// Subsetting failed.
#[derive(Debug)]
pub enum Error {
    /// The font data is malformed or not supported.
    Format {
        /// The name of the font.
        font: String,
        /// What is wrong with it.
        kind: FormatError,
    },
    /// Reading from the font source failed.
    Io(io::Error),
}

impl Error {
    fn format(font: impl Into<String>, kind: FormatError) -> Self {
        Self::Format { font: font.into(), kind }
    }

    /// The kind of format error, if this is one.
    pub fn format_error(&self) -> Option<FormatError> {
        match self {
            Self::Format { kind, .. } => Some(*kind),
            Self::Io(_) => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Format { font, kind } => write!(f, "{font}: {kind}"),
            Self::Io(err) => write!(f, "failed to read font: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Format { .. } => None,
            Self::Io(err) => Some(err),
        }
    }
}

/// Ways in which font data can be malformed.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FormatError {
    /// The data is not a font with TrueType outlines.
    UnknownKind,
    /// A table that is needed for subsetting is missing.
    MissingTable(Tag),
    /// An offset pointed outside of its table.
    InvalidOffset,
    /// The description of this composite glyph is truncated or references
    /// a glyph that doesn't exist.
    MalformedGlyph(u16),
    /// The font collection has no face with this index.
    UnknownFace(u32),
}

impl Display for FormatError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::UnknownKind => f.pad("not a TrueType font"),
            Self::MissingTable(tag) => write!(f, "table '{tag}' does not exist"),
            Self::InvalidOffset => f.pad("invalid offset"),
            Self::MalformedGlyph(glyph) => write!(f, "malformed glyph {glyph}"),
            Self::UnknownFace(index) => write!(f, "no face with index {index}"),
        }
    }
}
