//! The sfnt table directory, and the header of font collections that points
//! to it.

use super::*;

/// Version tag of a font with TrueType outlines.
pub(crate) const TRUE_TYPE_VERSION: u32 = 0x00010000;

/// Tag of a font collection (`ttcf`).
const COLLECTION_TAG: u32 = 0x74746366;

/// A font face, described by its table directory.
#[derive(Debug, Clone)]
pub(crate) struct Face {
    /// Name of the font, for error messages.
    name: String,
    records: FxHashMap<Tag, TableRecord>,
}

impl Face {
    /// Read the table directory starting at `offset`.
    pub fn parse<S: FontSource>(source: &mut S, offset: u32) -> Result<Self> {
        let name = source.name().to_string();

        source.seek(u64::from(offset))?;
        if source.read_u32()? != TRUE_TYPE_VERSION {
            return Err(Error::format(name, FormatError::UnknownKind));
        }

        let count = source.read_u16()?;
        // Search range, entry selector and range shift.
        source.skip(6)?;

        let mut records = FxHashMap::default();
        for _ in 0..count {
            let record = TableRecord::read(source)?;
            records.insert(record.tag, record);
        }

        log::debug!("{name}: table directory with {count} tables at {offset}");
        Ok(Self { name, records })
    }

    #[cfg(test)]
    pub fn from_records(name: &str, records: FxHashMap<Tag, TableRecord>) -> Self {
        Self { name: name.to_string(), records }
    }

    /// Look up a table.
    pub fn table(&self, tag: Tag) -> Option<TableRecord> {
        self.records.get(&tag).copied()
    }

    /// Look up a table that has to be present.
    pub fn expect_table(&self, tag: Tag) -> Result<TableRecord> {
        self.table(tag).ok_or_else(|| self.error(FormatError::MissingTable(tag)))
    }

    /// The name of the font.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// A format error for this font.
    pub fn error(&self, kind: FormatError) -> Error {
        Error::format(self.name.clone(), kind)
    }
}

/// Find the table directory of the face at `index`.
///
/// For a font collection (`.ttc`), this is the offset stored for that member
/// in the collection header. A bare font only has the face 0, whose table
/// directory starts at offset 0.
pub fn directory_offset<S: FontSource>(source: &mut S, index: u32) -> Result<u32> {
    source.seek(0)?;
    let kind = source.read_u32()?;

    if kind != COLLECTION_TAG {
        return match index {
            0 => Ok(0),
            _ => Err(Error::format(source.name(), FormatError::UnknownFace(index))),
        };
    }

    // Major and minor version.
    source.skip(4)?;
    let count = source.read_u32()?;
    if index >= count {
        return Err(Error::format(source.name(), FormatError::UnknownFace(index)));
    }

    source.skip(4 * u64::from(index))?;
    Ok(source.read_u32()?)
}
