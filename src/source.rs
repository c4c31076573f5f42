//! Seekable sources of font data.
//!
//! The subsetter never owns the font bytes. It reads them through a
//! [`FontSource`], which it reopens when a run starts and closes again when
//! the run ends, whatever the outcome.

use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// A seekable source of big-endian font data.
pub trait FontSource {
    /// A name identifying the font, used in error messages.
    fn name(&self) -> &str;

    /// Make the source readable again and move to its start.
    fn reopen(&mut self) -> io::Result<()>;

    /// Release the underlying resource.
    fn close(&mut self) -> io::Result<()>;

    /// Move to an absolute byte position.
    fn seek(&mut self, offset: u64) -> io::Result<()>;

    /// Move forward by `n` bytes.
    fn skip(&mut self, n: u64) -> io::Result<()>;

    /// Fill `buf` completely from the current position.
    fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()>;

    /// Read `len` bytes into a new buffer.
    fn read_bytes(&mut self, len: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0; len];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Read a fixed number of bytes.
    fn read_array<const N: usize>(&mut self) -> io::Result<[u8; N]> {
        let mut buf = [0; N];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Read an unsigned 16-bit integer.
    fn read_u16(&mut self) -> io::Result<u16> {
        self.read_array().map(u16::from_be_bytes)
    }

    /// Read a signed 16-bit integer.
    fn read_i16(&mut self) -> io::Result<i16> {
        self.read_array().map(i16::from_be_bytes)
    }

    /// Read an unsigned 32-bit integer.
    fn read_u32(&mut self) -> io::Result<u32> {
        self.read_array().map(u32::from_be_bytes)
    }
}

/// Font data that is already in memory.
#[derive(Debug, Clone)]
pub struct MemorySource<'a> {
    name: Cow<'a, str>,
    data: &'a [u8],
    offset: usize,
}

impl<'a> MemorySource<'a> {
    /// Wrap a byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_name(data, "<memory>")
    }

    /// Wrap a byte slice and give it a name for error messages.
    pub fn with_name(data: &'a [u8], name: impl Into<Cow<'a, str>>) -> Self {
        Self { name: name.into(), data, offset: 0 }
    }

    fn remaining(&self) -> &'a [u8] {
        self.data.get(self.offset..).unwrap_or(&[])
    }
}

impl FontSource for MemorySource<'_> {
    fn name(&self) -> &str {
        &self.name
    }

    fn reopen(&mut self) -> io::Result<()> {
        self.offset = 0;
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn seek(&mut self, offset: u64) -> io::Result<()> {
        self.offset = usize::try_from(offset).unwrap_or(usize::MAX);
        Ok(())
    }

    fn skip(&mut self, n: u64) -> io::Result<()> {
        let n = usize::try_from(n).unwrap_or(usize::MAX);
        self.offset = self.offset.saturating_add(n);
        Ok(())
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        let src = self
            .remaining()
            .get(..buf.len())
            .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))?;
        buf.copy_from_slice(src);
        self.offset += buf.len();
        Ok(())
    }

    fn read_bytes(&mut self, len: usize) -> io::Result<Vec<u8>> {
        // Check the bounds before allocating, the length comes from the font.
        if self.remaining().len() < len {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        let mut buf = vec![0; len];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }
}

/// A font file on disk.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    name: String,
    file: Option<BufReader<File>>,
}

impl FileSource {
    /// Open the font file at `path`.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = BufReader::new(File::open(&path)?);
        let name = path.display().to_string();
        Ok(Self { path, name, file: Some(file) })
    }

    /// The path of the font file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file is currently open.
    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    fn file(&mut self) -> io::Result<&mut BufReader<File>> {
        self.file.as_mut().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotConnected, "font source is closed")
        })
    }
}

impl FontSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn reopen(&mut self) -> io::Result<()> {
        match &mut self.file {
            Some(file) => {
                file.seek(SeekFrom::Start(0))?;
            }
            None => self.file = Some(BufReader::new(File::open(&self.path)?)),
        }
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.file = None;
        Ok(())
    }

    fn seek(&mut self, offset: u64) -> io::Result<()> {
        self.file()?.seek(SeekFrom::Start(offset)).map(|_| ())
    }

    fn skip(&mut self, n: u64) -> io::Result<()> {
        let n = i64::try_from(n)
            .map_err(|_| io::Error::from(io::ErrorKind::InvalidInput))?;
        self.file()?.seek_relative(n)
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        Read::read_exact(self.file()?, buf)
    }

    fn read_bytes(&mut self, len: usize) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.file()?.take(len as u64).read_to_end(&mut buf)?;
        if buf.len() < len {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        Ok(buf)
    }
}
