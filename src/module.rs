//! Module-level pieces of a VBA project that sit directly on top of decompression: the dir
//! stream records locating each module's source, and the module streams themselves.

use regex::Regex;
use std::sync::OnceLock;

use crate::buffer::DecompressedBuffer;
use crate::container::CompressedContainer;
use crate::cursor::ByteCursor;
use crate::error::{Error, Result};
use crate::options::DecompressOptions;

fn expect_field(step: &'static str, expected: u32, actual: u32) -> Result<()> {
    if expected != actual {
        return Err(Error::BadRecord {
            step,
            expected,
            actual,
        });
    }
    Ok(())
}

/// MODULEOFFSET record: where a module's compressed source starts within its module stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModuleOffset {
    pub text_offset: u32,
}

impl ModuleOffset {
    pub const ID: u16 = 0x0031;

    pub fn read(cursor: &mut ByteCursor) -> Result<Self> {
        let id = cursor.read_u16("decode MODULEOFFSET id")?;
        expect_field("decode MODULEOFFSET id", Self::ID as u32, id as u32)?;
        let size = cursor.read_u32("decode MODULEOFFSET size")?;
        expect_field("decode MODULEOFFSET size", 4, size)?;
        let text_offset = cursor.read_u32("decode MODULEOFFSET text offset")?;
        Ok(Self { text_offset })
    }
}

/// MODULEDOCSTRING record: a module's description, in both the project code page and UTF-16.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleDocString {
    /// Description in the project's MBCS code page. Left undecoded since the code page lives in
    /// a separate record.
    pub doc_string: Vec<u8>,
    pub doc_string_unicode: String,
}

impl ModuleDocString {
    pub const ID: u16 = 0x001C;

    pub fn read(cursor: &mut ByteCursor) -> Result<Self> {
        let id = cursor.read_u16("decode MODULEDOCSTRING id")?;
        expect_field("decode MODULEDOCSTRING id", Self::ID as u32, id as u32)?;
        let size = cursor.read_u32("decode MODULEDOCSTRING size")? as usize;
        let doc_string = cursor
            .read_bytes(size, "decode MODULEDOCSTRING text")?
            .to_vec();
        // Reserved, ignored
        cursor.read_u16("decode MODULEDOCSTRING reserved")?;
        let size_unicode = cursor.read_u32("decode MODULEDOCSTRING unicode size")?;
        if size_unicode % 2 != 0 {
            return Err(Error::BadText(format!(
                "UTF-16 doc string has odd byte length {}",
                size_unicode
            )));
        }
        let raw = cursor.read_bytes(size_unicode as usize, "decode MODULEDOCSTRING unicode text")?;
        let units: Vec<u16> = raw
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        let doc_string_unicode =
            String::from_utf16(&units).map_err(|e| Error::BadText(e.to_string()))?;
        Ok(Self {
            doc_string,
            doc_string_unicode,
        })
    }
}

/// A module stream: an opaque performance cache followed by the module's compressed source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleStream<'a> {
    performance_cache: &'a [u8],
    source: DecompressedBuffer,
}

impl<'a> ModuleStream<'a> {
    /// Split `data` at `text_offset` (from the module's [`ModuleOffset`] record) and decompress
    /// the source container after it.
    pub fn new(data: &'a [u8], text_offset: u32, options: &DecompressOptions) -> Result<Self> {
        let mut cursor = ByteCursor::new(data);
        let performance_cache =
            cursor.read_bytes(text_offset as usize, "split module stream at text offset")?;
        let compressed = cursor.read_bytes(cursor.remaining(), "read module source")?;
        let source = CompressedContainer::parse(compressed)?.decompress(options)?;
        Ok(Self {
            performance_cache,
            source,
        })
    }

    pub fn performance_cache(&self) -> &'a [u8] {
        self.performance_cache
    }

    /// The module's source text, in the project code page.
    pub fn source(&self) -> &[u8] {
        &self.source
    }

    pub fn into_source(self) -> DecompressedBuffer {
        self.source
    }

    /// Number of lines in the source. A trailing line without a line break still counts.
    pub fn line_count(&self) -> usize {
        let source = self.source();
        let breaks = bytecount::count(source, b'\n');
        match source.last() {
            None => 0,
            Some(b'\n') => breaks,
            Some(_) => breaks + 1,
        }
    }
}

/// Whether a VBA storage stream name is one of the `__SRP_<n>` performance cache streams, which
/// readers must ignore.
pub fn is_srp_stream_name(name: &str) -> bool {
    static SRP_NAME: OnceLock<Regex> = OnceLock::new();
    SRP_NAME
        .get_or_init(|| Regex::new(r"^__SRP_[0-9]{1,25}$").expect("SRP stream name regex is valid"))
        .is_match(name)
}
