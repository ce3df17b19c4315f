//! Decoded view of a compiled image.
//!
//! The image layout, in order: a leading `Jump` over the storage block,
//! storage entries (hash + length + text), the source map, one `Subroutine`
//! record per routine, the `Main` record, the concatenated code segments and
//! a trailing `Halt`. [`Image::parse`] walks that layout and keeps the raw
//! bytes for code-segment access; nothing is re-encoded.

use indexmap::IndexMap;

use crate::encode::{read_u16, read_u32, read_u64};
use crate::op::Op;

/// One interned storage entry, keyed in [`Image::storage`] by its address
/// (the byte offset of the hash field within the image).
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct StorageEntry {
    pub hash: u64,
    pub text: String,
}

/// One source map record: absolute bytecode position and source span.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SourceMapEntry {
    pub bytecode_pos: u32,
    pub source_pos: u32,
    pub source_end: u32,
}

/// One subroutine record from the image header.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SubroutineRecord {
    /// Storage address of the routine's identifier, 0 for nameless routines.
    pub name_address: u32,
    /// Absolute offset of the routine's first opcode.
    pub code_address: u32,
    pub flags: u8,
}

/// Image decoding error.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("image too small: {0} bytes")]
    TooSmall(usize),
    #[error("expected opcode {expected:?} at byte {offset}, found {found:#04x}")]
    UnexpectedOp {
        expected: Op,
        offset: usize,
        found: u8,
    },
    #[error("truncated image at byte {0}")]
    Truncated(usize),
    #[error("storage entry at byte {0} is not valid UTF-8")]
    InvalidText(u32),
    #[error("missing trailing Halt")]
    MissingHalt,
}

/// A parsed image. Header tables are decoded eagerly; code is borrowed from
/// the retained byte buffer.
#[derive(Debug)]
pub struct Image {
    bytes: Vec<u8>,
    /// Storage entries by address, in insertion (= serialization) order.
    pub storage: IndexMap<u32, StorageEntry>,
    pub source_map: Vec<SourceMapEntry>,
    pub subroutines: Vec<SubroutineRecord>,
    /// Absolute offset of the main program's first opcode.
    pub main_address: u32,
}

impl Image {
    pub fn parse(bytes: Vec<u8>) -> Result<Self, ImageError> {
        // Jump + u32 target + SourceMap + u32 size + Main + u32 + Halt
        if bytes.len() < 5 + 5 + 5 + 1 {
            return Err(ImageError::TooSmall(bytes.len()));
        }

        expect_op(&bytes, 0, Op::Jump)?;
        let storage_end = read_u32(&bytes, 1) as usize;
        if storage_end > bytes.len() {
            return Err(ImageError::Truncated(storage_end));
        }

        let mut storage = IndexMap::new();
        let mut offset = 5usize;
        while offset < storage_end {
            if offset + 8 + 2 > storage_end {
                return Err(ImageError::Truncated(offset));
            }
            let address = offset as u32;
            let hash = read_u64(&bytes, offset);
            let len = read_u16(&bytes, offset + 8) as usize;
            offset += 8 + 2;
            if offset + len > storage_end {
                return Err(ImageError::Truncated(offset));
            }
            let text = std::str::from_utf8(&bytes[offset..offset + len])
                .map_err(|_| ImageError::InvalidText(address))?
                .to_owned();
            offset += len;
            storage.insert(address, StorageEntry { hash, text });
        }

        expect_op(&bytes, offset, Op::SourceMap)?;
        let map_size = read_u32(&bytes, offset + 1) as usize;
        offset += 5;
        if offset + map_size > bytes.len() {
            return Err(ImageError::Truncated(offset));
        }
        let mut source_map = Vec::with_capacity(map_size / 12);
        let map_end = offset + map_size;
        while offset < map_end {
            source_map.push(SourceMapEntry {
                bytecode_pos: read_u32(&bytes, offset),
                source_pos: read_u32(&bytes, offset + 4),
                source_end: read_u32(&bytes, offset + 8),
            });
            offset += 12;
        }

        let mut subroutines = Vec::new();
        loop {
            if offset >= bytes.len() {
                return Err(ImageError::Truncated(offset));
            }
            match bytes[offset] {
                b if b == Op::Subroutine as u8 => {
                    if offset + 10 > bytes.len() {
                        return Err(ImageError::Truncated(offset));
                    }
                    subroutines.push(SubroutineRecord {
                        name_address: read_u32(&bytes, offset + 1),
                        code_address: read_u32(&bytes, offset + 5),
                        flags: bytes[offset + 9],
                    });
                    offset += 10;
                }
                b if b == Op::Main as u8 => break,
                b => {
                    return Err(ImageError::UnexpectedOp {
                        expected: Op::Subroutine,
                        offset,
                        found: b,
                    });
                }
            }
        }
        if offset + 5 > bytes.len() {
            return Err(ImageError::Truncated(offset));
        }
        let main_address = read_u32(&bytes, offset + 1);

        if bytes.last() != Some(&(Op::Halt as u8)) {
            return Err(ImageError::MissingHalt);
        }

        Ok(Self {
            bytes,
            storage,
            source_map,
            subroutines,
            main_address,
        })
    }

    /// Raw bytes of the whole image.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Code segment of subroutine `index`; segments are contiguous, so each
    /// ends where the next begins and the last ends at the main program.
    pub fn subroutine_code(&self, index: usize) -> &[u8] {
        let start = self.subroutines[index].code_address as usize;
        let end = match self.subroutines.get(index + 1) {
            Some(next) => next.code_address as usize,
            None => self.main_address as usize,
        };
        &self.bytes[start..end]
    }

    /// Code segment of the main program, excluding the trailing `Halt`.
    pub fn main_code(&self) -> &[u8] {
        &self.bytes[self.main_address as usize..self.bytes.len() - 1]
    }

    /// Storage text at `address`, if an entry starts there.
    pub fn storage_text(&self, address: u32) -> Option<&str> {
        self.storage.get(&address).map(|e| e.text.as_str())
    }

    /// Whether `pos` falls inside one of the emitted code segments
    /// (subroutine or main).
    pub fn in_code_segment(&self, pos: u32) -> bool {
        let code_start = match self.subroutines.first() {
            Some(first) => first.code_address,
            None => self.main_address,
        };
        pos >= code_start && (pos as usize) < self.bytes.len() - 1
    }
}

fn expect_op(bytes: &[u8], offset: usize, expected: Op) -> Result<(), ImageError> {
    let found = *bytes.get(offset).ok_or(ImageError::Truncated(offset))?;
    if found != expected as u8 {
        return Err(ImageError::UnexpectedOp {
            expected,
            offset,
            found,
        });
    }
    Ok(())
}
