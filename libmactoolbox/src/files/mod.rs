//! Containers that carry a Macintosh file's forks and metadata on
//! fork-less filesystems.

mod apple_double;
mod finder_dat;
mod mac_binary;

pub use apple_double::AppleDouble;
pub use finder_dat::FinderDat;
pub use mac_binary::MacBinary;

use crate::types::OsType;
use std::io;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("bad magic")]
    BadMagic,
    #[error("unknown version {0:#x}")]
    BadVersion(u32),
    #[error("bad entry table")]
    BadEntry,
    #[error("bad header field: {0}")]
    BadHeader(&'static str),
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// The first eight bytes of a FinderInfo block: the file type and creator
/// codes the Finder and the document probe key on.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FinderInfo {
    pub file_type: OsType,
    pub creator: OsType,
}

impl FinderInfo {
    #[must_use]
    pub fn new(file_type: impl Into<OsType>, creator: impl Into<OsType>) -> Self {
        Self { file_type: file_type.into(), creator: creator.into() }
    }

    /// Reads the leading type and creator from a FinderInfo block.
    #[must_use]
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 8 {
            return None;
        }
        let mut file_type = [0; 4];
        let mut creator = [0; 4];
        file_type.copy_from_slice(&data[0..4]);
        creator.copy_from_slice(&data[4..8]);
        Some(Self::new(&file_type, &creator))
    }
}
