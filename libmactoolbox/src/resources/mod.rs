mod fork;
mod version;

pub use fork::{Fork, Item, ResourceFlags};
pub use version::Version;

use crate::types::OsType;
use libcommon::StreamError;

/// String resource id of the "application missing" name shown by the Finder.
pub const APPLICATION_NAME_ID: i16 = -16396;
/// String resource id of the "application missing" explanation message.
pub const MISSING_APPLICATION_MESSAGE_ID: i16 = -16397;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("resource fork too small ({0} < {1})")]
    ForkTooSmall(u64, u64),
    #[error("bad resource map size ({0})")]
    BadMapSize(u32),
    #[error("bad resource map offsets")]
    BadMapOffsets,
    #[error("bad type list (count {0})")]
    BadTypeList(u16),
    #[error("bad reference list for OSType {0}")]
    BadReferenceList(OsType),
    #[error("resource {0} {1} not found")]
    NotFound(OsType, i16),
    #[error("resource {0} {1} data is out of bounds")]
    BadData(OsType, i16),
    #[error("bad version resource {0}")]
    BadVersion(i16),
    #[error("stream error: {0}")]
    Stream(#[from] StreamError),
}

pub type Result<T> = std::result::Result<T, Error>;
