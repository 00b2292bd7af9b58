//! QuickDraw data structures and the serialised picture (PICT) decoder.

pub mod pict;

mod bitmap;
mod region;

pub use bitmap::{Bitmap, ColorTable, PixPattern, Pixmap, PixelData};
pub use pict::{Argument, Op, Picture, PictureCheck};
pub use region::Region;

use libcommon::{InputStream, StreamError};
use num_derive::FromPrimitive;
use std::fmt;
use std::io::{Read, Seek};

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("not a PICT")]
    NotPict,
    #[error("unknown opcode {id:#x} (version {version})")]
    UnknownOpcode { version: u8, id: u16 },
    #[error("invalid {0}")]
    Invalid(&'static str),
    #[error("stream error: {0}")]
    Stream(#[from] StreamError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// A 24-bit RGB colour.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    #[must_use]
    pub const fn grey(value: u8) -> Self {
        Self::new(value, value, value)
    }

    #[must_use]
    pub fn is_white(self) -> bool {
        self == Self::WHITE
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// A QuickDraw point. Serialised vertical-first; the reader preserves the
/// order it was handed.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Point {
    pub x: i16,
    pub y: i16,
}

impl Point {
    pub fn read<T: Read + Seek>(input: &mut InputStream<T>) -> Result<Self> {
        let x = input.read_i16()?;
        let y = input.read_i16()?;
        Ok(Self { x, y })
    }
}

/// A QuickDraw rectangle, serialised top, left, bottom, right.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Rect {
    pub top: i16,
    pub left: i16,
    pub bottom: i16,
    pub right: i16,
}

impl Rect {
    pub fn read<T: Read + Seek>(input: &mut InputStream<T>) -> Result<Self> {
        let top = input.read_i16()?;
        let left = input.read_i16()?;
        let bottom = input.read_i16()?;
        let right = input.read_i16()?;
        Ok(Self { top, left, bottom, right })
    }

    #[inline]
    #[must_use]
    pub fn width(self) -> i32 {
        i32::from(self.right) - i32::from(self.left)
    }

    #[inline]
    #[must_use]
    pub fn height(self) -> i32 {
        i32::from(self.bottom) - i32::from(self.top)
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }
}

/// An 8×8 one-bit fill pattern.
pub type Pattern = [u8; 8];

/// QuickDraw transfer modes; decoded bitmaps record one.
#[derive(Clone, Copy, Debug, Eq, FromPrimitive, PartialEq)]
pub enum TransferMode {
    SrcCopy = 0,
    SrcOr,
    SrcXor,
    SrcBic,
    NotSrcCopy,
    NotSrcOr,
    NotSrcXor,
    NotSrcBic,
    PatCopy,
    PatOr,
    PatXor,
    PatBic,
    NotPatCopy,
    NotPatOr,
    NotPatXor,
    NotPatBic,
    Blend         = 32,
    AddPin,
    AddOver,
    SubPin,
    Transparent,
    AdMax,
    SubOver,
    AdMin,
    GrayishTextOr = 49,
    Hilite,
    DitherCopy    = 64,
}

/// Validates a serialised transfer-mode word. The observed corpus only uses
/// a few modes but anything up to `DitherCopy` is passed through.
pub(crate) fn check_mode(mode: i16) -> Result<i16> {
    if (0..=64).contains(&mode) {
        Ok(mode)
    } else {
        Err(Error::Invalid("transfer mode"))
    }
}
