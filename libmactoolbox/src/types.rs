//! Basic Macintosh data types
//!
//! MacTypes.h

use bstr::ByteSlice;
use byteorder::ByteOrder;
use encoding::{all::MAC_ROMAN, DecoderTrap, Encoding};
use std::{char, fmt, io};

/// A four-character code, the tag Macintosh software uses to type resources,
/// files and creators.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct OsType([u8; 4]);

impl OsType {
    #[must_use]
    pub fn new(os_type: impl Into<[u8; 4]>) -> Self {
        Self(os_type.into())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    fn fmt_write(self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{}", char::from_u32(u32::from(*b)).unwrap_or(char::REPLACEMENT_CHARACTER))?;
        }
        Ok(())
    }
}

impl From<&[u8; 4]> for OsType {
    fn from(value: &[u8; 4]) -> Self {
        Self(*value)
    }
}

impl From<u32> for OsType {
    fn from(value: u32) -> Self {
        Self(value.to_be_bytes())
    }
}

impl Default for OsType {
    fn default() -> Self {
        Self::new([0; 4])
    }
}

impl fmt::Display for OsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_write(f)
    }
}

impl fmt::Debug for OsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OsType(")?;
        self.fmt_write(f)?;
        write!(f, ")")?;
        Ok(())
    }
}

pub trait OsTypeReadExt: io::Read {
    #[inline]
    fn read_os_type<T: ByteOrder>(&mut self) -> io::Result<OsType> {
        let mut buf = [0; 4];
        self.read_exact(&mut buf)?;
        Ok(OsType::from(T::read_u32(&buf)))
    }
}

impl<T: io::Read + ?Sized> OsTypeReadExt for T {}

/// A binary [Pascal string](https://en.wikipedia.org/wiki/String_(computer_science)#Length-prefixed).
///
/// Stored as raw bytes since legacy data is interpreted according to a
/// script code, not a fixed character set. Lossy conversions assume
/// Mac Roman, the dominant encoding in the formats this library reads.
#[derive(Clone, Default, Eq, PartialEq)]
#[must_use]
pub struct PString(Vec<u8>);

impl PString {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a length-prefixed string from a stream.
    pub fn read(input: &mut impl io::Read) -> io::Result<Self> {
        let mut size = [0; 1];
        input.read_exact(&mut size)?;
        let mut data = vec![0; usize::from(size[0])];
        input.read_exact(&mut data)?;
        Ok(Self(data))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decodes the bytes as Mac Roman.
    #[must_use]
    pub fn to_string_lossy(&self) -> String {
        MAC_ROMAN
            .decode(&self.0, DecoderTrap::Replace)
            .unwrap_or_else(|_| self.0.to_str_lossy().into_owned())
    }
}

impl From<Vec<u8>> for PString {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

impl From<&[u8]> for PString {
    fn from(value: &[u8]) -> Self {
        Self(value.to_vec())
    }
}

impl fmt::Debug for PString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.0.as_bstr(), f)
    }
}

impl fmt::Display for PString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.0.as_bstr(), f)
    }
}

#[cfg(test)]
mod tests {
    use byteorder::{BigEndian, LittleEndian};
    use std::io::Cursor;
    use super::*;

    #[test]
    fn os_type_display() {
        let os_type = OsType(*b"STR ");
        assert_eq!(format!("{}", os_type), "STR ");
        assert_eq!(format!("{:?}", os_type), "OsType(STR )");
    }

    #[test]
    fn os_type_read() {
        let mut c = Cursor::new(b"verssrev");
        assert_eq!(c.read_os_type::<BigEndian>().unwrap(), OsType(*b"vers"));
        assert_eq!(c.read_os_type::<LittleEndian>().unwrap(), OsType(*b"vers"));
    }

    #[test]
    fn pstring_read() {
        let mut c = Cursor::new(b"\x04testtail");
        let s = PString::read(&mut c).unwrap();
        assert_eq!(s.as_bytes(), b"test");
        assert_eq!(s.to_string_lossy(), "test");
    }

    #[test]
    fn pstring_mac_roman() {
        // 0xA5 is a bullet in Mac Roman
        let s = PString::from(&b"\xa5 item"[..]);
        assert_eq!(s.to_string_lossy(), "\u{2022} item");
    }

    #[test]
    fn pstring_truncated_is_an_error() {
        let mut c = Cursor::new(b"\x10ab");
        assert!(PString::read(&mut c).is_err());
    }
}
