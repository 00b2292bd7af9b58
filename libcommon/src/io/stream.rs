use byteorder::{BigEndian, ReadBytesExt};
use crate::debug::DebugFile;
use std::io::{self, Read, Seek, SeekFrom};
use super::{SeekExt, SharedStream};

/// Errors produced by the primitive stream operations.
///
/// A read that cannot deliver exactly the requested byte count is a
/// `ShortRead`, never a zero-extended value.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StreamError {
    #[error("short read of {wanted} bytes at offset {at:#x}")]
    ShortRead { at: u64, wanted: usize },
    #[error("seek out of range")]
    BadSeek,
    #[error("substream range {begin:#x}..{end:#x} out of bounds (length {len:#x})")]
    BadRange { begin: u64, end: u64, len: u64 },
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

pub type StreamResult<T> = Result<T, StreamError>;

/// A big-endian decoding facade over a [`SharedStream`].
///
/// All multi-byte reads are big-endian, matching the Macintosh file formats
/// this library decodes. Sub-streams share the inner reader and the audit
/// log handle; each keeps its own cursor.
#[derive(Debug)]
pub struct InputStream<T: Read + Seek> {
    inner: SharedStream<T>,
    len: u64,
    log: DebugFile,
}

impl<T: Read + Seek> InputStream<T> {
    pub fn new(input: T) -> io::Result<Self> {
        Self::with_log(input, DebugFile::disabled())
    }

    pub fn with_log(input: T, log: DebugFile) -> io::Result<Self> {
        let inner = SharedStream::new(input)?;
        Ok(Self::from_shared(inner, log))
    }

    #[must_use]
    pub fn from_shared(mut inner: SharedStream<T>, log: DebugFile) -> Self {
        let len = inner.len().expect("SharedStream length is infallible");
        inner.reset().expect("SharedStream reset is infallible");
        Self { inner, len, log }
    }

    /// The total length of the stream in bytes.
    #[must_use]
    pub fn length(&self) -> u64 {
        self.len
    }

    /// The current read offset.
    pub fn tell(&mut self) -> u64 {
        self.inner.pos().expect("SharedStream tell is infallible")
    }

    pub fn seek(&mut self, pos: SeekFrom) -> StreamResult<u64> {
        self.inner.seek(pos).map_err(|_| StreamError::BadSeek)
    }

    /// `true` once the cursor has reached the end of the stream.
    pub fn at_eof(&mut self) -> bool {
        self.tell() >= self.len
    }

    /// `true` when `pos` lies inside the stream (the one-past-the-end
    /// offset included).
    #[must_use]
    pub fn check_pos(&self, pos: u64) -> bool {
        pos <= self.len
    }

    /// The audit log attached to this stream.
    #[must_use]
    pub fn log(&self) -> &DebugFile {
        &self.log
    }

    /// A view of the byte range `[begin, end)`, sharing the audit log.
    pub fn sub_stream(&self, begin: u64, end: u64) -> StreamResult<Self> {
        if begin > end || end > self.len {
            return Err(StreamError::BadRange { begin, end, len: self.len });
        }
        Ok(Self {
            inner: self.inner.substream(begin, end),
            len: end - begin,
            log: self.log.clone(),
        })
    }

    /// The underlying windowed stream.
    #[must_use]
    pub fn shared(&self) -> &SharedStream<T> {
        &self.inner
    }

    fn short_read(&mut self, wanted: usize) -> StreamError {
        StreamError::ShortRead { at: self.tell(), wanted }
    }

    pub fn read_u8(&mut self) -> StreamResult<u8> {
        self.inner.read_u8().map_err(|_| self.short_read(1))
    }

    pub fn read_i8(&mut self) -> StreamResult<i8> {
        self.inner.read_i8().map_err(|_| self.short_read(1))
    }

    pub fn read_u16(&mut self) -> StreamResult<u16> {
        self.inner.read_u16::<BigEndian>().map_err(|_| self.short_read(2))
    }

    pub fn read_i16(&mut self) -> StreamResult<i16> {
        self.inner.read_i16::<BigEndian>().map_err(|_| self.short_read(2))
    }

    pub fn read_u32(&mut self) -> StreamResult<u32> {
        self.inner.read_u32::<BigEndian>().map_err(|_| self.short_read(4))
    }

    pub fn read_i32(&mut self) -> StreamResult<i32> {
        self.inner.read_i32::<BigEndian>().map_err(|_| self.short_read(4))
    }

    /// Reads a 16.16 fixed-point number.
    pub fn read_fixed(&mut self) -> StreamResult<f64> {
        Ok(f64::from(self.read_i32()?) / 65536.0)
    }

    /// Reads exactly `n` bytes.
    pub fn read_bytes(&mut self, n: usize) -> StreamResult<Vec<u8>> {
        let mut data = vec![0; n];
        match self.inner.read_exact(&mut data) {
            Ok(()) => Ok(data),
            Err(_) => Err(self.short_read(n)),
        }
    }

    /// Reads a length-prefixed Pascal string, returned as raw bytes.
    pub fn read_pstr(&mut self) -> StreamResult<Vec<u8>> {
        let len = usize::from(self.read_u8()?);
        self.read_bytes(len)
    }
}

impl<T: Read + Seek> Read for InputStream<T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<T: Read + Seek> Seek for InputStream<T> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use super::*;

    fn stream(data: &[u8]) -> InputStream<Cursor<Vec<u8>>> {
        InputStream::new(Cursor::new(data.to_vec())).unwrap()
    }

    #[test]
    fn primitives_are_big_endian() {
        let mut s = stream(&[0x01, 0x02, 0x03, 0x04, 0xff, 0xfe]);
        assert_eq!(s.read_u16().unwrap(), 0x0102);
        assert_eq!(s.read_u16().unwrap(), 0x0304);
        assert_eq!(s.read_i16().unwrap(), -2);
        assert_eq!(s.tell(), 6);
    }

    #[test]
    fn tell_advances_by_bytes_consumed() {
        let mut s = stream(&[0; 16]);
        let before = s.tell();
        s.read_u32().unwrap();
        assert_eq!(s.tell(), before + 4);
        s.read_bytes(5).unwrap();
        assert_eq!(s.tell(), before + 9);
    }

    #[test]
    fn short_read_is_an_error_not_zero_extension() {
        let mut s = stream(&[0x01]);
        s.read_u8().unwrap();
        match s.read_u16() {
            Err(StreamError::ShortRead { wanted: 2, .. }) => {},
            other => panic!("expected short read, got {:?}", other),
        }
        assert!(s.at_eof());
    }

    #[test]
    fn fixed_point() {
        let mut s = stream(&[0x00, 0x01, 0x80, 0x00]);
        let value = s.read_fixed().unwrap();
        assert!((value - 1.5).abs() < 1e-9);
    }

    #[test]
    fn pascal_string() {
        let mut s = stream(b"\x04test rest");
        assert_eq!(s.read_pstr().unwrap(), b"test");
        assert_eq!(s.tell(), 5);
    }

    #[test]
    fn sub_stream_is_bounded_and_validated() {
        let s = stream(b"abcdefgh");
        let mut sub = s.sub_stream(2, 6).unwrap();
        assert_eq!(sub.length(), 4);
        assert_eq!(sub.read_bytes(4).unwrap(), b"cdef");
        assert!(sub.at_eof());
        assert!(matches!(s.sub_stream(4, 2), Err(StreamError::BadRange { .. })));
        assert!(matches!(s.sub_stream(0, 9), Err(StreamError::BadRange { .. })));
    }
}
