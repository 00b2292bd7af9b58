use std::cell::RefCell;
use std::convert::TryFrom;
use std::io::{Error, ErrorKind, Read, Result, Seek, SeekFrom};
use std::rc::Rc;
use super::SeekExt;

/// A reference-counted window over a stream.
///
/// Every clone shares the same inner reader but keeps its own cursor, so a
/// decoder can hold several independent views of one file without copying
/// data. `substream` narrows the window to a byte range of the parent.
pub struct SharedStream<T: Read + Seek + ?Sized> {
    inner: Rc<RefCell<T>>,
    start_pos: u64,
    current_pos: u64,
    end_pos: u64,
}

impl<T> SharedStream<T> where T: Read + Seek {
    /// Creates a new `SharedStream` covering the full range of the input,
    /// with the cursor at the start.
    pub fn new(mut input: T) -> Result<Self> {
        let end_pos = input.len()?;
        Ok(Self {
            inner: Rc::new(RefCell::new(input)),
            start_pos: 0,
            current_pos: 0,
            end_pos,
        })
    }

    /// Creates a new `SharedStream` bounded by the given start and end
    /// positions of the input.
    pub fn with_bounds(input: T, start_pos: u64, end_pos: u64) -> Self {
        Self {
            inner: Rc::new(RefCell::new(input)),
            start_pos,
            current_pos: start_pos,
            end_pos,
        }
    }

    /// Consumes this stream, returning the inner stream.
    ///
    /// # Panics
    ///
    /// Panics if the inner stream has more than one strong reference.
    #[must_use]
    pub fn into_inner(self) -> T {
        Rc::try_unwrap(self.inner)
            .map_err(|_| "could not unwrap SharedStream Rc")
            .unwrap()
            .into_inner()
    }
}

impl<T> SharedStream<T> where T: Read + Seek + ?Sized {
    /// Creates a new `SharedStream` windowing the byte range
    /// `[start_pos, end_pos)` of this stream.
    ///
    /// # Panics
    ///
    /// Panics if the given range extends past the end of this stream;
    /// callers validate ranges against `len` first.
    #[must_use]
    pub fn substream(&self, start_pos: u64, end_pos: u64) -> Self {
        assert!(start_pos <= end_pos && self.start_pos + end_pos <= self.end_pos);
        Self {
            inner: Rc::clone(&self.inner),
            start_pos: self.start_pos + start_pos,
            current_pos: self.start_pos + start_pos,
            end_pos: self.start_pos + end_pos,
        }
    }
}

impl<T> Clone for SharedStream<T> where T: Read + Seek + ?Sized {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            start_pos: self.start_pos,
            current_pos: self.current_pos,
            end_pos: self.end_pos,
        }
    }
}

impl<T> Read for SharedStream<T> where T: Read + Seek + ?Sized {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut inner = match self.inner.try_borrow_mut() {
            Ok(inner) => inner,
            Err(err) => return Err(Error::new(ErrorKind::Other, err)),
        };
        inner.seek(SeekFrom::Start(self.current_pos))?;
        let limit = usize::try_from(self.end_pos.saturating_sub(self.current_pos))
            .unwrap_or(usize::MAX);

        // Don't call into the inner reader at all at EOF because it may still
        // block
        if limit == 0 {
            return Ok(0);
        }

        let max = buf.len().min(limit);
        let n = inner.read(&mut buf[0..max])?;
        self.current_pos += u64::try_from(n).unwrap();
        Ok(n)
    }
}

impl<T> Seek for SharedStream<T> where T: Read + Seek + ?Sized {
    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let (base_pos, offset) = match pos {
            SeekFrom::Start(n) => (self.start_pos, i64::try_from(n).map_err(|_| {
                Error::new(ErrorKind::InvalidInput, "seek offset overflow")
            })?),
            SeekFrom::End(n) => (self.end_pos, n),
            SeekFrom::Current(n) => (self.current_pos, n),
        };
        let new_pos = if offset >= 0 {
            base_pos.checked_add(offset as u64)
        } else {
            base_pos.checked_sub(offset.wrapping_neg() as u64)
        };
        match new_pos {
            Some(n) if n >= self.start_pos && n <= self.end_pos => {
                self.current_pos = n;
                Ok(n - self.start_pos)
            },
            _ => Err(Error::new(ErrorKind::InvalidInput, "invalid seek to a negative or overflowing position")),
        }
    }
}

impl<T> std::fmt::Debug for SharedStream<T> where T: Read + Seek + std::fmt::Debug + ?Sized {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedStream")
            .field("start_pos", &self.start_pos)
            .field("current_pos", &self.current_pos)
            .field("end_pos", &self.end_pos)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use super::*;

    #[test]
    fn windows_share_data_but_not_cursors() {
        let stream = SharedStream::new(Cursor::new(b"abcdefgh".to_vec())).unwrap();
        let mut a = stream.clone();
        let mut b = stream.substream(4, 8);

        let mut buf = [0; 4];
        a.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"abcd");
        b.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"efgh");
        assert_eq!(a.read(&mut buf).unwrap(), 4);
    }

    #[test]
    fn substream_is_relative() {
        let stream = SharedStream::new(Cursor::new(b"abcdefgh".to_vec())).unwrap();
        let inner = stream.substream(2, 6);
        let mut innermost = inner.substream(1, 3);
        let mut buf = [0; 2];
        innermost.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"de");
        assert!(innermost.read_exact(&mut buf).is_err());
    }

    #[test]
    fn seek_is_bounded() {
        let stream = SharedStream::new(Cursor::new(b"abcdefgh".to_vec())).unwrap();
        let mut sub = stream.substream(2, 6);
        assert_eq!(sub.seek(SeekFrom::End(0)).unwrap(), 4);
        assert!(sub.seek(SeekFrom::Current(1)).is_err());
        assert!(sub.seek(SeekFrom::Current(-5)).is_err());
        assert_eq!(sub.seek(SeekFrom::Start(0)).unwrap(), 0);
    }
}
