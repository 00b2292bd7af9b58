use std::convert::TryFrom;
use std::io;

/// Position helpers for seekable streams.
///
/// `std::io::Seek` only grew `stream_len`/`stream_position` late, so the
/// readers here carry their own. The set is deliberately small: total
/// length, current position, rewind and skip are all the decoders need.
#[allow(clippy::len_without_is_empty)]
pub trait SeekExt: io::Seek {
    /// The total stream length, with the cursor left where it was.
    fn len(&mut self) -> io::Result<u64> {
        let pos = self.pos()?;
        let end = self.seek(io::SeekFrom::End(0))?;
        if pos != end {
            self.seek(io::SeekFrom::Start(pos))?;
        }
        Ok(end)
    }

    /// The current cursor position.
    fn pos(&mut self) -> io::Result<u64> {
        self.seek(io::SeekFrom::Current(0))
    }

    /// Rewinds the cursor to the start of the stream.
    fn reset(&mut self) -> io::Result<u64> {
        self.seek(io::SeekFrom::Start(0))
    }

    /// Advances the cursor `count` bytes without reading them.
    fn skip(&mut self, count: u64) -> io::Result<u64> {
        let count = i64::try_from(count).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, "skip distance overflow")
        })?;
        self.seek(io::SeekFrom::Current(count))
    }
}

impl<T: io::Seek + ?Sized> SeekExt for T {}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use super::*;

    #[test]
    fn len_keeps_the_cursor() {
        let mut stream = Cursor::new(vec![0u8; 16]);
        stream.skip(4).unwrap();
        assert_eq!(stream.len().unwrap(), 16);
        assert_eq!(stream.pos().unwrap(), 4);
    }

    #[test]
    fn skip_and_reset() {
        let mut stream = Cursor::new(vec![0u8; 8]);
        assert_eq!(stream.skip(3).unwrap(), 3);
        assert_eq!(stream.skip(2).unwrap(), 5);
        assert_eq!(stream.reset().unwrap(), 0);
        assert!(stream.skip(u64::MAX).is_err());
    }
}
