use byteorder::{BigEndian, ReadBytesExt};
use crate::types::PString;
use libcommon::{SeekExt, SharedStream};
use std::io::{Read, Seek};
use super::{Error, FinderInfo, Result};

const SINGLE_MAGIC: u32 = 0x0005_1600;
const DOUBLE_MAGIC: u32 = 0x0005_1607;

const DATA_FORK_ID: u32 = 1;
const RESOURCE_FORK_ID: u32 = 2;
const REAL_NAME_ID: u32 = 3;
const FINDER_INFO_ID: u32 = 9;

/// An AppleSingle or AppleDouble container.
///
/// AppleDouble is the sibling `._NAME` file that carries the resource fork
/// and FinderInfo of a Macintosh file stored on a foreign filesystem;
/// AppleSingle additionally embeds the data fork. Entry ids other than the
/// forks, the real name and the FinderInfo are skipped.
#[derive(Debug)]
pub struct AppleDouble<T: Read + Seek> {
    name: Option<PString>,
    data_fork: Option<SharedStream<T>>,
    resource_fork: Option<SharedStream<T>>,
    finder_info: Option<FinderInfo>,
}

impl<T: Read + Seek> AppleDouble<T> {
    pub fn new(data: T) -> Result<Self> {
        let data = SharedStream::new(data)?;
        let mut input = data.clone();
        let len = input.len()?;

        let magic = input.read_u32::<BigEndian>().map_err(|_| Error::BadMagic)?;
        if magic != DOUBLE_MAGIC && magic != SINGLE_MAGIC {
            return Err(Error::BadMagic);
        }

        let version = input.read_u32::<BigEndian>().map_err(|_| Error::BadMagic)?;
        if version != 0x10000 && version != 0x20000 {
            return Err(Error::BadVersion(version));
        }

        // In V1 this is an ASCII string, in V2 it is zero-filled; in all
        // cases we do not care about it
        input.skip(16)?;

        let num_entries = input.read_u16::<BigEndian>().map_err(|_| Error::BadEntry)?;
        if num_entries == 0 {
            return Err(Error::BadEntry);
        }

        let mut name = None;
        let mut data_fork = None;
        let mut resource_fork = None;
        let mut finder_info = None;

        for _ in 0..num_entries {
            let entry_id = input.read_u32::<BigEndian>().map_err(|_| Error::BadEntry)?;
            let offset = u64::from(input.read_u32::<BigEndian>().map_err(|_| Error::BadEntry)?);
            let length = u64::from(input.read_u32::<BigEndian>().map_err(|_| Error::BadEntry)?);

            if entry_id == 0 || offset + length > len {
                return Err(Error::BadEntry);
            }

            match entry_id {
                DATA_FORK_ID => data_fork = Some(data.substream(offset, offset + length)),
                RESOURCE_FORK_ID => resource_fork = Some(data.substream(offset, offset + length)),
                REAL_NAME_ID => {
                    let mut raw = vec![0; length as usize];
                    let mut sub = data.substream(offset, offset + length);
                    sub.read_exact(&mut raw)?;
                    name = Some(PString::from(raw));
                },
                FINDER_INFO_ID => {
                    let mut raw = vec![0; length as usize];
                    let mut sub = data.substream(offset, offset + length);
                    sub.read_exact(&mut raw)?;
                    finder_info = FinderInfo::from_bytes(&raw);
                },
                _ => {},
            }
        }

        Ok(Self { name, data_fork, resource_fork, finder_info })
    }

    #[must_use]
    pub fn name(&self) -> Option<&PString> {
        self.name.as_ref()
    }

    #[must_use]
    pub fn data_fork(&self) -> Option<&SharedStream<T>> {
        self.data_fork.as_ref()
    }

    #[must_use]
    pub fn resource_fork(&self) -> Option<&SharedStream<T>> {
        self.resource_fork.as_ref()
    }

    #[must_use]
    pub fn finder_info(&self) -> Option<FinderInfo> {
        self.finder_info
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use super::*;

    #[test]
    fn rejects_bad_magic() {
        let data = Cursor::new(b"\x00\x05\x16\x01\x00\x02\x00\x00".to_vec());
        assert!(matches!(AppleDouble::new(data), Err(Error::BadMagic)));
    }

    #[test]
    fn rejects_out_of_range_entries() {
        let mut data = Vec::new();
        data.extend_from_slice(&0x0005_1607u32.to_be_bytes());
        data.extend_from_slice(&0x0002_0000u32.to_be_bytes());
        data.extend_from_slice(&[0; 16]);
        data.extend_from_slice(&1u16.to_be_bytes());
        data.extend_from_slice(&2u32.to_be_bytes());
        data.extend_from_slice(&0x1000u32.to_be_bytes());
        data.extend_from_slice(&0x1000u32.to_be_bytes());
        assert!(matches!(AppleDouble::new(Cursor::new(data)), Err(Error::BadEntry)));
    }
}
