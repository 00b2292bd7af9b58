use byteorder::{BigEndian, ByteOrder};
use crate::types::PString;
use crc::crc16::checksum_x25;
use libcommon::{SeekExt, SharedStream};
use std::io::{Read, Seek};
use super::{Error, FinderInfo, Result};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Version {
    V1,
    V2,
    V3,
}

/// A MacBinary envelope: one flat file carrying a 128-byte header, the data
/// fork and the resource fork, each padded to 128-byte blocks.
#[derive(Debug)]
pub struct MacBinary<T: Read + Seek> {
    name: PString,
    finder_info: FinderInfo,
    data_fork: Option<SharedStream<T>>,
    resource_fork: Option<SharedStream<T>>,
}

impl<T: Read + Seek> MacBinary<T> {
    pub fn new(mut data: T) -> Result<Self> {
        let header = {
            let mut header = [0; 128];
            data.read_exact(&mut header).map_err(|_| Error::BadHeader("too small"))?;
            header
        };

        if header[0] != 0 {
            return Err(Error::BadHeader("magic byte 0"));
        }

        if header[74] != 0 {
            return Err(Error::BadHeader("magic byte 74"));
        }

        if &header[102..106] == b"mBIN" {
            return Self::build(data, &header, Version::V3);
        }

        // Some MacBinary II encoders left the checksum empty, so a matching
        // non-zero checksum is a true positive but zero needs the version
        // bytes as a tie-breaker
        let v2_checksum = BigEndian::read_u16(&header[124..]);
        if (v2_checksum != 0 && checksum_x25(&header[0..124]) == v2_checksum) ||
           (v2_checksum == 0 && header[122] == 129 && header[123] == 129) {
            return Self::build(data, &header, Version::V2);
        }

        if header[82] != 0 {
            return Err(Error::BadHeader("magic byte 82"));
        }

        for &byte in &header[101..=125] {
            if byte != 0 {
                return Err(Error::BadHeader("padding"));
            }
        }

        if header[1] < 1 || header[1] > 63 {
            return Err(Error::BadHeader("filename length"));
        }

        let data_size = BigEndian::read_u32(&header[83..]);
        let resource_size = BigEndian::read_u32(&header[87..]);

        if data_size > 0x7f_ffff || resource_size > 0x7f_ffff || (data_size == 0 && resource_size == 0) {
            return Err(Error::BadHeader("fork length"));
        }

        Self::build(data, &header, Version::V1)
    }

    #[must_use]
    pub fn name(&self) -> &PString {
        &self.name
    }

    #[must_use]
    pub fn finder_info(&self) -> FinderInfo {
        self.finder_info
    }

    #[must_use]
    pub fn data_fork(&self) -> Option<&SharedStream<T>> {
        self.data_fork.as_ref()
    }

    #[must_use]
    pub fn resource_fork(&self) -> Option<&SharedStream<T>> {
        self.resource_fork.as_ref()
    }

    fn build(data: T, header: &[u8; 128], version: Version) -> Result<Self> {
        const BLOCK_SIZE: u64 = 128;
        const HEADER_SIZE: u64 = 128;

        let secondary_header_size = if version == Version::V1 {
            0
        } else {
            align_block(u64::from(BigEndian::read_u16(&header[120..])), BLOCK_SIZE)
        };
        let aligned_header_size = HEADER_SIZE + secondary_header_size;

        let name_len = usize::from(header[1]).min(63);
        let name = PString::from(&header[2..2 + name_len]);

        let mut file_type = [0; 4];
        let mut creator = [0; 4];
        file_type.copy_from_slice(&header[65..69]);
        creator.copy_from_slice(&header[69..73]);

        let data_fork_size = u64::from(BigEndian::read_u32(&header[83..]));
        let resource_fork_size = u64::from(BigEndian::read_u32(&header[87..]));

        let input = SharedStream::new(data)?;
        let len = input.clone().len()?;

        let data_fork_start = aligned_header_size;
        let data_fork_end = data_fork_start + data_fork_size;
        let resource_fork_start = aligned_header_size + align_block(data_fork_size, BLOCK_SIZE);
        let resource_fork_end = resource_fork_start + resource_fork_size;

        if data_fork_end > len || resource_fork_end > len {
            return Err(Error::BadHeader("fork extent"));
        }

        let data_fork = if data_fork_size == 0 {
            None
        } else {
            Some(input.substream(data_fork_start, data_fork_end))
        };
        let resource_fork = if resource_fork_size == 0 {
            None
        } else {
            Some(input.substream(resource_fork_start, resource_fork_end))
        };

        Ok(Self {
            name,
            finder_info: FinderInfo::new(&file_type, &creator),
            data_fork,
            resource_fork,
        })
    }
}

fn align_block(value: u64, block: u64) -> u64 {
    (value + block - 1) / block * block
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use super::*;

    fn v2_envelope(data_fork: &[u8], resource_fork: &[u8]) -> Vec<u8> {
        let mut header = [0u8; 128];
        header[1] = 4;
        header[2..6].copy_from_slice(b"test");
        header[65..69].copy_from_slice(b"TEXT");
        header[69..73].copy_from_slice(b"ttxt");
        BigEndian::write_u32(&mut header[83..], data_fork.len() as u32);
        BigEndian::write_u32(&mut header[87..], resource_fork.len() as u32);
        header[122] = 129;
        header[123] = 129;
        let checksum = checksum_x25(&header[0..124]);
        BigEndian::write_u16(&mut header[124..], checksum);

        let mut out = header.to_vec();
        out.extend_from_slice(data_fork);
        out.resize(out.len() + (128 - data_fork.len() % 128) % 128, 0);
        out.extend_from_slice(resource_fork);
        out
    }

    #[test]
    fn v2_forks_are_reframed() {
        let envelope = v2_envelope(b"data!", b"rsrc");
        let parsed = MacBinary::new(Cursor::new(envelope)).unwrap();
        assert_eq!(parsed.name().to_string_lossy(), "test");
        assert_eq!(parsed.finder_info().creator.as_bytes(), b"ttxt");

        let mut data = Vec::new();
        parsed.data_fork().unwrap().clone().read_to_end(&mut data).unwrap();
        assert_eq!(data, b"data!");

        let mut rsrc = Vec::new();
        parsed.resource_fork().unwrap().clone().read_to_end(&mut rsrc).unwrap();
        assert_eq!(rsrc, b"rsrc");
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(MacBinary::new(Cursor::new(vec![1u8; 256])).is_err());
        assert!(MacBinary::new(Cursor::new(vec![0u8; 64])).is_err());
    }
}
