//! Reader for the [Mac Resource File] format.
//!
//! [Mac Resource File]: https://developer.apple.com/library/archive/documentation/mac/pdf/MoreMacintoshToolbox.pdf#page=151

use crate::types::{OsType, OsTypeReadExt, PString};
use byteorder::BigEndian;
use libcommon::InputStream;
use std::cell::RefCell;
use std::io::{Read, Seek, SeekFrom};
use super::{Error, Result, Version};

bitflags::bitflags! {
    /// The attribute flags of a single resource.
    pub struct ResourceFlags: u8 {
        /// Reserved; unused.
        const RESERVED            = 0x80;
        /// The resource should be loaded in the system heap.
        const LOAD_TO_SYSTEM_HEAP = 0x40;
        /// The resource may be paged out of memory.
        const PURGEABLE           = 0x20;
        /// The resource may not be moved in memory.
        const LOCKED              = 0x10;
        /// The resource is read-only.
        const READ_ONLY           = 0x08;
        /// The resource should be loaded as soon as the file is opened.
        const PRELOAD             = 0x04;
        /// An internal flag used by the Resource Manager.
        const CHANGED             = 0x02;
        /// The resource data is compressed.
        const COMPRESSED          = 0x01;
    }
}

/// One entry of the resource map.
#[derive(Clone, Debug)]
pub struct Item {
    pub os_type: OsType,
    pub id: i16,
    pub flags: ResourceFlags,
    name_offset: i16,
    /// Absolute offset of the length-prefixed data blob.
    data_offset: u64,
}

#[derive(Debug)]
struct Kind {
    os_type: OsType,
    items: Vec<Item>,
}

/// A Macintosh resource fork: a `(type, id)`-indexed map of typed blobs.
///
/// The map is walked eagerly at open and immutable afterwards; blob data is
/// read on demand and every offset is validated against the fork bounds
/// before use.
#[derive(Debug)]
pub struct Fork<T: Read + Seek> {
    input: RefCell<InputStream<T>>,
    kinds: Vec<Kind>,
    names: Vec<u8>,
    data_end: u64,
}

impl<T: Read + Seek> Fork<T> {
    pub fn new(mut input: InputStream<T>) -> Result<Self> {
        let fork_len = input.length();
        if fork_len < 16 {
            return Err(Error::ForkTooSmall(fork_len, 16));
        }

        input.seek(SeekFrom::Start(0))?;
        let data_offset = u64::from(input.read_u32()?);
        let map_offset = u64::from(input.read_u32()?);
        let data_len = u64::from(input.read_u32()?);
        let map_len = u64::from(input.read_u32()?);

        if map_len < 30 {
            return Err(Error::BadMapSize(map_len as u32));
        }
        let needed = (map_offset + map_len).max(data_offset + data_len);
        if fork_len < needed {
            return Err(Error::ForkTooSmall(fork_len, needed));
        }

        // The type list offset lives 24 bytes into the map, after the copy
        // of the header and the in-memory handle fields.
        input.seek(SeekFrom::Start(map_offset + 24))?;
        let type_list_offset = u64::from(input.read_u16()?);
        let name_list_offset = u64::from(input.read_u16()?);
        let num_types = input.read_u16()?;
        if type_list_offset + 2 > map_len || name_list_offset > map_len {
            return Err(Error::BadMapOffsets);
        }

        // 0xffff means an empty map
        let num_types = if num_types == 0xffff { 0 } else { u32::from(num_types) + 1 };
        if u64::from(num_types) * 8 + type_list_offset + 2 > map_len {
            return Err(Error::BadTypeList(num_types as u16));
        }

        let mut kinds = Vec::with_capacity(num_types as usize);
        for index in 0..num_types {
            input.seek(SeekFrom::Start(map_offset + type_list_offset + 2 + u64::from(index) * 8))?;
            let os_type = input.read_os_type::<BigEndian>().map_err(|_| Error::BadTypeList(index as u16))?;
            let count = u32::from(input.read_u16()?) + 1;
            let ref_offset = u64::from(input.read_u16()?);

            let refs_at = map_offset + type_list_offset + ref_offset;
            if refs_at + u64::from(count) * 12 > map_offset + map_len {
                return Err(Error::BadReferenceList(os_type));
            }

            let mut items = Vec::with_capacity(count as usize);
            input.seek(SeekFrom::Start(refs_at))?;
            for _ in 0..count {
                let id = input.read_i16()?;
                let name_offset = input.read_i16()?;
                // the top byte of the offset word holds the attributes
                let packed = input.read_u32()?;
                let flags = ResourceFlags::from_bits_truncate((packed >> 24) as u8);
                let data_offset = data_offset + u64::from(packed & 0x00ff_ffff);
                input.seek(SeekFrom::Current(4))?;
                if !input.check_pos(data_offset + 4) {
                    return Err(Error::BadData(os_type, id));
                }
                items.push(Item { os_type, id, flags, name_offset, data_offset });
            }
            kinds.push(Kind { os_type, items });
        }

        let names = if name_list_offset < map_len {
            input.seek(SeekFrom::Start(map_offset + name_list_offset))?;
            input.read_bytes((map_len - name_list_offset) as usize)?
        } else {
            Vec::new()
        };

        Ok(Self {
            input: RefCell::new(input),
            kinds,
            names,
            data_end: data_offset + data_len,
        })
    }

    /// The number of resources with the given type.
    pub fn count(&self, os_type: impl Into<OsType>) -> usize {
        self.find_kind(os_type).map_or(0, |kind| kind.items.len())
    }

    pub fn has_entry(&self, os_type: impl Into<OsType>, id: i16) -> bool {
        self.entry(os_type, id).is_some()
    }

    pub fn entry(&self, os_type: impl Into<OsType>, id: i16) -> Option<&Item> {
        self.find_kind(os_type)
            .and_then(|kind| kind.items.iter().find(|item| item.id == id))
    }

    pub fn entries(&self, os_type: impl Into<OsType>) -> &[Item] {
        self.find_kind(os_type).map_or(&[], |kind| kind.items.as_slice())
    }

    /// Iterates over every resource in map order.
    pub fn iter(&self) -> impl Iterator<Item = &Item> + '_ {
        self.kinds.iter().flat_map(|kind| kind.items.iter())
    }

    /// The name attached to a resource, if any.
    #[must_use]
    pub fn name_of(&self, item: &Item) -> Option<PString> {
        if item.name_offset < 0 {
            return None;
        }
        let start = item.name_offset as usize;
        let len = usize::from(*self.names.get(start)?);
        let name = self.names.get(start + 1..start + 1 + len)?;
        Some(PString::from(name))
    }

    /// Loads the data blob of a resource.
    pub fn load(&self, item: &Item) -> Result<Vec<u8>> {
        let mut input = self.input.borrow_mut();
        input.seek(SeekFrom::Start(item.data_offset))?;
        let size = u64::from(input.read_u32()?);
        if item.data_offset + 4 + size > self.data_end || !input.check_pos(item.data_offset + 4 + size) {
            return Err(Error::BadData(item.os_type, item.id));
        }
        Ok(input.read_bytes(size as usize)?)
    }

    /// A sub-stream over the data blob of a resource, sharing the fork's
    /// audit log.
    pub fn stream(&self, item: &Item) -> Result<InputStream<T>> {
        let mut input = self.input.borrow_mut();
        input.seek(SeekFrom::Start(item.data_offset))?;
        let size = u64::from(input.read_u32()?);
        if item.data_offset + 4 + size > self.data_end || !input.check_pos(item.data_offset + 4 + size) {
            return Err(Error::BadData(item.os_type, item.id));
        }
        Ok(input.sub_stream(item.data_offset + 4, item.data_offset + 4 + size)?)
    }

    /// Reads a `STR ` resource as a Pascal string.
    pub fn get_string(&self, id: i16) -> Option<PString> {
        let item = self.entry(b"STR ", id)?;
        let data = self.load(item).ok()?;
        let len = usize::from(*data.first()?);
        Some(PString::from(data.get(1..=len)?))
    }

    /// Reads every `vers` resource.
    pub fn get_version_list(&self) -> Vec<Version> {
        self.entries(b"vers")
            .iter()
            .filter_map(|item| {
                let data = self.load(item).ok()?;
                Version::read(item.id, &data).ok()
            })
            .collect()
    }

    fn find_kind(&self, os_type: impl Into<OsType>) -> Option<&Kind> {
        let os_type = os_type.into();
        self.kinds.iter().find(|kind| kind.os_type == os_type)
    }
}

#[cfg(test)]
mod tests {
    use libcommon::InputStream;
    use std::io::Cursor;
    use super::*;

    // A minimal fork holding one 'STR ' 128 resource whose blob is "\x02hi".
    fn tiny_fork() -> Vec<u8> {
        let mut data = Vec::new();
        // header: data at 16, map at 23
        data.extend_from_slice(&16u32.to_be_bytes());
        data.extend_from_slice(&23u32.to_be_bytes());
        data.extend_from_slice(&7u32.to_be_bytes());
        data.extend_from_slice(&50u32.to_be_bytes());
        // data area: one blob, length prefix + bytes
        data.extend_from_slice(&3u32.to_be_bytes());
        data.extend_from_slice(b"\x02hi");
        // map: header copy, handle, refnum and attrs, then the list offsets
        data.extend_from_slice(&[0; 24]);
        data.extend_from_slice(&28u16.to_be_bytes());
        data.extend_from_slice(&50u16.to_be_bytes());
        // one type
        data.extend_from_slice(&0u16.to_be_bytes());
        data.extend_from_slice(b"STR ");
        data.extend_from_slice(&0u16.to_be_bytes());
        data.extend_from_slice(&10u16.to_be_bytes());
        // one reference: id 128, no name, attrs 0, data offset 0
        data.extend_from_slice(&128i16.to_be_bytes());
        data.extend_from_slice(&(-1i16).to_be_bytes());
        data.extend_from_slice(&0u32.to_be_bytes());
        data.extend_from_slice(&0u32.to_be_bytes());
        data
    }

    #[test]
    fn map_walk_and_lookup() {
        let fork = Fork::new(InputStream::new(Cursor::new(tiny_fork())).unwrap()).unwrap();
        assert_eq!(fork.count(b"STR "), 1);
        assert!(fork.has_entry(b"STR ", 128));
        assert!(!fork.has_entry(b"STR ", 129));
        assert!(!fork.has_entry(b"styl", 128));
        assert_eq!(fork.iter().count(), 1);
    }

    #[test]
    fn string_resource() {
        let fork = Fork::new(InputStream::new(Cursor::new(tiny_fork())).unwrap()).unwrap();
        assert_eq!(fork.get_string(128).unwrap().to_string_lossy(), "hi");
        assert!(fork.get_string(127).is_none());
    }

    #[test]
    fn truncated_fork_is_rejected() {
        let mut data = tiny_fork();
        data.truncate(40);
        assert!(Fork::new(InputStream::new(Cursor::new(data)).unwrap()).is_err());
    }
}
