//! Resource fork map walking against synthetic forks.

use libcommon::InputStream;
use libmactoolbox::resources::Fork;
use std::collections::BTreeMap;
use std::io::Cursor;

/// Builds a resource fork holding the given `(type, id, data)` triples.
fn build_fork(resources: &[(&[u8; 4], i16, &[u8])]) -> Vec<u8> {
    let mut data_area = Vec::new();
    let mut offsets = Vec::new();
    for (_, _, data) in resources {
        offsets.push(data_area.len() as u32);
        data_area.extend_from_slice(&(data.len() as u32).to_be_bytes());
        data_area.extend_from_slice(data);
    }

    let mut kinds: BTreeMap<[u8; 4], Vec<(i16, u32)>> = BTreeMap::new();
    for (index, (os_type, id, _)) in resources.iter().enumerate() {
        kinds.entry(**os_type).or_default().push((*id, offsets[index]));
    }

    let num_types = kinds.len();
    let type_list_size = 2 + 8 * num_types;
    let num_refs: usize = kinds.values().map(Vec::len).sum();
    let map_len = 24 + 4 + type_list_size + 12 * num_refs;

    let data_offset = 16u32;
    let map_offset = data_offset + data_area.len() as u32;

    let mut out = Vec::new();
    out.extend_from_slice(&data_offset.to_be_bytes());
    out.extend_from_slice(&map_offset.to_be_bytes());
    out.extend_from_slice(&(data_area.len() as u32).to_be_bytes());
    out.extend_from_slice(&(map_len as u32).to_be_bytes());
    out.extend_from_slice(&data_area);

    // map header
    out.extend_from_slice(&[0; 24]);
    out.extend_from_slice(&28u16.to_be_bytes()); // type list offset
    out.extend_from_slice(&(map_len as u16).to_be_bytes()); // name list offset: none
    out.extend_from_slice(&((num_types as u16).wrapping_sub(1)).to_be_bytes());

    // type records, then reference lists
    let mut ref_offset = 2 + 8 * num_types;
    for (os_type, refs) in &kinds {
        out.extend_from_slice(os_type);
        out.extend_from_slice(&((refs.len() as u16) - 1).to_be_bytes());
        out.extend_from_slice(&(ref_offset as u16).to_be_bytes());
        ref_offset += 12 * refs.len();
    }
    for refs in kinds.values() {
        for (id, offset) in refs {
            out.extend_from_slice(&id.to_be_bytes());
            out.extend_from_slice(&(-1i16).to_be_bytes());
            out.extend_from_slice(&offset.to_be_bytes());
            out.extend_from_slice(&[0; 4]);
        }
    }
    out
}

fn open(data: Vec<u8>) -> Fork<Cursor<Vec<u8>>> {
    Fork::new(InputStream::new(Cursor::new(data)).unwrap()).unwrap()
}

#[test]
fn version_resource_list() {
    let fork = open(build_fork(&[
        (b"vers", 1, b"\x01\x00\x00\x00\x00\x00\x031.0\x04test"),
    ]));

    let versions = fork.get_version_list();
    assert_eq!(versions.len(), 1);
    let vers = &versions[0];
    assert_eq!(vers.id, 1);
    assert_eq!(vers.major, 1);
    assert_eq!(vers.minor, 0);
    assert_eq!(vers.version_string, "1.0");
    assert_eq!(vers.short_string, "test");
}

#[test]
fn multiple_types_and_ids() {
    let fork = open(build_fork(&[
        (b"STR ", -16396, b"\x05Write"),
        (b"STR ", 128, b"\x02ok"),
        (b"styl", 128, b"\x00\x00"),
    ]));

    assert_eq!(fork.count(b"STR "), 2);
    assert!(fork.has_entry(b"styl", 128));
    assert_eq!(fork.get_string(-16396).unwrap().to_string_lossy(), "Write");
    assert_eq!(fork.get_string(128).unwrap().to_string_lossy(), "ok");

    let item = fork.entry(b"styl", 128).unwrap();
    assert_eq!(fork.load(item).unwrap(), b"\x00\x00");
}

#[test]
fn blob_reads_are_bounds_checked() {
    // declare a blob longer than the fork
    let mut data = build_fork(&[(b"STR ", 0, b"xx")]);
    let blob_length_at = 16;
    data[blob_length_at..blob_length_at + 4].copy_from_slice(&0x1000u32.to_be_bytes());
    let fork = open(data);
    let item = fork.entry(b"STR ", 0).unwrap();
    assert!(fork.load(item).is_err());
}
