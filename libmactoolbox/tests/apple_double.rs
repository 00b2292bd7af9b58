//! AppleDouble round-trip coverage: parsing an encoded container recovers
//! the forks and FinderInfo byte for byte.

use libmactoolbox::files::{AppleDouble, FinderInfo};
use std::io::{Cursor, Read};

/// A minimal AppleDouble encoder for the three entry ids the parser
/// consumes. Writing AppleDouble is not a library feature, so the tests
/// carry their own.
fn encode(entries: &[(u32, &[u8])]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&0x0005_1607u32.to_be_bytes());
    out.extend_from_slice(&0x0002_0000u32.to_be_bytes());
    out.extend_from_slice(&[0; 16]);
    out.extend_from_slice(&(entries.len() as u16).to_be_bytes());

    let mut offset = 26 + 12 * entries.len() as u32;
    for (id, data) in entries {
        out.extend_from_slice(&id.to_be_bytes());
        out.extend_from_slice(&offset.to_be_bytes());
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        offset += data.len() as u32;
    }
    for (_, data) in entries {
        out.extend_from_slice(data);
    }
    out
}

fn read_all<T: Read>(mut input: T) -> Vec<u8> {
    let mut data = Vec::new();
    input.read_to_end(&mut data).unwrap();
    data
}

#[test]
fn round_trips_the_three_consumed_entries() {
    let mut finder_info = vec![0u8; 32];
    finder_info[0..4].copy_from_slice(b"CWWP");
    finder_info[4..8].copy_from_slice(b"BOBO");

    let data_fork = b"the data fork".as_ref();
    let resource_fork = b"resource map bytes".as_ref();
    let encoded = encode(&[
        (1, data_fork),
        (2, resource_fork),
        (9, &finder_info),
    ]);

    let parsed = AppleDouble::new(Cursor::new(encoded)).unwrap();
    assert_eq!(read_all(parsed.data_fork().unwrap().clone()), data_fork);
    assert_eq!(read_all(parsed.resource_fork().unwrap().clone()), resource_fork);
    assert_eq!(
        parsed.finder_info().unwrap(),
        FinderInfo::new(&*b"CWWP", &*b"BOBO"),
    );
}

#[test]
fn unknown_entry_ids_are_skipped() {
    let encoded = encode(&[
        (8, b"comment"),
        (2, b"rsrc"),
        (10, b"dates"),
    ]);
    let parsed = AppleDouble::new(Cursor::new(encoded)).unwrap();
    assert!(parsed.data_fork().is_none());
    assert_eq!(read_all(parsed.resource_fork().unwrap().clone()), b"rsrc");
}

#[test]
fn apple_single_magic_is_accepted() {
    let mut encoded = encode(&[(1, b"only data")]);
    encoded[3] = 0x00; // 0x00051600
    let parsed = AppleDouble::new(Cursor::new(encoded)).unwrap();
    assert_eq!(read_all(parsed.data_fork().unwrap().clone()), b"only data");
}

#[test]
fn real_name_is_decoded() {
    let encoded = encode(&[(3, b"Report"), (2, b"r")]);
    let parsed = AppleDouble::new(Cursor::new(encoded)).unwrap();
    assert_eq!(parsed.name().unwrap().to_string_lossy(), "Report");
}
