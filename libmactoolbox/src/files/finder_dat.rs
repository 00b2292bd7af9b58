//! PC Exchange metadata, written by classic Mac OS when copying files onto
//! FAT volumes.
//!
//! Each directory gets a hidden `FINDER.DAT` listing FinderInfo per file
//! and a `RESOURCE.FRK` sub-directory holding the resource forks under the
//! original file names.

use std::io::Read;
use super::{FinderInfo, Result};

const RECORD_SIZE: usize = 92;

#[derive(Debug)]
struct Record {
    name: Vec<u8>,
    info: FinderInfo,
}

/// A parsed `FINDER.DAT` table.
#[derive(Debug, Default)]
pub struct FinderDat {
    records: Vec<Record>,
}

impl FinderDat {
    pub fn new(mut input: impl Read) -> Result<Self> {
        let mut data = Vec::new();
        input.read_to_end(&mut data)?;

        let mut records = Vec::new();
        for chunk in data.chunks_exact(RECORD_SIZE) {
            let name_len = usize::from(chunk[0]).min(31);
            if name_len == 0 {
                continue;
            }
            let name = chunk[1..=name_len].to_vec();
            let info = match FinderInfo::from_bytes(&chunk[32..40]) {
                Some(info) => info,
                None => continue,
            };
            records.push(Record { name, info });
        }
        Ok(Self { records })
    }

    /// Looks up the FinderInfo recorded for `name`. FAT directory entries
    /// are case-preserving but case-insensitive, so the match is too.
    #[must_use]
    pub fn info_for(&self, name: &str) -> Option<FinderInfo> {
        self.records
            .iter()
            .find(|record| record.name.eq_ignore_ascii_case(name.as_bytes()))
            .map(|record| record.info)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, file_type: &[u8; 4], creator: &[u8; 4]) -> Vec<u8> {
        let mut chunk = vec![0; RECORD_SIZE];
        chunk[0] = name.len() as u8;
        chunk[1..=name.len()].copy_from_slice(name.as_bytes());
        chunk[32..36].copy_from_slice(file_type);
        chunk[36..40].copy_from_slice(creator);
        chunk
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let mut data = record("REPORT.CWK", b"CWWP", b"BOBO");
        data.extend(record("NOTES.TXT", b"TEXT", b"ttxt"));
        let dat = FinderDat::new(&data[..]).unwrap();

        let info = dat.info_for("report.cwk").unwrap();
        assert_eq!(info.creator.as_bytes(), b"BOBO");
        assert_eq!(info.file_type.as_bytes(), b"CWWP");
        assert!(dat.info_for("missing").is_none());
    }

    #[test]
    fn empty_records_are_skipped() {
        let data = vec![0; RECORD_SIZE * 2];
        let dat = FinderDat::new(&data[..]).unwrap();
        assert!(dat.is_empty());
    }
}
