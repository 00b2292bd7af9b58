//! The input facade: one addressable data/resource pair per document,
//! however the file reached the host filesystem.
//!
//! Given a path, the facade opens the data fork, then hunts for the
//! resource fork and FinderInfo through the auxiliary-file cascade:
//! a sibling AppleDouble (`._NAME`), the archive flavour
//! (`__MACOSX/._NAME`), then PC Exchange (`FINDER.DAT` plus
//! `RESOURCE.FRK/NAME`). MacBinary envelopes are split into their forks,
//! and an OLE2 data fork is re-exposed as named streams.

use crate::ole::Storage;
use crate::probe::{self, Detection};
use libcommon::{DebugFile, InputStream, Reader, SharedStream, StreamError};
use libmactoolbox::files::{AppleDouble, FinderDat, FinderInfo, MacBinary};
use libmactoolbox::resources::Fork;
use std::fs;
use std::io;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("stream error: {0}")]
    Stream(#[from] StreamError),
    #[error("empty file")]
    Empty,
}

pub type Result<T> = std::result::Result<T, Error>;

/// An opened document: data fork, optional resource fork, optional
/// FinderInfo and, when the data fork is a compound file, its storage.
#[derive(Debug)]
pub struct InputFile {
    name: String,
    data: InputStream<Box<dyn Reader>>,
    resource_fork: Option<Fork<Box<dyn Reader>>>,
    finder_info: Option<FinderInfo>,
    ole: Option<Storage<Box<dyn Reader>>>,
}

impl InputFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_log(path, DebugFile::disabled())
    }

    pub fn open_with_log(path: impl AsRef<Path>, log: DebugFile) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map_or_else(String::new, |name| name.to_string_lossy().into_owned());

        let file: Box<dyn Reader> = Box::new(fs::File::open(path)?);
        let data = SharedStream::new(file)?;

        // A MacBinary envelope carries both forks and the FinderInfo on
        // its own; nothing else to discover.
        if let Ok(envelope) = MacBinary::new(data.clone()) {
            if let Some(data_fork) = envelope.data_fork() {
                let data_fork: Box<dyn Reader> = Box::new(data_fork.clone());
                let resource_fork = envelope.resource_fork().map(|fork| {
                    let fork: Box<dyn Reader> = Box::new(fork.clone());
                    fork
                });
                return Self::from_streams_inner(
                    envelope.name().to_string_lossy(),
                    data_fork,
                    resource_fork,
                    Some(envelope.finder_info()),
                    log,
                );
            }
        }

        let mut resource_fork = None;
        let mut finder_info = None;
        if let Some(double) = Self::find_apple_double(path) {
            resource_fork = double.resource_fork().map(|fork| {
                let fork: Box<dyn Reader> = Box::new(fork.clone());
                fork
            });
            finder_info = double.finder_info();
        } else if let Some((info, fork)) = Self::find_pc_exchange(path, &name) {
            finder_info = info;
            resource_fork = fork;
        }

        let data: Box<dyn Reader> = Box::new(data);
        Self::from_streams_inner(name, data, resource_fork, finder_info, log)
    }

    /// Builds an input from already-open streams, bypassing filesystem
    /// discovery.
    pub fn from_streams(
        name: impl Into<String>,
        data: Box<dyn Reader>,
        resource_fork: Option<Box<dyn Reader>>,
        finder_info: Option<FinderInfo>,
    ) -> Result<Self> {
        Self::from_streams_inner(name.into(), data, resource_fork, finder_info, DebugFile::disabled())
    }

    fn from_streams_inner(
        name: String,
        data: Box<dyn Reader>,
        resource_fork: Option<Box<dyn Reader>>,
        finder_info: Option<FinderInfo>,
        log: DebugFile,
    ) -> Result<Self> {
        let mut data = InputStream::with_log(data, log.clone())?;

        let resource_fork = resource_fork.and_then(|fork| {
            let input = InputStream::with_log(fork, log.clone()).ok()?;
            Fork::new(input).ok()
        });

        let ole = Self::open_ole(&mut data);

        Ok(Self { name, data, resource_fork, finder_info, ole })
    }

    fn open_ole(data: &mut InputStream<Box<dyn Reader>>) -> Option<Storage<Box<dyn Reader>>> {
        let mut magic = [0; 8];
        data.seek(io::SeekFrom::Start(0)).ok()?;
        io::Read::read_exact(data, &mut magic).ok()?;
        data.seek(io::SeekFrom::Start(0)).ok()?;
        if !crate::ole::is_ole(&magic) {
            return None;
        }
        Storage::from_shared(data.shared().clone()).ok()
    }

    fn find_apple_double(path: &Path) -> Option<AppleDouble<Box<dyn Reader>>> {
        let file_name = path.file_name()?.to_string_lossy().into_owned();
        let dir = path.parent().unwrap_or_else(|| Path::new("."));

        let candidates = [
            dir.join(format!("._{}", file_name)),
            dir.join("__MACOSX").join(format!("._{}", file_name)),
        ];
        for candidate in &candidates {
            let file = match fs::File::open(candidate) {
                Ok(file) => file,
                Err(_) => continue,
            };
            let file: Box<dyn Reader> = Box::new(file);
            if let Ok(double) = AppleDouble::new(file) {
                return Some(double);
            }
        }
        None
    }

    #[allow(clippy::type_complexity)]
    fn find_pc_exchange(
        path: &Path,
        name: &str,
    ) -> Option<(Option<FinderInfo>, Option<Box<dyn Reader>>)> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));

        let finder_info = fs::File::open(dir.join("FINDER.DAT"))
            .ok()
            .and_then(|file| FinderDat::new(file).ok())
            .and_then(|dat| dat.info_for(name));

        let resource_fork = fs::File::open(dir.join("RESOURCE.FRK").join(name))
            .ok()
            .map(|file| {
                let file: Box<dyn Reader> = Box::new(file);
                file
            });

        if finder_info.is_none() && resource_fork.is_none() {
            return None;
        }
        Some((finder_info, resource_fork))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&mut self) -> &mut InputStream<Box<dyn Reader>> {
        &mut self.data
    }

    /// A fresh cursor over the data fork.
    pub fn data_stream(&self) -> Result<InputStream<Box<dyn Reader>>> {
        Ok(self.data.sub_stream(0, self.data.length())?)
    }

    #[must_use]
    pub fn resource_fork(&self) -> Option<&Fork<Box<dyn Reader>>> {
        self.resource_fork.as_ref()
    }

    #[must_use]
    pub fn finder_info(&self) -> Option<FinderInfo> {
        self.finder_info
    }

    /// The compound-file storage, when the data fork is an OLE2 container.
    #[must_use]
    pub fn ole(&self) -> Option<&Storage<Box<dyn Reader>>> {
        self.ole.as_ref()
    }

    /// Named streams re-exposed from the compound-file container.
    #[must_use]
    pub fn ole_stream_paths(&self) -> Vec<String> {
        self.ole.as_ref().map_or_else(Vec::new, Storage::stream_paths)
    }

    /// Runs the document-type probe: FinderInfo first, then data-fork
    /// magic. Ambiguous data-fork matches return several candidates.
    pub fn detect(&mut self) -> Vec<Detection> {
        if let Some(info) = self.finder_info {
            let fork = self.resource_fork.as_ref();
            let detection = probe::from_finder_info(info, || {
                fork.map_or(false, |fork| fork.has_entry(b"styl", 128))
            });
            if let Some(detection) = detection {
                return vec![detection];
            }
        }
        probe::from_data_fork(&mut self.data)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use super::*;

    fn boxed(data: Vec<u8>) -> Box<dyn Reader> {
        Box::new(Cursor::new(data))
    }

    #[test]
    fn from_streams_probes_the_data_fork() {
        let mut data = vec![0x02, 0x00, 0x00, 0x00, 0x42, 0x4f, 0x42, 0x4f];
        data.resize(32, 0);
        let mut input = InputFile::from_streams("test", boxed(data), None, None).unwrap();
        let detections = input.detect();
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].label, "ClarisWorks/AppleWorks");
    }

    #[test]
    fn finder_info_wins_over_data_magic() {
        let mut data = vec![0x02, 0x00, 0x00, 0x00, 0x42, 0x4f, 0x42, 0x4f];
        data.resize(32, 0);
        let mut input = InputFile::from_streams(
            "test",
            boxed(data),
            None,
            Some(FinderInfo::new(&*b"MBBT", &*b"MMBB")),
        )
        .unwrap();
        let detections = input.detect();
        assert_eq!(detections[0].label, "Mariner Write");
    }
}
