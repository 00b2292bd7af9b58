//! Reader for Microsoft OLE2 compound files.
//!
//! A compound file is a little filesystem in a file: a header, a chain of
//! allocation tables (DIFAT, FAT and MiniFAT) and a directory tree whose
//! stream entries point at sector chains. This is the one little-endian
//! surface of the library; everything Macintosh is big-endian.

use byteorder::{LittleEndian, ReadBytesExt};
use libcommon::{SeekExt, SharedStream};
use std::collections::HashSet;
use std::io::{self, Read, Seek, SeekFrom};
use unicase::Ascii;

pub const MAGIC: [u8; 8] = [0xd0, 0xcf, 0x11, 0xe0, 0xa1, 0xb1, 0x1a, 0xe1];

/// Sector values at or above this collapse to end-of-chain.
const EOF_SECTOR: u32 = 0xffff_fffc;

const DIFAT_HEAD_LEN: usize = 109;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("not an OLE compound file")]
    NotOle,
    #[error("bad header: {0}")]
    BadHeader(&'static str),
    #[error("cycle detected in sector chain")]
    CycleDetected,
    #[error("truncated compound file")]
    Truncated,
    #[error("entry {0:?} not found")]
    NotFound(String),
    #[error("entry {0:?} is not a stream")]
    NotAStream(String),
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Returns whether the given bytes begin with the compound-file magic.
#[must_use]
pub fn is_ole(data: &[u8]) -> bool {
    data.len() >= MAGIC.len() && data[0..8] == MAGIC
}

#[derive(Debug)]
struct Header {
    big_size: u64,
    small_size: u64,
    num_fat: u32,
    dirent_start: u32,
    mini_cutoff: u32,
    minifat_start: u32,
    difat_start: u32,
    num_difat: u32,
    difat_head: Vec<u32>,
}

impl Header {
    fn read<T: Read + Seek>(input: &mut SharedStream<T>) -> Result<Self> {
        if input.len()? < 512 {
            return Err(Error::NotOle);
        }
        input.reset()?;
        let mut magic = [0; 8];
        input.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(Error::NotOle);
        }

        input.seek(SeekFrom::Start(0x1e))?;
        let big_shift = input.read_u16::<LittleEndian>()?;
        if !(6..=30).contains(&big_shift) {
            return Err(Error::BadHeader("sector shift"));
        }
        let small_shift = input.read_u16::<LittleEndian>()?;
        if small_shift >= big_shift {
            return Err(Error::BadHeader("mini sector shift"));
        }
        let big_size = 1_u64 << big_shift;
        let small_size = 1_u64 << small_shift;

        input.seek(SeekFrom::Start(0x2c))?;
        let num_fat = input.read_u32::<LittleEndian>()?;
        let dirent_start = input.read_u32::<LittleEndian>()?;
        input.seek(SeekFrom::Start(0x38))?;
        let mini_cutoff = input.read_u32::<LittleEndian>()?;
        let minifat_start = input.read_u32::<LittleEndian>()?;
        let _num_minifat = input.read_u32::<LittleEndian>()?;
        let difat_start = input.read_u32::<LittleEndian>()?;
        let num_difat = input.read_u32::<LittleEndian>()?;

        // a wrong threshold detects most forgeries
        if mini_cutoff != 4096 {
            return Err(Error::BadHeader("mini stream cutoff"));
        }
        if num_fat == 0
            || (num_fat <= DIFAT_HEAD_LEN as u32 && num_difat != 0)
            || (num_fat > DIFAT_HEAD_LEN as u32
                && u64::from(num_fat) > u64::from(num_difat) * (big_size / 4 - 1) + DIFAT_HEAD_LEN as u64)
        {
            return Err(Error::BadHeader("FAT sector count"));
        }

        let head_len = (num_fat as usize).min(DIFAT_HEAD_LEN);
        let mut difat_head = Vec::with_capacity(head_len);
        for _ in 0..head_len {
            difat_head.push(input.read_u32::<LittleEndian>()?);
        }

        Ok(Self {
            big_size,
            small_size,
            num_fat,
            dirent_start,
            mini_cutoff,
            minifat_start,
            difat_start,
            num_difat,
            difat_head,
        })
    }

    fn big_block_pos(&self, sector: u32) -> u64 {
        (u64::from(sector) + 1) * self.big_size
    }
}

#[derive(Debug, Default)]
struct AllocTable {
    data: Vec<u32>,
}

impl AllocTable {
    /// Follows a sector chain from `start`. Revisiting a sector is a cycle.
    fn follow(&self, start: u32) -> Result<Vec<u32>> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut sector = start;
        while (sector as usize) < self.data.len() && sector < EOF_SECTOR {
            if !seen.insert(sector) {
                return Err(Error::CycleDetected);
            }
            chain.push(sector);
            sector = self.data[sector as usize];
        }
        Ok(chain)
    }
}

/// Directory entry kinds: `1` storage, `2` stream, `5` root.
const KIND_STORAGE: u8 = 1;
const KIND_STREAM: u8 = 2;
const KIND_ROOT: u8 = 5;

const FREE: u32 = 0xffff_ffff;

#[derive(Clone, Debug)]
pub struct DirEntry {
    pub name: String,
    kind: u8,
    left: u32,
    right: u32,
    child: u32,
    pub clsid: [u32; 4],
    start: u32,
    size: u32,
    valid: bool,
}

impl DirEntry {
    fn read(raw: &[u8; 128]) -> Self {
        let name_len = (u16::from_le_bytes([raw[0x40], raw[0x41]]) as usize).min(64);
        let kind = raw[0x42];

        // names are UTF-16; legacy producers only use the low bytes. A
        // single `R` high byte with a 2-byte name marks a Mac root entry.
        let mut name = String::new();
        let mut pos = 0;
        while pos + 1 < name_len {
            let value = u16::from_le_bytes([raw[pos], raw[pos + 1]]);
            if value == 0 {
                break;
            }
            if value == 0x5200 && name_len == 2 && kind == KIND_ROOT {
                name.push('R');
                break;
            }
            name.push(char::from(value as u8));
            pos += 2;
        }

        let read_u32 = |at: usize| u32::from_le_bytes([raw[at], raw[at + 1], raw[at + 2], raw[at + 3]]);
        let left = read_u32(0x44);
        let right = read_u32(0x48);
        let child = read_u32(0x4c);
        let clsid = [read_u32(0x50), read_u32(0x54), read_u32(0x58), read_u32(0x5c)];
        let start = read_u32(0x74);
        let size = read_u32(0x78);

        let valid = (kind == KIND_STORAGE || kind == KIND_STREAM || kind == KIND_ROOT)
            && name_len >= 1;

        Self { name, kind, left, right, child, clsid, start, size, valid }
    }

    #[must_use]
    pub fn is_storage(&self) -> bool {
        self.kind == KIND_STORAGE || self.kind == KIND_ROOT
    }

    #[must_use]
    pub fn is_stream(&self) -> bool {
        self.kind == KIND_STREAM
    }

    #[must_use]
    pub fn size(&self) -> u32 {
        self.size
    }
}

#[derive(Debug, Default)]
struct DirTree {
    entries: Vec<DirEntry>,
}

impl DirTree {
    fn entry(&self, index: u32) -> Option<&DirEntry> {
        self.entries.get(index as usize)
    }

    /// Resolves a `/`-separated path to an entry index.
    fn index(&self, path: &str) -> Result<u32> {
        if path.is_empty() {
            return Err(Error::NotFound(path.to_string()));
        }
        if path == "/" {
            return Ok(0);
        }

        let mut index = 0;
        for component in path.split('/').filter(|component| !component.is_empty()) {
            index = self
                .find_child(index, component)?
                .ok_or_else(|| Error::NotFound(path.to_string()))?;
        }
        Ok(index)
    }

    /// Finds a child of `index` by name, matching case-insensitively per
    /// the directory ordering key. Stored names may carry a leading
    /// control byte (`\x01CompObj`); it does not participate in matching.
    fn find_child(&self, index: u32, name: &str) -> Result<Option<u32>> {
        let parent = match self.entry(index) {
            Some(entry) if entry.valid => entry,
            _ => return Ok(None),
        };
        let mut siblings = Vec::new();
        let mut seen = HashSet::new();
        self.collect_siblings(parent.child, &mut seen, &mut siblings)?;

        let wanted = Ascii::new(strip_marker(name));
        Ok(siblings
            .into_iter()
            .find(|&sibling| {
                self.entry(sibling)
                    .map_or(false, |entry| Ascii::new(strip_marker(&entry.name)) == wanted)
            }))
    }

    /// Walks the sibling tree rooted at `index`. An entry reachable twice
    /// means the tree has a cycle.
    fn collect_siblings(&self, index: u32, seen: &mut HashSet<u32>, out: &mut Vec<u32>) -> Result<()> {
        if index == 0 || index == FREE || (index as usize) >= self.entries.len() {
            return Ok(());
        }
        if !seen.insert(index) {
            return Err(Error::CycleDetected);
        }
        let entry = match self.entry(index) {
            Some(entry) => entry,
            None => return Ok(()),
        };
        self.collect_siblings(entry.left, seen, out)?;
        out.push(index);
        self.collect_siblings(entry.right, seen, out)?;
        Ok(())
    }
}

fn strip_marker(name: &str) -> &str {
    name.strip_prefix(|c: char| c < ' ').unwrap_or(name)
}

/// An open compound file.
#[derive(Debug)]
pub struct Storage<T: Read + Seek> {
    input: SharedStream<T>,
    header: Header,
    fat: AllocTable,
    minifat: AllocTable,
    dir: DirTree,
    small_chain: Vec<u32>,
}

impl<T: Read + Seek> Storage<T> {
    pub fn new(input: T) -> Result<Self> {
        Self::from_shared(SharedStream::new(input)?)
    }

    pub fn from_shared(mut input: SharedStream<T>) -> Result<Self> {
        let header = Header::read(&mut input)?;
        let (fat, minifat) = Self::read_alloc_tables(&mut input, &header)?;
        let dir = Self::read_dir_tree(&mut input, &header, &fat)?;

        let root = dir.entry(0).ok_or(Error::Truncated)?;
        if root.kind != KIND_ROOT {
            return Err(Error::BadHeader("root entry"));
        }
        let small_chain = fat.follow(root.start)?;

        Ok(Self { input, header, fat, minifat, dir, small_chain })
    }

    fn read_alloc_tables(
        input: &mut SharedStream<T>,
        header: &Header,
    ) -> Result<(AllocTable, AllocTable)> {
        let per_sector = (header.big_size / 4) as usize;
        let num_fat = header.num_fat as usize;

        // locate every FAT sector: 109 indices in the header, the rest in
        // the chained DIFAT sectors
        let mut fat_sectors = header.difat_head.clone();
        if num_fat > DIFAT_HEAD_LEN {
            fat_sectors.resize(num_fat, EOF_SECTOR);
            let mut filled = DIFAT_HEAD_LEN;
            let mut sector = header.difat_start;
            let mut seen = HashSet::new();
            for _ in 0..header.num_difat {
                if sector >= EOF_SECTOR || !seen.insert(sector) {
                    return Err(Error::BadHeader("DIFAT chain"));
                }
                input.seek(SeekFrom::Start(header.big_block_pos(sector)))?;
                for slot in 0..per_sector {
                    let value = input.read_u32::<LittleEndian>().map_err(|_| Error::Truncated)?;
                    if slot == per_sector - 1 {
                        sector = value;
                    } else if filled < num_fat {
                        fat_sectors[filled] = value;
                        filled += 1;
                    }
                }
                if filled >= num_fat {
                    break;
                }
            }
            if filled != num_fat {
                return Err(Error::BadHeader("DIFAT chain too short"));
            }
        }

        let mut fat = AllocTable { data: Vec::with_capacity(num_fat * per_sector) };
        for &sector in &fat_sectors {
            input.seek(SeekFrom::Start(header.big_block_pos(sector)))?;
            for _ in 0..per_sector {
                let value = input.read_u32::<LittleEndian>().map_err(|_| Error::Truncated)?;
                fat.data.push(if value >= EOF_SECTOR { EOF_SECTOR } else { value });
            }
        }

        let mut minifat = AllocTable::default();
        for sector in fat.follow(header.minifat_start)? {
            input.seek(SeekFrom::Start(header.big_block_pos(sector)))?;
            for _ in 0..per_sector {
                let value = input.read_u32::<LittleEndian>().map_err(|_| Error::Truncated)?;
                minifat.data.push(if value >= EOF_SECTOR { EOF_SECTOR } else { value });
            }
        }

        Ok((fat, minifat))
    }

    fn read_dir_tree(
        input: &mut SharedStream<T>,
        header: &Header,
        fat: &AllocTable,
    ) -> Result<DirTree> {
        let blocks = fat.follow(header.dirent_start)?;
        if blocks.is_empty() {
            return Err(Error::BadHeader("directory chain"));
        }
        let per_sector = (header.big_size / 128) as usize;
        let mut entries = Vec::with_capacity(blocks.len() * per_sector);
        let mut raw = [0; 128];
        for sector in blocks {
            input.seek(SeekFrom::Start(header.big_block_pos(sector)))?;
            for _ in 0..per_sector {
                input.read_exact(&mut raw).map_err(|_| Error::Truncated)?;
                entries.push(DirEntry::read(&raw));
            }
        }
        Ok(DirTree { entries })
    }

    /// The root entry's CLSID.
    #[must_use]
    pub fn root_clsid(&self) -> [u32; 4] {
        self.dir.entry(0).map_or([0; 4], |entry| entry.clsid)
    }

    /// Looks up a directory entry by `/`-separated path.
    pub fn entry(&self, path: &str) -> Result<&DirEntry> {
        let index = self.dir.index(path)?;
        self.dir.entry(index).ok_or_else(|| Error::NotFound(path.to_string()))
    }

    /// Whether a stream exists at the given path.
    #[must_use]
    pub fn has_stream(&self, path: &str) -> bool {
        self.entry(path).map_or(false, DirEntry::is_stream)
    }

    /// Every stream path in the file, depth first.
    #[must_use]
    pub fn stream_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        let mut seen = HashSet::new();
        self.walk(0, "", &mut seen, &mut paths);
        paths
    }

    fn walk(&self, index: u32, prefix: &str, seen: &mut HashSet<u32>, out: &mut Vec<String>) {
        let entry = match self.dir.entry(index) {
            Some(entry) if entry.valid => entry,
            _ => return,
        };
        let mut siblings = Vec::new();
        let mut sibling_seen = HashSet::new();
        if self.dir.collect_siblings(entry.child, &mut sibling_seen, &mut siblings).is_err() {
            return;
        }
        for sibling in siblings {
            if !seen.insert(sibling) {
                continue;
            }
            let child = match self.dir.entry(sibling) {
                Some(child) => child,
                None => continue,
            };
            let path = format!("{}/{}", prefix, child.name);
            if child.is_stream() {
                out.push(path);
            } else {
                self.walk(sibling, &path, seen, out);
            }
        }
    }

    /// Loads the full contents of the stream at `path`.
    ///
    /// Streams below the mini-stream cutoff live in MiniFAT sectors inside
    /// the root entry's chain; the rest use full sectors. The trailing
    /// sector is truncated to the recorded size.
    pub fn stream(&self, path: &str) -> Result<Vec<u8>> {
        let index = self.dir.index(path)?;
        let entry = self.dir.entry(index).ok_or_else(|| Error::NotFound(path.to_string()))?;
        if !entry.is_stream() || entry.size == 0 {
            return Err(Error::NotAStream(path.to_string()));
        }

        let size = u64::from(entry.size);
        let use_big = size >= u64::from(self.header.mini_cutoff);
        let table = if use_big { &self.fat } else { &self.minifat };
        let block_size = if use_big { self.header.big_size } else { self.header.small_size };

        let mut out = Vec::with_capacity(entry.size as usize);
        let mut input = self.input.clone();
        for block in table.follow(entry.start)? {
            let pos = if use_big {
                self.header.big_block_pos(block)
            } else {
                self.small_block_pos(block).ok_or(Error::Truncated)?
            };
            input.seek(SeekFrom::Start(pos)).map_err(|_| Error::Truncated)?;
            let want = (size - out.len() as u64).min(block_size) as usize;
            let mut buf = vec![0; want];
            input.read_exact(&mut buf).map_err(|_| Error::Truncated)?;
            out.extend_from_slice(&buf);
            if out.len() as u64 >= size {
                break;
            }
        }
        if (out.len() as u64) < size {
            return Err(Error::Truncated);
        }
        Ok(out)
    }

    fn small_block_pos(&self, block: u32) -> Option<u64> {
        let per_big = self.header.big_size / self.header.small_size;
        let big_index = u64::from(block) / per_big;
        let offset = (u64::from(block) % per_big) * self.header.small_size;
        let sector = *self.small_chain.get(big_index as usize)?;
        Some(self.header.big_block_pos(sector) + offset)
    }

    /// Identifies the producing application from the root entry's CLSID.
    #[must_use]
    pub fn root_clsid_label(&self) -> Option<&'static str> {
        clsid_label(&self.root_clsid())
    }

    /// Identifies the producing application from the CLSID embedded in the
    /// `/CompObj` stream.
    #[must_use]
    pub fn comp_obj_label(&self) -> Option<&'static str> {
        let data = self.stream("/CompObj").ok()?;
        if data.len() < 28 {
            return None;
        }
        let read_u32 = |at: usize| u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]]);
        let clsid = [read_u32(12), read_u32(16), read_u32(20), read_u32(24)];
        clsid_label(&clsid)
    }
}

/// Maps a CLSID to a producer label.
///
/// Only the standard `…-0000-0000-C000-000000000046` family is accepted;
/// the first word selects the application.
#[allow(clippy::too_many_lines)]
#[must_use]
pub fn clsid_label(clsid: &[u32; 4]) -> Option<&'static str> {
    if clsid[1] != 0 || clsid[2] != 0xC0 || clsid[3] != 0x4600_0000 {
        return None;
    }

    Some(match clsid[0] {
        0x0000_0319 => "OLE file(EMH-picture?)", // Enhanced Metafile add-on

        0x0002_0906 => "OLE file(MSWord mac)",
        0x0002_1290 => "OLE file(MSClipArtGalley2)",
        0x0002_12F0 => "OLE file(MSWordArt)",
        0x0002_1302 => "OLE file(MSWorksWPDoc)",

        // MS Apps
        0x0003_0000 => "OLE file(ExcelWorksheet)",
        0x0003_0001 => "OLE file(ExcelChart)",
        0x0003_0002 => "OLE file(ExcelMacrosheet)",
        0x0003_0003 => "OLE file(WordDocument)",
        0x0003_0004 => "OLE file(MSPowerPoint)",
        0x0003_0005 => "OLE file(MSPowerPointSho)",
        0x0003_0006 => "OLE file(MSGraph)",
        0x0003_0007 => "OLE file(MSDraw)",
        0x0003_0008 => "OLE file(Note-It)",
        0x0003_0009 => "OLE file(WordArt)",
        0x0003_000a => "OLE file(PBrush)",
        0x0003_000b => "OLE file(Microsoft Equation)",
        0x0003_000c => "OLE file(Package)",
        0x0003_000d => "OLE file(SoundRec)",
        0x0003_000e => "OLE file(MPlayer)",
        // MS demos
        0x0003_000f => "OLE file(ServerDemo)",
        0x0003_0010 => "OLE file(Srtest)",
        0x0003_0011 => "OLE file(SrtInv)",
        0x0003_0012 => "OLE file(OleDemo)",

        // Coromandel
        0x0003_0013 => "OLE file(CoromandelIntegra)",
        0x0003_0014 => "OLE file(CoromandelObjServer)",

        // 3-d Visions Corp
        0x0003_0015 => "OLE file(StanfordGraphics)",

        // Deltapoint
        0x0003_0016 => "OLE file(DGraphCHART)",
        0x0003_0017 => "OLE file(DGraphDATA)",

        // Corel
        0x0003_0018 => "OLE file(CorelPhotoPaint)",
        0x0003_0019 => "OLE file(CorelShow)",
        0x0003_001a => "OLE file(CorelChart)",
        0x0003_001b => "OLE file(CorelDraw)",

        // Inset Systems
        0x0003_001c => "OLE file(HJWIN1.0)",

        // Mark V Systems
        0x0003_001d => "OLE file(MarkV ObjMakerOLE)",

        // IdentiTech
        0x0003_001e => "OLE file(IdentiTech FYI)",
        0x0003_001f => "OLE file(IdentiTech FYIView)",

        // Inventa Corporation
        0x0003_0020 => "OLE file(Stickynote)",

        // ShapeWare Corp.
        0x0003_0021 => "OLE file(ShapewareVISIO10)",
        0x0003_0022 => "OLE file(Shapeware ImportServer)",

        // test apps
        0x0003_0023 => "OLE file(SrvrTest)",
        0x0003_0025 => "OLE file(Cltest)",

        0x0003_0026 => "OLE file(MS_ClipArt_Gallery)",
        0x0003_0027 => "OLE file(MSProject)",
        0x0003_0028 => "OLE file(MSWorksChart)",
        0x0003_0029 => "OLE file(MSWorksSpreadsheet)",

        // AFX apps
        0x0003_002A => "OLE file(MinSvr)",
        0x0003_002B => "OLE file(HierarchyList)",
        0x0003_002C => "OLE file(BibRef)",
        0x0003_002D => "OLE file(MinSvrMI)",
        0x0003_002E => "OLE file(TestServ)",

        0x0003_002F => "OLE file(AmiProDocument)",

        // WordPerfect Presentations for Windows
        0x0003_0030 => "OLE file(WPGraphics)",
        0x0003_0031 => "OLE file(WPCharts)",

        // MicroGrafx
        0x0003_0032 => "OLE file(Charisma)",
        0x0003_0033 => "OLE file(Charisma_30)",
        0x0003_0034 => "OLE file(CharPres_30)",
        0x0003_0035 => "OLE file(MicroGrafx Draw)",
        0x0003_0036 => "OLE file(MicroGrafx Designer_40)",

        // Star Division
        0x0004_24CA => "OLE file(StarMath)",
        0x0004_3AD2 => "OLE file(Star FontWork)",
        0x0004_56EE => "OLE file(StarMath2)",

        _ => return None,
    })
}
