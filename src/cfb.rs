//! Compound File Binary format MS-CFB

use std::fmt;

use encoding_rs::UTF_16LE;
use log::{debug, trace, warn};

use crate::utils::{read_int, read_u16, read_u32, read_usize, slice_at};

const OLE_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const END_OF_CHAIN: i64 = -2;
const HEADER_DIFAT_SLOTS: usize = 109;
const DIRECTORY_ENTRY_LEN: usize = 128;
const STREAM_ENTRY: u8 = 2;

/// A Cfb specific error
#[derive(Debug)]
pub enum CfbError {
    /// Signature mismatch, not a compound file
    Ole,
    /// Sector shift other than 9 (512 bytes) or 12 (4096 bytes)
    SectorShift(u16),
    /// A sector id points past the end of the file or of its table
    SectorOutOfRange {
        /// Sector id
        id: i64,
        /// Bound it exceeds
        bound: usize,
    },
    /// A sector chain loops onto itself
    CyclicChain {
        /// What the chain describes
        chain: &'static str,
    },
    /// Directory has no root entry
    EmptyRootDir,
}

impl fmt::Display for CfbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CfbError::Ole => write!(f, "Invalid OLE signature (not an office document?)"),
            CfbError::SectorShift(s) => {
                write!(f, "Invalid sector shift, expecting 0x09 or 0x0C, got {s:#x}")
            }
            CfbError::SectorOutOfRange { id, bound } => {
                write!(f, "Sector {id} is out of range (bound {bound})")
            }
            CfbError::CyclicChain { chain } => write!(f, "Cyclic sector chain in {chain}"),
            CfbError::EmptyRootDir => write!(f, "Empty Root directory"),
        }
    }
}

impl std::error::Error for CfbError {}

/// Whether `data` starts with the compound file signature
pub fn is_cfb(data: &[u8]) -> bool {
    data.starts_with(&OLE_SIGNATURE)
}

/// Fixed header fields
#[derive(Debug)]
struct Header {
    sector_size: usize,
    mini_sector_size: usize,
    fat_len: usize,
    dir_start: i64,
    mini_cutoff: usize,
    mini_fat_start: i64,
    mini_fat_len: usize,
    difat_start: i64,
    difat_len: usize,
}

impl Header {
    fn from_bytes(data: &[u8]) -> Result<Header, CfbError> {
        if !is_cfb(data) {
            return Err(CfbError::Ole);
        }
        let sector_shift = read_u16(data, 0x1E);
        if sector_shift != 9 && sector_shift != 12 {
            return Err(CfbError::SectorShift(sector_shift));
        }
        let mini_shift = read_u16(data, 0x20).min(sector_shift);
        Ok(Header {
            sector_size: 1 << sector_shift,
            mini_sector_size: 1 << mini_shift,
            fat_len: read_usize(data, 0x2C),
            dir_start: read_int(data, 0x30, 4),
            mini_cutoff: read_usize(data, 0x38),
            mini_fat_start: read_int(data, 0x3C, 4),
            mini_fat_len: read_usize(data, 0x40),
            difat_start: read_int(data, 0x44, 4),
            difat_len: read_usize(data, 0x48),
        })
    }

    /// File offset of a regular sector, the header occupies the first slot
    fn sector_offset(&self, id: i64) -> usize {
        (id as usize + 1) * self.sector_size
    }

    /// Sector ids holding the FAT, from the header slots then the master sectors
    fn fat_sector_ids(&self, data: &[u8]) -> Result<Vec<i64>, CfbError> {
        let mut ids: Vec<i64> = (0..self.fat_len.min(HEADER_DIFAT_SLOTS))
            .map(|i| read_int(data, 0x4C + 4 * i, 4))
            .collect();

        let mut remaining = self.fat_len.saturating_sub(HEADER_DIFAT_SLOTS);
        let mut master = self.difat_start;
        let per_sector = self.sector_size / 4 - 1;
        for _ in 0..self.difat_len {
            if remaining == 0 || master < 0 {
                break;
            }
            let pos = self.sector_offset(master);
            if pos >= data.len() {
                return Err(CfbError::SectorOutOfRange {
                    id: master,
                    bound: data.len(),
                });
            }
            let count = remaining.min(per_sector);
            ids.extend((0..count).map(|i| read_int(data, pos + 4 * i, 4)));
            remaining -= count;
            master = read_int(data, pos + self.sector_size - 4, 4);
        }
        if remaining > 0 {
            warn!("{remaining} FAT sectors are not referenced by the DIFAT");
        }
        Ok(ids)
    }
}

/// A directory entry
#[derive(Debug)]
struct Directory {
    name: String,
    typ: u8,
    start: i64,
    len: usize,
}

impl Directory {
    fn from_slice(buf: &[u8]) -> Directory {
        let name_len = (read_u16(buf, 0x40) as usize).min(64).saturating_sub(2);
        let (name, _) = UTF_16LE.decode_without_bom_handling(slice_at(buf, 0, name_len));
        Directory {
            name: name.into_owned(),
            typ: buf.get(0x42).copied().unwrap_or(0),
            start: read_int(buf, 0x74, 4),
            len: read_u32(buf, 0x78) as usize,
        }
    }
}

/// Lookup key, `Book` is the BIFF5 name of the `Workbook` stream
fn stream_key(name: &str) -> String {
    let name = name.to_lowercase();
    if name == "book" {
        "workbook".to_string()
    } else {
        name
    }
}

/// Follows a chain through a sector table, returning the visited ids
fn chain(table: &[i64], start: i64, what: &'static str) -> Result<Vec<usize>, CfbError> {
    let mut ids = Vec::new();
    let mut id = start;
    while id >= 0 {
        let idx = id as usize;
        if ids.len() > table.len() {
            return Err(CfbError::CyclicChain { chain: what });
        }
        ids.push(idx);
        id = *table.get(idx).ok_or(CfbError::SectorOutOfRange {
            id,
            bound: table.len(),
        })?;
    }
    if id != END_OF_CHAIN {
        trace!("{what} chain ends with {id}");
    }
    Ok(ids)
}

/// A struct for managing Compound File Binary format
#[derive(Debug)]
pub struct Cfb {
    header: Header,
    fat: Vec<i64>,
    mini_fat: Vec<i64>,
    directories: Vec<Directory>,
    mini_stream: Vec<u8>,
}

impl Cfb {
    /// Parses header, sector tables and directory of an in-memory compound file
    pub fn new(data: &[u8]) -> Result<Cfb, CfbError> {
        let header = Header::from_bytes(data)?;
        debug!(
            "cfb header: sector size {}, {} FAT sectors",
            header.sector_size, header.fat_len
        );

        let per_sector = header.sector_size / 4;
        let mut fat = Vec::with_capacity(header.fat_len * per_sector);
        for id in header.fat_sector_ids(data)? {
            let pos = header.sector_offset(id);
            if id < 0 || pos >= data.len() {
                return Err(CfbError::SectorOutOfRange {
                    id,
                    bound: data.len(),
                });
            }
            fat.extend((0..per_sector).map(|i| read_int(data, pos + 4 * i, 4)));
        }

        let mut cfb = Cfb {
            header,
            fat,
            mini_fat: Vec::new(),
            directories: Vec::new(),
            mini_stream: Vec::new(),
        };

        let mini_fat = cfb.read_chain(data, cfb.header.mini_fat_start, "mini FAT")?;
        cfb.mini_fat = (0..mini_fat.len() / 4)
            .take(cfb.header.mini_fat_len * per_sector)
            .map(|i| read_int(&mini_fat, 4 * i, 4))
            .collect();

        let dirs = cfb.read_chain(data, cfb.header.dir_start, "directory")?;
        cfb.directories = dirs
            .chunks(DIRECTORY_ENTRY_LEN)
            .map(Directory::from_slice)
            .collect();
        let (root_start, root_len) = match cfb.directories.first() {
            Some(root) => (root.start, root.len),
            None => return Err(CfbError::EmptyRootDir),
        };

        let mut mini_stream = cfb.read_chain(data, root_start, "mini stream")?;
        mini_stream.truncate(root_len);
        cfb.mini_stream = mini_stream;
        debug!(
            "cfb: {} directory entries, {} bytes of mini stream",
            cfb.directories.len(),
            cfb.mini_stream.len()
        );
        Ok(cfb)
    }

    /// Names of all stream entries
    pub fn stream_names(&self) -> impl Iterator<Item = &str> {
        self.directories
            .iter()
            .filter(|d| d.typ == STREAM_ENTRY)
            .map(|d| d.name.as_str())
    }

    /// Whether a stream has that name (case insensitive)
    pub fn has_stream(&self, name: &str) -> bool {
        let key = stream_key(name);
        self.stream_names().any(|n| stream_key(n) == key)
    }

    /// Gets a stream by name (case insensitive) out of directories
    ///
    /// Returns `Ok(None)` when no stream has that name.
    pub fn get_stream(&self, name: &str, data: &[u8]) -> Result<Option<Vec<u8>>, CfbError> {
        let key = stream_key(name);
        let Some(dir) = self
            .directories
            .iter()
            .find(|d| d.typ == STREAM_ENTRY && stream_key(&d.name) == key)
        else {
            debug!("stream {name} not found");
            return Ok(None);
        };
        debug!("get stream {} ({} bytes)", dir.name, dir.len);
        let mut stream = if dir.len < self.header.mini_cutoff {
            self.read_mini_chain(dir.start)?
        } else {
            self.read_chain(data, dir.start, "stream")?
        };
        if stream.len() < dir.len {
            warn!(
                "stream {} is truncated: {} bytes out of {}",
                dir.name,
                stream.len(),
                dir.len
            );
        }
        stream.truncate(dir.len);
        Ok(Some(stream))
    }

    fn read_chain(&self, data: &[u8], start: i64, what: &'static str) -> Result<Vec<u8>, CfbError> {
        let size = self.header.sector_size;
        let ids = chain(&self.fat, start, what)?;
        let mut buf = Vec::with_capacity(ids.len() * size);
        for id in ids {
            let pos = self.header.sector_offset(id as i64);
            if pos >= data.len() {
                return Err(CfbError::SectorOutOfRange {
                    id: id as i64,
                    bound: data.len(),
                });
            }
            buf.extend_from_slice(slice_at(data, pos, size));
        }
        Ok(buf)
    }

    fn read_mini_chain(&self, start: i64) -> Result<Vec<u8>, CfbError> {
        let size = self.header.mini_sector_size;
        let ids = chain(&self.mini_fat, start, "mini stream member")?;
        let mut buf = Vec::with_capacity(ids.len() * size);
        for id in ids {
            let pos = id * size;
            if pos >= self.mini_stream.len() {
                return Err(CfbError::SectorOutOfRange {
                    id: id as i64,
                    bound: self.mini_stream.len(),
                });
            }
            buf.extend_from_slice(slice_at(&self.mini_stream, pos, size));
        }
        Ok(buf)
    }
}
