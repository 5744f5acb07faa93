//! Legacy binary workbooks: BIFF5 and BIFF8 records inside a compound file

mod cells_reader;
mod codec;
mod records;
mod sheet_index;
mod sst;
mod styles;

use std::collections::BTreeMap;

use encoding_rs::Encoding;
use log::debug;

pub use cells_reader::XlsRowIterator;
pub use codec::{decode_rk, rk_to_data};

use crate::cfb::{Cfb, CfbError};
use crate::config::{Calendar, Config};
use crate::utils::read_u16;
use crate::workbook::Workbook;
use crate::Reader;
use codec::XlsEncoding;
use records::{
    RecordIter, BOF, CODEPAGE, DATEMODE, FONT, FORMAT, PALETTE, PRECISION, SHEET, SST, WINDOW1,
    XF,
};
use sheet_index::{index_sheet, parse_sheet_record};
use styles::StyleCatalog;

/// Name of the workbook stream, `Book` in BIFF5 files
const WORKBOOK_STREAM: &str = "Workbook";
/// BOF substream type of the workbook globals
const GLOBALS_SUBSTREAM: u16 = 0x0005;
/// CODEPAGE value of UTF-16 workbooks, where 8-bit text is latin-1
const UTF16_CODEPAGE: u16 = 1200;

/// An enum to handle Xls specific errors
#[derive(Debug)]
pub enum XlsError {
    /// Io error
    Io(std::io::Error),
    /// Cfb error
    Cfb(CfbError),
    /// The compound file has no `Workbook` or `Book` stream
    WorkbookStreamNotFound,
    /// The workbook stream does not start with a workbook globals BOF
    Bof(u16),
    /// No sheet at this index
    SheetIndex(usize),
    /// No sheet with this name
    SheetName(String),
    /// The reader was closed
    Closed,
}

from_err!(std::io::Error, XlsError, Io);
from_err!(CfbError, XlsError, Cfb);

impl std::fmt::Display for XlsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            XlsError::Io(e) => write!(f, "I/O error: {e}"),
            XlsError::Cfb(e) => write!(f, "Cfb error: {e}"),
            XlsError::WorkbookStreamNotFound => write!(f, "Cannot find Workbook stream"),
            XlsError::Bof(t) => write!(f, "Expecting workbook globals BOF, got {t:#06x}"),
            XlsError::SheetIndex(i) => write!(f, "Sheet index {i} does not exist"),
            XlsError::SheetName(n) => write!(f, "Sheet '{n}' does not exist"),
            XlsError::Closed => write!(f, "Reader is closed"),
        }
    }
}

impl std::error::Error for XlsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            XlsError::Io(e) => Some(e),
            XlsError::Cfb(e) => Some(e),
            _ => None,
        }
    }
}

/// BIFF version of a workbook
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Biff {
    /// Excel 5.0 / 95, 8-bit strings in the workbook codepage
    Biff5,
    /// Excel 97 to 2003, unicode strings and shared string table
    Biff8,
}

impl Biff {
    /// Version announced by a BOF record
    pub fn from_version(version: u16) -> Biff {
        if version == 0x0600 {
            Biff::Biff8
        } else {
            Biff::Biff5
        }
    }
}

/// A legacy binary (xls) workbook
///
/// The workbook globals and the row index of every sheet are decoded when
/// the file is opened, cell values are decoded row by row through
/// [`Reader::row_iter`].
pub struct Xls {
    stream: Vec<u8>,
    workbook: Workbook,
    row_offsets: Vec<BTreeMap<u32, usize>>,
    encoding: &'static Encoding,
    biff: Biff,
    config: Config,
    closed: bool,
}

impl std::fmt::Debug for Xls {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Xls")
            .field("biff", &self.biff)
            .field("sheets", &self.workbook.sheet_names())
            .field("stream_len", &self.stream.len())
            .field("closed", &self.closed)
            .finish()
    }
}

impl Xls {
    fn parse_workbook(&mut self) -> Result<(), XlsError> {
        let converter = self.config.converter();
        let mut records = RecordIter::new(&self.stream);
        let version = match records.next() {
            Some(r) if r.typ == BOF && read_u16(r.data, 2) == GLOBALS_SUBSTREAM => {
                read_u16(r.data, 0)
            }
            Some(r) if r.typ == BOF => return Err(XlsError::Bof(read_u16(r.data, 2))),
            Some(r) => return Err(XlsError::Bof(r.typ)),
            None => return Err(XlsError::Bof(0)),
        };
        let biff = Biff::from_version(version);
        debug!("workbook globals: version {version:#06x} ({biff:?})");

        let wb = &mut self.workbook;
        wb.biff_version = version;
        wb.codepage = self.config.default_codepage();
        let mut encoding = self.config.encoding_for(wb.codepage);
        let mut catalog = StyleCatalog::new(biff);
        let mut entries = Vec::new();
        let mut date_mode = 0;

        for mut r in records {
            let enc = XlsEncoding {
                encoding,
                converter,
            };
            match r.typ {
                CODEPAGE => {
                    wb.codepage = read_u16(r.data, 0);
                    if wb.codepage != UTF16_CODEPAGE {
                        encoding = self.config.encoding_for(wb.codepage);
                    }
                    debug!("codepage {} ({})", wb.codepage, encoding.name());
                }
                DATEMODE => date_mode = read_u16(r.data, 0),
                PRECISION => wb.full_precision = read_u16(r.data, 0) != 0,
                WINDOW1 => wb.active_sheet = read_u16(r.data, 10) as usize,
                PALETTE => catalog.add_palette(r.data),
                FONT => catalog.add_font(r.data, &enc),
                FORMAT => catalog.add_format(r.data, &enc),
                XF => catalog.add_xf(r.data),
                SST => wb.strings = sst::parse_sst(&mut r, &enc),
                SHEET => entries.push(parse_sheet_record(r.data, biff, &enc)),
                _ => (),
            }
        }

        wb.calendar = self
            .config
            .calendar()
            .unwrap_or_else(|| Calendar::from_date_mode(date_mode));
        wb.styles = catalog.finish();
        debug!(
            "{} sheets, {} cell styles, {} shared strings",
            entries.len(),
            wb.styles.len(),
            wb.strings.len()
        );

        let enc = XlsEncoding {
            encoding,
            converter,
        };
        for (index, entry) in entries.iter().enumerate() {
            let sheet = index_sheet(&self.stream, index, entry, &enc);
            wb.sheets.push(sheet.sheet);
            self.row_offsets.push(sheet.row_offsets);
        }
        if wb.active_sheet >= wb.sheets.len() {
            wb.active_sheet = 0;
        }
        self.encoding = encoding;
        self.biff = biff;
        Ok(())
    }

    /// BIFF version of the workbook
    pub fn biff(&self) -> Biff {
        self.biff
    }

    /// Configuration the workbook was opened with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether [`Reader::close`] was called
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Index of the sheet named `name`
    pub fn sheet_index(&self, name: &str) -> Result<usize, XlsError> {
        self.workbook
            .sheets()
            .iter()
            .position(|s| s.name() == name)
            .ok_or_else(|| XlsError::SheetName(name.to_string()))
    }
}

impl Reader for Xls {
    type Error = XlsError;
    type RowIter<'a> = XlsRowIterator<'a>;

    fn readable(data: &[u8]) -> bool {
        Cfb::new(data).is_ok_and(|cfb| cfb.has_stream(WORKBOOK_STREAM))
    }

    fn new(data: Vec<u8>, config: Config) -> Result<Self, XlsError> {
        let cfb = Cfb::new(&data)?;
        let stream = cfb
            .get_stream(WORKBOOK_STREAM, &data)?
            .ok_or(XlsError::WorkbookStreamNotFound)?;
        drop(data);

        let mut xls = Xls {
            stream,
            workbook: Workbook::default(),
            row_offsets: Vec::new(),
            encoding: encoding_rs::WINDOWS_1252,
            biff: Biff::Biff8,
            config,
            closed: false,
        };
        xls.parse_workbook()?;
        Ok(xls)
    }

    fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    fn row_iter(
        &self,
        sheet_index: usize,
        start: u32,
        end: Option<u32>,
    ) -> Result<XlsRowIterator<'_>, XlsError> {
        if self.closed {
            return Err(XlsError::Closed);
        }
        let (Some(sheet), Some(offsets)) = (
            self.workbook.sheets.get(sheet_index),
            self.row_offsets.get(sheet_index),
        ) else {
            return Err(XlsError::SheetIndex(sheet_index));
        };
        let encoding = XlsEncoding {
            encoding: self.encoding,
            converter: self.config.converter(),
        };
        Ok(XlsRowIterator::new(
            &self.stream,
            &self.workbook,
            sheet,
            offsets,
            encoding,
            self.biff,
            start,
            end,
        ))
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        debug!("closing workbook, releasing {} bytes", self.stream.len());
        self.closed = true;
        self.stream = Vec::new();
        self.row_offsets = Vec::new();
    }
}
