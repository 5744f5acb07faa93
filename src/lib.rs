//! Lazy row streaming reader for legacy binary Excel workbooks
//!
//! # Status
//!
//! **sheetstream** is a pure Rust library reading BIFF5 and BIFF8 (`xls`)
//! workbooks stored in an OLE compound file.
//!
//! The workbook globals (styles, shared strings, sheet list) and a row
//! index of every sheet are decoded when the file is opened. Cells are
//! decoded row by row, on demand, and come with their style, hyperlink and
//! merged range. Numeric values can be rendered with their number format.
//!
//! # Examples
//! ```no_run
//! use sheetstream::{open_workbook, Reader};
//!
//! let workbook = open_workbook("tests/report.xls").expect("Cannot open file");
//!
//! for sheet in workbook.sheets() {
//!     println!("{}: {} rows", sheet.name(), sheet.total_rows());
//! }
//!
//! // stream the first 10 rows of the first sheet
//! let sheet = workbook.sheet_by_index(0).expect("Cannot find first sheet");
//! for row in sheet.row_iter(0, Some(10)).expect("Cannot read sheet") {
//!     println!("{}", row.to_values(true).join("\t"));
//! }
//!
//! // or a single cell
//! if let Some(cell) = sheet.cell("B3").expect("Cannot read sheet") {
//!     println!("B3 = {} ({:?})", cell.formatted_value(), cell.value());
//! }
//! ```
#![deny(missing_docs)]

#[macro_use]
mod utils;

mod cfb;
mod config;
mod coordinate;
mod datatype;
mod de;
mod errors;
mod formats;
mod row;
mod style;
mod workbook;
mod xls;

use std::ops::Deref;
use std::path::Path;

pub use crate::cfb::{is_cfb, Cfb, CfbError};
pub use crate::config::{Calendar, Config, EncodingRsConverter, TextConverter};
pub use crate::coordinate::{
    column_index, column_letter, coordinate, parse_coordinate, CellRange, MAX_COLUMNS,
};
pub use crate::datatype::{CellErrorType, Data};
pub use crate::de::{CellDeserializer, DeError, RowDeserializer};
pub use crate::errors::Error;
pub use crate::formats::{
    builtin_format_code, format_value, is_date_format, serial_to_datetime, Comparison,
    Condition, FormatCode, FormatColor, Section,
};
pub use crate::row::{enrich_row, Cell, EnrichContext, Row, RowIterator};
pub use crate::style::{
    Alignment, Border, BorderStyle, Borders, Color, DiagonalDirection, Fill, FillPattern, Font,
    FontStyle, FontVerticalAlign, FontWeight, HorizontalAlignment, NumberFormat, Protection,
    Style, TextRotation, UnderlineStyle, VerticalAlignment,
};
pub use crate::utils::read_int;
pub use crate::workbook::{
    AutoFilter, Hyperlink, Sheet, SheetType, SheetVisible, Workbook, INTERNAL_LINK_PREFIX,
};
pub use crate::xls::{decode_rk, rk_to_data, Biff, Xls, XlsError, XlsRowIterator};

/// A trait to share spreadsheets reader functions across backends
pub trait Reader: Sized {
    /// Error specific to the file type
    type Error: std::fmt::Debug + From<std::io::Error>;
    /// Row iterator of a sheet
    type RowIter<'a>: RowIterator
    where
        Self: 'a;

    /// Whether `data` looks like a file of this backend
    fn readable(data: &[u8]) -> bool;
    /// Decodes the workbook globals and indexes every sheet
    fn new(data: Vec<u8>, config: Config) -> Result<Self, Self::Error>;
    /// Workbook metadata
    fn workbook(&self) -> &Workbook;
    /// Iterates over rows `[start, end)` of a sheet, `end` defaulting to
    /// and clamped by the number of rows of the sheet
    fn row_iter(
        &self,
        sheet_index: usize,
        start: u32,
        end: Option<u32>,
    ) -> Result<Self::RowIter<'_>, Self::Error>;
    /// Releases the decoded stream, row iteration fails afterward
    fn close(&mut self);

    /// Sheets in workbook order
    fn sheets(&self) -> &[Sheet] {
        self.workbook().sheets()
    }

    /// Sheet named `name`
    fn sheet_by_name(&self, name: &str) -> Option<SheetHandle<'_, Self>> {
        let sheet = self.sheets().iter().find(|s| s.name() == name)?;
        Some(SheetHandle {
            reader: self,
            sheet,
        })
    }

    /// Sheet at position `index`
    fn sheet_by_index(&self, index: usize) -> Option<SheetHandle<'_, Self>> {
        let sheet = self.sheets().get(index)?;
        Some(SheetHandle {
            reader: self,
            sheet,
        })
    }
}

/// A sheet bound to the reader that decodes its rows
///
/// Dereferences to the [`Sheet`] metadata.
pub struct SheetHandle<'a, R: Reader> {
    reader: &'a R,
    sheet: &'a Sheet,
}

impl<'a, R: Reader> SheetHandle<'a, R> {
    /// Sheet metadata
    pub fn sheet(&self) -> &'a Sheet {
        self.sheet
    }

    /// Iterates over rows `[start, end)`
    pub fn row_iter(&self, start: u32, end: Option<u32>) -> Result<R::RowIter<'a>, R::Error> {
        self.reader.row_iter(self.sheet.index(), start, end)
    }

    /// Cell at an `A1` coordinate
    ///
    /// Returns `None` for invalid coordinates and cells outside of the
    /// sheet.
    pub fn cell(&self, coordinate: &str) -> Result<Option<Cell>, R::Error> {
        let Some((row, col)) = parse_coordinate(coordinate) else {
            return Ok(None);
        };
        let mut rows = self.row_iter(row, row.checked_add(1))?;
        Ok(rows.next().and_then(|r| r.get(col).cloned()))
    }
}

impl<R: Reader> Deref for SheetHandle<'_, R> {
    type Target = Sheet;

    fn deref(&self) -> &Sheet {
        self.sheet
    }
}

impl<R: Reader> std::fmt::Debug for SheetHandle<'_, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SheetHandle").field(self.sheet).finish()
    }
}

/// Opens a workbook from a file path with the default configuration
pub fn open_workbook<P: AsRef<Path>>(path: P) -> Result<Xls, Error> {
    let data = std::fs::read(path)?;
    open_workbook_with_config(data, Config::default())
}

/// Opens a workbook held in memory with the default configuration
pub fn open_workbook_from_bytes(data: Vec<u8>) -> Result<Xls, Error> {
    open_workbook_with_config(data, Config::default())
}

/// Opens a workbook held in memory
pub fn open_workbook_with_config(data: Vec<u8>, config: Config) -> Result<Xls, Error> {
    if !is_cfb(&data) {
        return Err(Error::Msg("not a compound file"));
    }
    Ok(Xls::new(data, config)?)
}
