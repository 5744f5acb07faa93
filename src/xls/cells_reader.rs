// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

use std::collections::BTreeMap;

use log::{trace, warn};

use super::codec::{
    read_byte_string_long, read_unicode_string_long, rk_to_data, XlsEncoding,
};
use super::records::{
    is_cell_record, Record, RecordIter, ARRAY, BLANK, BOOLERR, EOF, FORMULA, LABEL, LABELSST,
    MULBLANK, MULRK, NUMBER, RK, SHRFMLA, STRING, TABLE,
};
use super::Biff;
use crate::datatype::{CellErrorType, Data};
use crate::row::{enrich_row, EnrichContext, Row, RowIterator};
use crate::utils::{read_f64, read_u16, read_u32, read_u8};
use crate::workbook::{Sheet, Workbook};

/// Lazy row iterator over a sheet of an xls workbook
///
/// Each row is decoded from its first cell record when requested, nothing
/// is kept between rows.
pub struct XlsRowIterator<'a> {
    stream: &'a [u8],
    workbook: &'a Workbook,
    sheet: &'a Sheet,
    row_offsets: &'a BTreeMap<u32, usize>,
    encoding: XlsEncoding<'a>,
    biff: Biff,
    start: u32,
    end: u32,
    position: u32,
}

impl<'a> XlsRowIterator<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        stream: &'a [u8],
        workbook: &'a Workbook,
        sheet: &'a Sheet,
        row_offsets: &'a BTreeMap<u32, usize>,
        encoding: XlsEncoding<'a>,
        biff: Biff,
        start: u32,
        end: Option<u32>,
    ) -> XlsRowIterator<'a> {
        let end = end.map_or(sheet.total_rows(), |e| e.min(sheet.total_rows()));
        XlsRowIterator {
            stream,
            workbook,
            sheet,
            row_offsets,
            encoding,
            biff,
            start,
            end,
            position: start,
        }
    }

    /// Decodes the cell records of `row`
    fn read_row(&self, row: u32) -> Row {
        let mut cells = Row::empty(row, self.sheet.total_columns());
        let Some(&offset) = self.row_offsets.get(&row) else {
            return cells;
        };
        let stop = self.row_offsets.range(row + 1..).next().map(|(_, &o)| o);

        let mut records = RecordIter::at(self.stream, offset);
        while let Some(r) = records.next() {
            if records.nested() {
                continue;
            }
            if r.typ == EOF || stop.is_some_and(|s| r.pos >= s) {
                break;
            }
            if !is_cell_record(r.typ) {
                continue;
            }
            if read_u16(r.data, 0) as u32 != row {
                break;
            }
            self.read_cell(&mut cells, &r, &records);
        }
        cells
    }

    /// Stores the value(s) of a cell record; `records` is positioned right
    /// after it
    fn read_cell(&self, cells: &mut Row, r: &Record<'_>, records: &RecordIter<'_>) {
        let data = r.data;
        let col = read_u16(data, 2) as u32;
        let xf = read_u16(data, 4) as usize;
        let value = match r.typ {
            BLANK => Data::Empty,
            MULBLANK => {
                let count = data.len().saturating_sub(6) / 2;
                for i in 0..count {
                    let cell = cells.cell_mut(col + i as u32);
                    cell.set_xf_index(read_u16(data, 4 + 2 * i) as usize);
                    cell.set_value(Data::Empty);
                }
                return;
            }
            RK => rk_to_data(read_u32(data, 6)),
            MULRK => {
                let count = data.len().saturating_sub(6) / 6;
                for i in 0..count {
                    let pos = 4 + 6 * i;
                    let cell = cells.cell_mut(col + i as u32);
                    cell.set_xf_index(read_u16(data, pos) as usize);
                    cell.set_value(rk_to_data(read_u32(data, pos + 2)));
                }
                return;
            }
            NUMBER => Data::Float(read_f64(data, 6)),
            BOOLERR => bool_or_error(read_u8(data, 6), read_u8(data, 7) == 1),
            LABEL => {
                let text = data.get(6..).unwrap_or_default();
                Data::String(match self.biff {
                    Biff::Biff8 => read_unicode_string_long(text, &self.encoding),
                    Biff::Biff5 => read_byte_string_long(text, &self.encoding),
                })
            }
            LABELSST => {
                let idx = read_u32(data, 6) as usize;
                match self.workbook.shared_string_at(idx) {
                    Some(s) => Data::String(s.to_string()),
                    None => {
                        warn!("shared string {idx} out of range at {}", r.pos);
                        Data::Empty
                    }
                }
            }
            FORMULA => self.formula_result(data, records),
            _ => return,
        };
        trace!("cell ({}, {col}) = {value:?}", cells.index());
        let cell = cells.cell_mut(col);
        cell.set_xf_index(xf);
        cell.set_value(value);
    }

    /// Cached result of a FORMULA record
    fn formula_result(&self, data: &[u8], records: &RecordIter<'_>) -> Data {
        if read_u8(data, 12) != 0xFF || read_u8(data, 13) != 0xFF {
            return Data::Float(read_f64(data, 6));
        }
        match read_u8(data, 6) {
            0 => Data::String(self.formula_string(records)),
            1 => Data::Bool(read_u8(data, 8) != 0),
            2 => bool_or_error(read_u8(data, 8), true),
            3 => Data::String(String::new()),
            t => {
                warn!("unknown formula result type {t}");
                Data::Empty
            }
        }
    }

    /// Text of the STRING record following a FORMULA, skipping the shared
    /// and array formula definitions in between
    fn formula_string(&self, records: &RecordIter<'_>) -> String {
        for r in records.clone() {
            match r.typ {
                SHRFMLA | ARRAY | TABLE => continue,
                STRING => {
                    return match self.biff {
                        Biff::Biff8 => read_unicode_string_long(r.data, &self.encoding),
                        Biff::Biff5 => read_byte_string_long(r.data, &self.encoding),
                    }
                }
                _ => break,
            }
        }
        warn!("string formula without STRING record");
        String::new()
    }
}

fn bool_or_error(value: u8, is_error: bool) -> Data {
    if !is_error {
        return Data::Bool(value != 0);
    }
    match CellErrorType::from_code(value) {
        Some(e) => Data::Error(e),
        None => {
            warn!("unknown cell error code {value:#x}");
            Data::Empty
        }
    }
}

impl RowIterator for XlsRowIterator<'_> {
    fn position(&self) -> u32 {
        self.position
    }

    fn current(&mut self) -> Row {
        let mut row = self.read_row(self.position);
        enrich_row(
            &mut row,
            &EnrichContext {
                workbook: self.workbook,
                sheet: self.sheet,
            },
        );
        row
    }

    fn advance(&mut self) {
        self.position = self.position.saturating_add(1);
    }

    fn rewind(&mut self) {
        self.position = self.start;
    }

    fn start_row(&self) -> u32 {
        self.start
    }

    fn end_row(&self) -> u32 {
        self.end
    }
}

impl Iterator for XlsRowIterator<'_> {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        if !self.valid() {
            return None;
        }
        let row = self.current();
        self.advance();
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.end.saturating_sub(self.position) as usize;
        (n, Some(n))
    }
}
