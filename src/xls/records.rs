//! BIFF record stream

use log::{trace, warn};

use crate::utils::{read_u16, slice_at};

pub(crate) const BOF: u16 = 0x0809;
pub(crate) const EOF: u16 = 0x000A;
pub(crate) const CONTINUE: u16 = 0x003C;
pub(crate) const CODEPAGE: u16 = 0x0042;
pub(crate) const DATEMODE: u16 = 0x0022;
pub(crate) const PRECISION: u16 = 0x000E;
pub(crate) const WINDOW1: u16 = 0x003D;
pub(crate) const PALETTE: u16 = 0x0092;
pub(crate) const FONT: u16 = 0x0031;
pub(crate) const FORMAT: u16 = 0x041E;
pub(crate) const XF: u16 = 0x00E0;
pub(crate) const SST: u16 = 0x00FC;
pub(crate) const SHEET: u16 = 0x0085;

pub(crate) const DIMENSION: u16 = 0x0200;
pub(crate) const ROW: u16 = 0x0208;
pub(crate) const DBCELL: u16 = 0x00D7;
pub(crate) const MERGEDCELLS: u16 = 0x00E5;
pub(crate) const HYPERLINK: u16 = 0x01B8;
pub(crate) const QUICKTIP: u16 = 0x0800;

pub(crate) const BLANK: u16 = 0x0201;
pub(crate) const MULBLANK: u16 = 0x00BE;
pub(crate) const RK: u16 = 0x027E;
pub(crate) const MULRK: u16 = 0x00BD;
pub(crate) const NUMBER: u16 = 0x0203;
pub(crate) const LABEL: u16 = 0x0204;
pub(crate) const BOOLERR: u16 = 0x0205;
pub(crate) const FORMULA: u16 = 0x0006;
pub(crate) const STRING: u16 = 0x0207;
pub(crate) const LABELSST: u16 = 0x00FD;
pub(crate) const SHRFMLA: u16 = 0x04BC;
pub(crate) const ARRAY: u16 = 0x0221;
pub(crate) const TABLE: u16 = 0x0236;

/// Whether a record carries a cell value (row at +0, column at +2)
pub(crate) fn is_cell_record(typ: u16) -> bool {
    matches!(
        typ,
        BLANK | MULBLANK | RK | MULRK | NUMBER | BOOLERR | LABEL | LABELSST | FORMULA
    )
}

/// A BIFF record with its CONTINUE payloads
pub(crate) struct Record<'a> {
    pub typ: u16,
    /// Absolute offset of the record header
    pub pos: usize,
    pub data: &'a [u8],
    pub cont: Vec<&'a [u8]>,
}

impl<'a> Record<'a> {
    /// Moves `data` to the next CONTINUE payload, if any
    pub fn continue_record(&mut self) -> bool {
        if self.cont.is_empty() {
            false
        } else {
            self.data = self.cont.remove(0);
            true
        }
    }
}

/// Iterates over the records of a stream, from an absolute offset to the
/// EOF closing the substream it starts in
///
/// Embedded substreams (charts in a drawing section) are walked through,
/// their BOF/EOF pairs tracked in `depth`.
#[derive(Clone)]
pub(crate) struct RecordIter<'a> {
    stream: &'a [u8],
    pos: usize,
    done: bool,
    started: bool,
    depth: usize,
}

impl<'a> RecordIter<'a> {
    pub fn new(stream: &'a [u8]) -> RecordIter<'a> {
        RecordIter::at(stream, 0)
    }

    pub fn at(stream: &'a [u8], pos: usize) -> RecordIter<'a> {
        RecordIter {
            stream,
            pos,
            done: false,
            started: false,
            depth: 0,
        }
    }

    /// Whether the last record returned belongs to an embedded substream
    pub fn nested(&self) -> bool {
        self.depth > 1
    }

    /// Offset of the next record header
    pub fn position(&self) -> usize {
        self.pos
    }
}

impl<'a> Iterator for RecordIter<'a> {
    type Item = Record<'a>;

    fn next(&mut self) -> Option<Record<'a>> {
        if self.done {
            return None;
        }
        let stream = self.stream;
        let header = self.pos;
        if header.saturating_add(4) > stream.len() {
            if header < stream.len() {
                warn!("truncated record header at {header}");
            }
            self.done = true;
            return None;
        }
        let typ = read_u16(stream, header);
        let len = read_u16(stream, header + 2) as usize;
        let start = header + 4;
        if start + len > stream.len() {
            warn!(
                "record {typ:#06x} at {header} expects {len} bytes, {} left",
                stream.len() - start
            );
            self.done = true;
            return None;
        }
        let data = &stream[start..start + len];
        self.pos = start + len;

        let mut cont = Vec::new();
        while self.pos + 4 <= stream.len() && read_u16(stream, self.pos) == CONTINUE {
            let len = read_u16(stream, self.pos + 2) as usize;
            if self.pos + 4 + len > stream.len() {
                break;
            }
            cont.push(slice_at(stream, self.pos + 4, len));
            self.pos += 4 + len;
        }
        trace!("record {typ:#06x} at {header}: {len} bytes, {} continues", cont.len());

        if !self.started {
            // starting mid substream
            self.started = true;
            if typ != BOF {
                self.depth = 1;
            }
        }
        match typ {
            BOF => self.depth += 1,
            EOF => {
                self.depth = self.depth.saturating_sub(1);
                self.done = self.depth == 0;
            }
            _ => (),
        }
        Some(Record {
            typ,
            pos: header,
            data,
            cont,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(typ: u16, data: &[u8]) -> Vec<u8> {
        let mut buf = typ.to_le_bytes().to_vec();
        buf.extend_from_slice(&(data.len() as u16).to_le_bytes());
        buf.extend_from_slice(data);
        buf
    }

    #[test]
    fn continues_are_attached() {
        let mut stream = record(SST, &[1, 2, 3]);
        stream.extend(record(CONTINUE, &[4]));
        stream.extend(record(CONTINUE, &[5, 6]));
        stream.extend(record(EOF, &[]));
        stream.extend(record(LABEL, &[0; 8]));

        let mut iter = RecordIter::new(&stream);
        let mut r = iter.next().unwrap();
        assert_eq!((r.typ, r.pos, r.data), (SST, 0, &[1u8, 2, 3][..]));
        assert_eq!(r.cont.len(), 2);
        assert!(r.continue_record());
        assert_eq!(r.data, &[4]);
        assert!(r.continue_record());
        assert!(!r.continue_record());

        let eof = iter.next().unwrap();
        assert_eq!((eof.typ, eof.pos), (EOF, 18));
        assert!(iter.next().is_none());
    }

    #[test]
    fn truncated_payload_ends_iteration() {
        let mut stream = record(NUMBER, &[0; 14]);
        stream.extend_from_slice(&[0x03, 0x02, 0x0E, 0x00, 1, 2]);
        let records: Vec<_> = RecordIter::new(&stream).map(|r| r.typ).collect();
        assert_eq!(records, vec![NUMBER]);
    }

    #[test]
    fn embedded_substreams() {
        let mut stream = record(BOF, &[0, 6, 0x10, 0]);
        stream.extend(record(DIMENSION, &[0; 14]));
        stream.extend(record(BOF, &[0, 6, 0x20, 0]));
        stream.extend(record(DIMENSION, &[0; 10]));
        stream.extend(record(EOF, &[]));
        stream.extend(record(MERGEDCELLS, &[0; 2]));
        stream.extend(record(EOF, &[]));
        stream.extend(record(LABEL, &[0; 8]));

        let mut iter = RecordIter::new(&stream);
        let mut seen = Vec::new();
        while let Some(r) = iter.next() {
            seen.push((r.typ, iter.nested()));
        }
        assert_eq!(
            seen,
            vec![
                (BOF, false),
                (DIMENSION, false),
                (BOF, true),
                (DIMENSION, true),
                (EOF, false),
                (MERGEDCELLS, false),
                (EOF, false),
            ]
        );

        // started inside the sheet, the chart EOF is not the last one
        let second = record(BOF, &[0, 6, 0x10, 0]).len();
        let types: Vec<_> = RecordIter::at(&stream, second).map(|r| r.typ).collect();
        assert_eq!(types, vec![DIMENSION, BOF, DIMENSION, EOF, MERGEDCELLS, EOF]);
    }

    #[test]
    fn starts_anywhere() {
        let mut stream = record(BOF, &[0; 4]);
        let second = stream.len();
        stream.extend(record(DIMENSION, &[0; 14]));
        let mut iter = RecordIter::at(&stream, second);
        assert_eq!(iter.next().map(|r| (r.typ, r.pos)), Some((DIMENSION, second)));
        assert_eq!(iter.position(), stream.len());
        assert!(is_cell_record(LABELSST));
        assert!(!is_cell_record(ROW));
    }
}
