//! Per sheet scan: dimensions, row offsets, merged cells and hyperlinks

use std::collections::BTreeMap;

use log::{debug, trace, warn};

use super::codec::{read_byte_string_short, read_unicode_string_short, read_utf16_z, XlsEncoding};
use super::records::{
    is_cell_record, RecordIter, BOF, DBCELL, DIMENSION, HYPERLINK, MERGEDCELLS, QUICKTIP, ROW,
};
use super::Biff;
use crate::coordinate::CellRange;
use crate::utils::{read_u16, read_u32, read_u8, read_usize, slice_at};
use crate::workbook::{Sheet, SheetType, SheetVisible, INTERNAL_LINK_PREFIX};

/// A SHEET record of the workbook globals
#[derive(Debug, Clone)]
pub(crate) struct SheetEntry {
    pub name: String,
    pub offset: usize,
    pub visible: SheetVisible,
    pub typ: SheetType,
}

pub(crate) fn parse_sheet_record(data: &[u8], biff: Biff, enc: &XlsEncoding) -> SheetEntry {
    let visible = match read_u8(data, 4) & 0x03 {
        1 => SheetVisible::Hidden,
        2 => SheetVisible::VeryHidden,
        _ => SheetVisible::Visible,
    };
    let typ = match read_u8(data, 5) {
        1 => SheetType::MacroSheet,
        2 => SheetType::ChartSheet,
        6 => SheetType::Vba,
        _ => SheetType::WorkSheet,
    };
    let name = data.get(6..).unwrap_or_default();
    let name = match biff {
        Biff::Biff8 => read_unicode_string_short(name, enc),
        Biff::Biff5 => read_byte_string_short(name, enc),
    };
    SheetEntry {
        name,
        offset: read_usize(data, 0),
        visible,
        typ,
    }
}

/// Result of a sheet scan: the public metadata and the byte offset of the
/// first record of each row
#[derive(Debug, Default)]
pub(crate) struct SheetIndex {
    pub sheet: Sheet,
    pub row_offsets: BTreeMap<u32, usize>,
}

/// Scans the substream of a sheet
pub(crate) fn index_sheet(
    stream: &[u8],
    index: usize,
    entry: &SheetEntry,
    enc: &XlsEncoding,
) -> SheetIndex {
    let mut sheet = Sheet {
        name: entry.name.clone(),
        index,
        visible: entry.visible,
        typ: entry.typ,
        ..Sheet::default()
    };
    let mut row_offsets = BTreeMap::new();
    let mut first_cells = BTreeMap::new();
    let mut pending_rows = Vec::new();
    let mut has_dbcell = false;

    let mut records = RecordIter::at(stream, entry.offset);
    match records.next() {
        Some(r) if r.typ == BOF => (),
        Some(r) => warn!(
            "sheet '{}' starts with record {:#06x} instead of BOF",
            entry.name, r.typ
        ),
        None => {
            warn!("sheet '{}' offset {} is out of the stream", entry.name, entry.offset);
            return SheetIndex {
                sheet,
                row_offsets,
            };
        }
    }

    while let Some(r) = records.next() {
        if records.nested() {
            // chart or other embedded substream
            continue;
        }
        match r.typ {
            DIMENSION => {
                let (last_row, last_col) = parse_dimensions(r.data);
                sheet.total_rows = sheet.total_rows.max(last_row);
                sheet.total_columns = sheet.total_columns.max(last_col);
            }
            ROW => pending_rows.push(read_u16(r.data, 0) as u32),
            DBCELL => {
                // the row block starts `rel` bytes before the DBCELL header,
                // cell offsets are relative to the second ROW record
                let payload = r.pos + 4;
                let rel = read_usize(r.data, 0);
                let first = (payload + 0x14).saturating_sub(rel);
                let mut sum = 0;
                for (i, row) in pending_rows.drain(..).enumerate() {
                    sum += read_u16(r.data, (i % 32) * 2 + 4) as usize;
                    row_offsets.insert(row, (first + sum).saturating_sub(4));
                }
                has_dbcell = true;
            }
            MERGEDCELLS => {
                let count = read_u16(r.data, 0) as usize;
                for i in 0..count {
                    let pos = 2 + 8 * i;
                    if pos + 8 > r.data.len() {
                        warn!("MERGEDCELLS announces {count} ranges, {i} found");
                        break;
                    }
                    let range = CellRange::new(
                        (read_u16(r.data, pos) as u32, read_u16(r.data, pos + 4) as u32),
                        (read_u16(r.data, pos + 2) as u32, read_u16(r.data, pos + 6) as u32),
                    );
                    sheet.add_merge(range);
                }
            }
            HYPERLINK => {
                if let Some((range, Some(url))) = parse_hyperlink(r.data, enc) {
                    trace!("hyperlink {range} -> {url}");
                    sheet.add_hyperlink(range, url);
                }
            }
            QUICKTIP => {
                let (range, tooltip) = parse_quicktip(r.data, enc);
                sheet.add_tooltip(range, tooltip);
            }
            typ if is_cell_record(typ) => {
                first_cells.entry(read_u16(r.data, 0) as u32).or_insert(r.pos);
            }
            _ => (),
        }
    }

    if !has_dbcell {
        debug!("sheet '{}' has no DBCELL, using cell record offsets", sheet.name);
        row_offsets = first_cells;
    }
    debug!(
        "sheet '{}': {} x {}, {} indexed rows, {} merges, {} links",
        sheet.name,
        sheet.total_rows,
        sheet.total_columns,
        row_offsets.len(),
        sheet.merges.len(),
        sheet.hyperlinks.len()
    );
    SheetIndex { sheet, row_offsets }
}

/// Returns (last row + 1, last column + 1)
fn parse_dimensions(r: &[u8]) -> (u32, u32) {
    if r.len() >= 14 {
        (read_u32(r, 4), read_u16(r, 10) as u32)
    } else {
        (read_u16(r, 2) as u32, read_u16(r, 6) as u32)
    }
}

/// Decodes a HYPERLINK record into its range and url
///
/// UNC paths and unknown monikers have no url.
fn parse_hyperlink(data: &[u8], enc: &XlsEncoding) -> Option<(CellRange, Option<String>)> {
    if data.len() < 32 {
        warn!("HYPERLINK record too short ({} bytes)", data.len());
        return None;
    }
    let range = CellRange::new(
        (read_u16(data, 0) as u32, read_u16(data, 4) as u32),
        (read_u16(data, 2) as u32, read_u16(data, 6) as u32),
    );
    let flags = read_u32(data, 28);
    let has_text = flags & 0x08 != 0;
    let mut pos = 32;

    // description then target frame, both character counts + UTF-16
    if flags & 0x14 != 0 {
        pos += 4 + 2 * read_usize(data, pos);
    }
    if flags & 0x80 != 0 {
        pos += 4 + 2 * read_usize(data, pos);
    }

    let mut url = if flags & 0x100 != 0 {
        None
    } else if flags & 0x01 == 0 {
        Some(INTERNAL_LINK_PREFIX.to_string())
    } else {
        match read_u8(data, pos) {
            0x03 => {
                // file moniker
                pos += 16;
                let up_level = read_u16(data, pos) as usize;
                let short_len = read_usize(data, pos + 2);
                pos += 6;
                let short = enc.decode_bytes(slice_at(data, pos, short_len));
                pos += short_len + 24;
                let extended_size = read_usize(data, pos);
                pos += 4;
                let mut path = short.trim_end_matches('\0').to_string();
                if extended_size > 0 {
                    let len = read_usize(data, pos);
                    pos += 6;
                    path = enc.decode_utf16(slice_at(data, pos, len));
                    pos += len;
                }
                let mut url = "..\\".repeat(up_level);
                url.push_str(&path);
                if has_text {
                    url.push('#');
                }
                Some(url)
            }
            0xE0 => {
                // url moniker
                pos += 16;
                let len = read_usize(data, pos);
                pos += 4;
                let mut url = read_utf16_z(slice_at(data, pos, len), enc);
                pos += len;
                if has_text {
                    url.push('#');
                }
                Some(url)
            }
            b => {
                warn!("unknown hyperlink moniker {b:#04x}");
                None
            }
        }
    };

    if has_text {
        if let Some(url) = url.as_mut() {
            let len = read_usize(data, pos).saturating_sub(1);
            url.push_str(&enc.decode_utf16(slice_at(data, pos + 4, 2 * len)));
        }
    }
    Some((range, url))
}

/// Decodes a QUICKTIP record into its range and tooltip
fn parse_quicktip(data: &[u8], enc: &XlsEncoding) -> (CellRange, String) {
    let range = CellRange::new(
        (read_u16(data, 4) as u32, read_u16(data, 8) as u32),
        (read_u16(data, 6) as u32, read_u16(data, 10) as u32),
    );
    let tooltip = read_utf16_z(data.get(12..).unwrap_or_default(), enc);
    (range, tooltip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EncodingRsConverter;
    use crate::xls::records::{BLANK, EOF, NUMBER};

    fn enc() -> XlsEncoding<'static> {
        XlsEncoding {
            encoding: encoding_rs::WINDOWS_1252,
            converter: &EncodingRsConverter,
        }
    }

    fn utf16(s: &str) -> Vec<u8> {
        s.encode_utf16().flat_map(|c| c.to_le_bytes()).collect()
    }

    fn link_header(flags: u32) -> Vec<u8> {
        let mut data = Vec::new();
        for v in [1u16, 2, 0, 1] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        data.extend_from_slice(&[0; 16]);
        data.extend_from_slice(&2u32.to_le_bytes());
        data.extend_from_slice(&flags.to_le_bytes());
        data
    }

    #[test]
    fn sheet_record() {
        let enc = enc();
        let entry = parse_sheet_record(b"\x10\x02\x00\x00\x01\x00\x03\x00Foo", Biff::Biff8, &enc);
        assert_eq!(entry.name, "Foo");
        assert_eq!(entry.offset, 0x210);
        assert_eq!(entry.visible, SheetVisible::Hidden);
        assert_eq!(entry.typ, SheetType::WorkSheet);
        let entry = parse_sheet_record(b"\x00\x01\x00\x00\x00\x02\x03Bar", Biff::Biff5, &enc);
        assert_eq!(entry.name, "Bar");
        assert_eq!(entry.typ, SheetType::ChartSheet);
    }

    #[test]
    fn dimensions() {
        let mut biff8 = vec![0; 14];
        biff8[4..8].copy_from_slice(&70_000u32.to_le_bytes());
        biff8[10..12].copy_from_slice(&5u16.to_le_bytes());
        assert_eq!(parse_dimensions(&biff8), (70_000, 5));
        assert_eq!(parse_dimensions(&[0, 0, 9, 0, 0, 0, 3, 0, 0, 0]), (9, 3));
    }

    #[test]
    fn url_hyperlink_with_description_and_mark() {
        let mut data = link_header(0x01 | 0x02 | 0x08 | 0x14);
        data.extend_from_slice(&3u32.to_le_bytes());
        data.extend(utf16("ab\0"));
        data.push(0xE0);
        data.extend_from_slice(&[0; 15]);
        let url = utf16("http://x.org\0");
        data.extend_from_slice(&(url.len() as u32).to_le_bytes());
        data.extend(url);
        data.extend_from_slice(&4u32.to_le_bytes());
        data.extend(utf16("top\0"));

        let (range, url) = parse_hyperlink(&data, &enc()).unwrap();
        assert_eq!(range.to_string(), "A2:B3");
        assert_eq!(url.as_deref(), Some("http://x.org#top"));
    }

    #[test]
    fn workbook_and_local_hyperlinks() {
        let mut data = link_header(0x08);
        data.extend_from_slice(&10u32.to_le_bytes());
        data.extend(utf16("Sheet2!A1\0"));
        let (_, url) = parse_hyperlink(&data, &enc()).unwrap();
        assert_eq!(url.as_deref(), Some("sheet://Sheet2!A1"));

        let mut data = link_header(0x01);
        data.push(0x03);
        data.extend_from_slice(&[0; 15]);
        data.extend_from_slice(&2u16.to_le_bytes());
        data.extend_from_slice(&8u32.to_le_bytes());
        data.extend_from_slice(b"doc.xls\0");
        data.extend_from_slice(&[0; 24]);
        data.extend_from_slice(&0u32.to_le_bytes());
        let (_, url) = parse_hyperlink(&data, &enc()).unwrap();
        assert_eq!(url.as_deref(), Some("..\\..\\doc.xls"));

        let (_, url) = parse_hyperlink(&link_header(0x101), &enc()).unwrap();
        assert_eq!(url, None);
    }

    fn record(typ: u16, data: &[u8]) -> Vec<u8> {
        let mut buf = typ.to_le_bytes().to_vec();
        buf.extend_from_slice(&(data.len() as u16).to_le_bytes());
        buf.extend_from_slice(data);
        buf
    }

    fn entry() -> SheetEntry {
        SheetEntry {
            name: "Sheet1".to_string(),
            offset: 0,
            visible: SheetVisible::Visible,
            typ: SheetType::WorkSheet,
        }
    }

    #[test]
    fn embedded_chart_is_skipped() {
        let mut s = record(BOF, &[0, 6, 0x10, 0]);
        s.extend(record(BOF, &[0, 6, 0x20, 0]));
        // chart records sharing ids with sheet records
        s.extend(record(DIMENSION, &[0, 0, 0, 0, 0xFF, 0, 0, 0, 0, 0, 0x10, 0, 0, 0]));
        s.extend(record(MERGEDCELLS, &[1, 0, 7, 0, 7, 0, 0, 0, 0, 0]));
        s.extend(record(EOF, &[]));
        s.extend(record(MERGEDCELLS, &[1, 0, 0, 0, 1, 0, 0, 0, 1, 0]));
        let mut tip = vec![0x00, 0x08, 0x00, 0x00];
        for v in [0u16, 0, 0, 0] {
            tip.extend_from_slice(&v.to_le_bytes());
        }
        tip.extend(utf16("after chart\0"));
        s.extend(record(QUICKTIP, &tip));
        s.extend(record(EOF, &[]));

        let SheetIndex { sheet, .. } = index_sheet(&s, 0, &entry(), &enc());
        assert_eq!(sheet.merge_cells(), &[CellRange::new((0, 0), (1, 1))]);
        assert_eq!(sheet.hyperlink("A1").and_then(|h| h.tooltip()), Some("after chart"));
        assert_eq!((sheet.total_rows, sheet.total_columns), (0, 0));
    }

    #[test]
    fn rows_indexed_without_dbcell() {
        let mut s = record(BOF, &[0, 6, 0x10, 0]);
        let mut blank = Vec::new();
        for v in [0u16, 0, 0] {
            blank.extend_from_slice(&v.to_le_bytes());
        }
        s.extend(record(BLANK, &blank));
        // row 1 only has cells from column 3 on
        let second = s.len();
        let mut number = Vec::new();
        for v in [1u16, 3, 0] {
            number.extend_from_slice(&v.to_le_bytes());
        }
        number.extend_from_slice(&1.5f64.to_le_bytes());
        s.extend(record(NUMBER, &number));
        number[2] = 4;
        s.extend(record(NUMBER, &number));
        s.extend(record(EOF, &[]));

        let SheetIndex { row_offsets, .. } = index_sheet(&s, 0, &entry(), &enc());
        assert_eq!(row_offsets.get(&0), Some(&8));
        assert_eq!(row_offsets.get(&1), Some(&second));
    }

    #[test]
    fn quicktip() {
        let mut data = vec![0x00, 0x08, 0x00, 0x00];
        for v in [3u16, 3, 1, 2] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        data.extend(utf16("hint\0"));
        let (range, tooltip) = parse_quicktip(&data, &enc());
        assert_eq!(range.to_string(), "B4:C4");
        assert_eq!(tooltip, "hint");
    }
}
