//! Builders of in-memory compound files and BIFF workbook streams
#![allow(dead_code)]

use std::collections::BTreeMap;

const SECTOR: usize = 512;
const MINI_SECTOR: usize = 64;
const MINI_CUTOFF: usize = 4096;
const END_OF_CHAIN: u32 = 0xFFFF_FFFE;
const FREE: u32 = 0xFFFF_FFFF;
const FAT_SECTOR: u32 = 0xFFFF_FFFD;

pub const BOF: u16 = 0x0809;
pub const EOF: u16 = 0x000A;
pub const CONTINUE: u16 = 0x003C;
pub const CODEPAGE: u16 = 0x0042;
pub const DATEMODE: u16 = 0x0022;
pub const WINDOW1: u16 = 0x003D;
pub const FONT: u16 = 0x0031;
pub const FORMAT: u16 = 0x041E;
pub const XF: u16 = 0x00E0;
pub const SST: u16 = 0x00FC;
pub const SHEET: u16 = 0x0085;
pub const DIMENSION: u16 = 0x0200;
pub const ROW: u16 = 0x0208;
pub const DBCELL: u16 = 0x00D7;
pub const MERGEDCELLS: u16 = 0x00E5;
pub const HYPERLINK: u16 = 0x01B8;
pub const QUICKTIP: u16 = 0x0800;
pub const BLANK: u16 = 0x0201;
pub const RK: u16 = 0x027E;
pub const MULRK: u16 = 0x00BD;
pub const NUMBER: u16 = 0x0203;
pub const LABEL: u16 = 0x0204;
pub const BOOLERR: u16 = 0x0205;
pub const FORMULA: u16 = 0x0006;
pub const STRING: u16 = 0x0207;
pub const LABELSST: u16 = 0x00FD;

fn push_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn push_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn sectors(len: usize, size: usize) -> usize {
    len.div_ceil(size)
}

fn pad(buf: &mut Vec<u8>, size: usize) {
    let len = sectors(buf.len(), size) * size;
    buf.resize(len, 0);
}

fn dir_entry(name: &str, typ: u8, start: u32, len: u32, child: u32, right: u32) -> Vec<u8> {
    let mut e = vec![0u8; 128];
    let chars: Vec<u16> = name.encode_utf16().collect();
    for (i, c) in chars.iter().enumerate() {
        e[2 * i..2 * i + 2].copy_from_slice(&c.to_le_bytes());
    }
    e[0x40..0x42].copy_from_slice(&(((chars.len() + 1) * 2) as u16).to_le_bytes());
    e[0x42] = typ;
    e[0x43] = 1;
    e[0x44..0x48].copy_from_slice(&FREE.to_le_bytes());
    e[0x48..0x4C].copy_from_slice(&right.to_le_bytes());
    e[0x4C..0x50].copy_from_slice(&child.to_le_bytes());
    e[0x74..0x78].copy_from_slice(&start.to_le_bytes());
    e[0x78..0x7C].copy_from_slice(&len.to_le_bytes());
    e
}

/// Version 3 compound file (512 bytes sectors) holding `streams` at the
/// root storage; streams under 4096 bytes go to the mini stream
pub fn compound_file(streams: &[(&str, &[u8])]) -> Vec<u8> {
    let mut mini_stream = Vec::new();
    let mut mini_fat: Vec<u32> = Vec::new();
    let mut starts = vec![END_OF_CHAIN; streams.len()];
    let mut big = Vec::new();
    for (i, (_, data)) in streams.iter().enumerate() {
        if data.len() < MINI_CUTOFF {
            let n = sectors(data.len(), MINI_SECTOR);
            if n > 0 {
                let first = mini_fat.len() as u32;
                starts[i] = first;
                for k in 0..n as u32 {
                    mini_fat.push(if k + 1 == n as u32 { END_OF_CHAIN } else { first + k + 1 });
                }
            }
            mini_stream.extend_from_slice(data);
            pad(&mut mini_stream, MINI_SECTOR);
        } else {
            big.push(i);
        }
    }
    let mini_stream_len = mini_stream.len();

    let dir_len = (streams.len() + 1) * 128;
    let mut mini_fat_bytes = Vec::new();
    for v in &mini_fat {
        push_u32(&mut mini_fat_bytes, *v);
    }
    if !mini_fat_bytes.is_empty() {
        let len = sectors(mini_fat_bytes.len(), SECTOR) * SECTOR;
        mini_fat_bytes.resize(len, 0xFF);
    }

    // chains in file order: directory, mini FAT, mini stream, big streams
    let mut lens = vec![dir_len, mini_fat_bytes.len(), mini_stream.len()];
    lens.extend(big.iter().map(|&i| streams[i].1.len()));
    let counts: Vec<usize> = lens.iter().map(|&l| sectors(l, SECTOR)).collect();
    let total: usize = counts.iter().sum();
    let mut fat_count = 1;
    while fat_count * (SECTOR / 4) < total + fat_count {
        fat_count += 1;
    }

    let mut chain_starts = Vec::new();
    let mut fat: Vec<u32> = vec![FAT_SECTOR; fat_count];
    for &n in &counts {
        let first = fat.len() as u32;
        chain_starts.push(if n == 0 { END_OF_CHAIN } else { first });
        for k in 0..n as u32 {
            fat.push(if k + 1 == n as u32 { END_OF_CHAIN } else { first + k + 1 });
        }
    }
    fat.resize(fat_count * SECTOR / 4, FREE);
    for (k, &i) in big.iter().enumerate() {
        starts[i] = chain_starts[3 + k];
    }

    let mut dir = dir_entry(
        "Root Entry",
        5,
        chain_starts[2],
        mini_stream_len as u32,
        if streams.is_empty() { FREE } else { 1 },
        FREE,
    );
    for (i, (name, data)) in streams.iter().enumerate() {
        let right = if i + 1 < streams.len() { i as u32 + 2 } else { FREE };
        dir.extend(dir_entry(name, 2, starts[i], data.len() as u32, FREE, right));
    }

    let mut header = vec![0u8; SECTOR];
    header[..8].copy_from_slice(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1]);
    header[0x18..0x1A].copy_from_slice(&0x3Eu16.to_le_bytes());
    header[0x1A..0x1C].copy_from_slice(&3u16.to_le_bytes());
    header[0x1C..0x1E].copy_from_slice(&0xFFFEu16.to_le_bytes());
    header[0x1E..0x20].copy_from_slice(&9u16.to_le_bytes());
    header[0x20..0x22].copy_from_slice(&6u16.to_le_bytes());
    header[0x2C..0x30].copy_from_slice(&(fat_count as u32).to_le_bytes());
    header[0x30..0x34].copy_from_slice(&chain_starts[0].to_le_bytes());
    header[0x38..0x3C].copy_from_slice(&(MINI_CUTOFF as u32).to_le_bytes());
    header[0x3C..0x40].copy_from_slice(&chain_starts[1].to_le_bytes());
    header[0x40..0x44].copy_from_slice(&(counts[1] as u32).to_le_bytes());
    header[0x44..0x48].copy_from_slice(&END_OF_CHAIN.to_le_bytes());
    for slot in header[0x4C..].chunks_exact_mut(4) {
        slot.copy_from_slice(&FREE.to_le_bytes());
    }
    for i in 0..fat_count {
        let pos = 0x4C + 4 * i;
        header[pos..pos + 4].copy_from_slice(&(i as u32).to_le_bytes());
    }

    let mut file = header;
    for v in &fat {
        push_u32(&mut file, *v);
    }
    let mut chains: Vec<Vec<u8>> = vec![dir, mini_fat_bytes, mini_stream];
    chains.extend(big.iter().map(|&i| streams[i].1.to_vec()));
    for mut chain in chains {
        pad(&mut chain, SECTOR);
        file.extend(chain);
    }
    file
}

/// A BIFF record
pub fn record(typ: u16, data: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(data.len() + 4);
    push_u16(&mut buf, typ);
    push_u16(&mut buf, data.len() as u16);
    buf.extend_from_slice(data);
    buf
}

/// Characters of a BIFF8 string: option flags then latin-1 bytes when
/// possible, UTF-16LE otherwise
fn unicode_body(s: &str) -> (usize, Vec<u8>) {
    let chars: Vec<u16> = s.encode_utf16().collect();
    let mut buf = Vec::new();
    if chars.iter().all(|&c| c < 0x100) {
        buf.push(0);
        buf.extend(chars.iter().map(|&c| c as u8));
    } else {
        buf.push(1);
        for c in &chars {
            push_u16(&mut buf, *c);
        }
    }
    (chars.len(), buf)
}

/// BIFF8 string with a 1 byte character count
pub fn unicode_short(s: &str) -> Vec<u8> {
    let (len, body) = unicode_body(s);
    let mut buf = vec![len as u8];
    buf.extend(body);
    buf
}

/// BIFF8 string with a 2 bytes character count
pub fn unicode_long(s: &str) -> Vec<u8> {
    let (len, body) = unicode_body(s);
    let mut buf = Vec::new();
    push_u16(&mut buf, len as u16);
    buf.extend(body);
    buf
}

/// UTF-16LE without terminator
pub fn utf16(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(|c| c.to_le_bytes()).collect()
}

/// 8-bit string with a 1 byte length prefix
pub fn byte_short(s: &[u8]) -> Vec<u8> {
    let mut buf = vec![s.len() as u8];
    buf.extend_from_slice(s);
    buf
}

/// 8-bit string with a 2 bytes length prefix
pub fn byte_long(s: &[u8]) -> Vec<u8> {
    let mut buf = Vec::new();
    push_u16(&mut buf, s.len() as u16);
    buf.extend_from_slice(s);
    buf
}

fn cell_header(row: u32, col: u32, xf: u16) -> Vec<u8> {
    let mut buf = Vec::new();
    push_u16(&mut buf, row as u16);
    push_u16(&mut buf, col as u16);
    push_u16(&mut buf, xf);
    buf
}

/// A cell record with its row
pub struct CellRecord {
    pub row: u32,
    pub bytes: Vec<u8>,
}

fn cell(typ: u16, row: u32, col: u32, xf: u16, rest: &[u8]) -> CellRecord {
    let mut data = cell_header(row, col, xf);
    data.extend_from_slice(rest);
    CellRecord {
        row,
        bytes: record(typ, &data),
    }
}

pub fn number(row: u32, col: u32, xf: u16, v: f64) -> CellRecord {
    cell(NUMBER, row, col, xf, &v.to_le_bytes())
}

pub fn rk(row: u32, col: u32, xf: u16, word: u32) -> CellRecord {
    cell(RK, row, col, xf, &word.to_le_bytes())
}

pub fn blank(row: u32, col: u32, xf: u16) -> CellRecord {
    cell(BLANK, row, col, xf, &[])
}

/// MULRK from `col`, one (xf, rk) pair per cell
pub fn mulrk(row: u32, col: u32, values: &[(u16, u32)]) -> CellRecord {
    let mut data = Vec::new();
    push_u16(&mut data, row as u16);
    push_u16(&mut data, col as u16);
    for (xf, word) in values {
        push_u16(&mut data, *xf);
        push_u32(&mut data, *word);
    }
    push_u16(&mut data, col as u16 + values.len() as u16 - 1);
    CellRecord {
        row,
        bytes: record(MULRK, &data),
    }
}

pub fn label_sst(row: u32, col: u32, xf: u16, index: u32) -> CellRecord {
    cell(LABELSST, row, col, xf, &index.to_le_bytes())
}

pub fn label(row: u32, col: u32, xf: u16, s: &str) -> CellRecord {
    cell(LABEL, row, col, xf, &unicode_long(s))
}

pub fn label_bytes(row: u32, col: u32, xf: u16, s: &[u8]) -> CellRecord {
    cell(LABEL, row, col, xf, &byte_long(s))
}

pub fn boolerr(row: u32, col: u32, xf: u16, value: u8, is_error: bool) -> CellRecord {
    cell(BOOLERR, row, col, xf, &[value, is_error as u8])
}

/// FORMULA with an 8 bytes cached result and an empty expression
pub fn formula(row: u32, col: u32, xf: u16, result: [u8; 8]) -> CellRecord {
    let mut rest = result.to_vec();
    rest.extend_from_slice(&[0; 6]);
    cell(FORMULA, row, col, xf, &rest)
}

/// FORMULA returning text, followed by its STRING record
pub fn formula_text(row: u32, col: u32, xf: u16, s: &str) -> CellRecord {
    let mut rec = formula(row, col, xf, [0, 0, 0, 0, 0, 0, 0xFF, 0xFF]);
    rec.bytes.extend(record(STRING, &unicode_long(s)));
    rec
}

/// FORMULA record layout: result bytes at +6, `FF FF` at +12 for non numbers
pub fn formula_special(kind: u8, value: u8) -> [u8; 8] {
    [kind, 0, value, 0, 0, 0, 0xFF, 0xFF]
}

/// A worksheet substream
#[derive(Default)]
pub struct SheetBuilder {
    pub name: String,
    pub visibility: u8,
    pub rows: u32,
    pub cols: u16,
    pub cells: Vec<CellRecord>,
    pub merges: Vec<(u16, u16, u16, u16)>,
    pub extra: Vec<Vec<u8>>,
    pub dbcell: bool,
}

impl SheetBuilder {
    pub fn new(name: &str, rows: u32, cols: u16) -> SheetBuilder {
        SheetBuilder {
            name: name.to_string(),
            rows,
            cols,
            dbcell: true,
            ..SheetBuilder::default()
        }
    }

    pub fn cell(mut self, cell: CellRecord) -> SheetBuilder {
        self.cells.push(cell);
        self
    }

    /// Merged range as (first row, last row, first col, last col)
    pub fn merge(mut self, range: (u16, u16, u16, u16)) -> SheetBuilder {
        self.merges.push(range);
        self
    }

    pub fn record(mut self, bytes: Vec<u8>) -> SheetBuilder {
        self.extra.push(bytes);
        self
    }

    pub fn without_dbcell(mut self) -> SheetBuilder {
        self.dbcell = false;
        self
    }

    fn dimension(&self) -> Vec<u8> {
        let mut data = Vec::new();
        push_u32(&mut data, 0);
        push_u32(&mut data, self.rows);
        push_u16(&mut data, 0);
        push_u16(&mut data, self.cols);
        push_u16(&mut data, 0);
        record(DIMENSION, &data)
    }

    /// Substream bytes, `bof` being the BOF payload of the sheet
    fn build(&self, bof: &[u8]) -> Vec<u8> {
        let mut buf = record(BOF, bof);
        buf.extend(self.dimension());

        let mut by_row: BTreeMap<u32, Vec<&CellRecord>> = BTreeMap::new();
        for c in &self.cells {
            by_row.entry(c.row).or_default().push(c);
        }
        let rows: Vec<u32> = by_row.keys().copied().collect();
        if self.dbcell {
            for block in rows.chunks(32) {
                let first_row = buf.len();
                for &r in block {
                    let mut data = Vec::new();
                    push_u16(&mut data, r as u16);
                    push_u16(&mut data, 0);
                    push_u16(&mut data, self.cols);
                    data.extend_from_slice(&[0; 10]);
                    buf.extend(record(ROW, &data));
                }
                let mut starts = Vec::new();
                for &r in block {
                    starts.push(buf.len());
                    for c in &by_row[&r] {
                        buf.extend_from_slice(&c.bytes);
                    }
                }
                let mut data = Vec::new();
                push_u32(&mut data, (buf.len() - first_row) as u32);
                let mut prev = first_row + 20;
                for s in starts {
                    push_u16(&mut data, (s - prev) as u16);
                    prev = s;
                }
                buf.extend(record(DBCELL, &data));
            }
        } else {
            for c in by_row.values().flatten() {
                buf.extend_from_slice(&c.bytes);
            }
        }

        if !self.merges.is_empty() {
            let mut data = Vec::new();
            push_u16(&mut data, self.merges.len() as u16);
            for (r1, r2, c1, c2) in &self.merges {
                for v in [*r1, *r2, *c1, *c2] {
                    push_u16(&mut data, v);
                }
            }
            buf.extend(record(MERGEDCELLS, &data));
        }
        for r in &self.extra {
            buf.extend_from_slice(r);
        }
        buf.extend(record(EOF, &[]));
        buf
    }
}

/// An embedded chart substream, with a data cell and a merge of its own
pub fn chart_substream(row: u32) -> Vec<u8> {
    let mut buf = record(BOF, &[0x00, 0x06, 0x20, 0x00, 0, 0, 0, 0]);
    buf.extend_from_slice(&number(row, 0, 0, -1.0).bytes);
    buf.extend(record(MERGEDCELLS, &[1, 0, 9, 0, 9, 0, 0, 0, 1, 0]));
    buf.extend(record(EOF, &[]));
    buf
}

/// A BIFF5 or BIFF8 workbook stream
pub struct WorkbookBuilder {
    pub biff8: bool,
    pub codepage: u16,
    pub date_mode: u16,
    pub active_sheet: u16,
    pub formats: Vec<(u16, String)>,
    /// (font index, format id) of each cell XF
    pub xfs: Vec<(u16, u16)>,
    pub strings: Vec<String>,
    /// Largest SST payload before a CONTINUE record is started
    pub sst_chunk: usize,
    pub sheets: Vec<SheetBuilder>,
}

impl WorkbookBuilder {
    pub fn biff8() -> WorkbookBuilder {
        WorkbookBuilder {
            biff8: true,
            codepage: 1200,
            date_mode: 0,
            active_sheet: 0,
            formats: Vec::new(),
            xfs: vec![(0, 0)],
            strings: Vec::new(),
            sst_chunk: 8224,
            sheets: Vec::new(),
        }
    }

    pub fn biff5() -> WorkbookBuilder {
        WorkbookBuilder {
            biff8: false,
            codepage: 1252,
            ..WorkbookBuilder::biff8()
        }
    }

    pub fn sheet(mut self, sheet: SheetBuilder) -> WorkbookBuilder {
        self.sheets.push(sheet);
        self
    }

    pub fn format(mut self, id: u16, code: &str) -> WorkbookBuilder {
        self.formats.push((id, code.to_string()));
        self
    }

    /// Adds a cell XF and returns its index
    pub fn xf(&mut self, font: u16, format: u16) -> u16 {
        self.xfs.push((font, format));
        self.xfs.len() as u16 - 1
    }

    pub fn strings(mut self, strings: &[&str]) -> WorkbookBuilder {
        self.strings = strings.iter().map(|s| s.to_string()).collect();
        self
    }

    fn version(&self) -> u16 {
        if self.biff8 {
            0x0600
        } else {
            0x0500
        }
    }

    fn bof(&self, substream: u16) -> Vec<u8> {
        let mut data = Vec::new();
        push_u16(&mut data, self.version());
        push_u16(&mut data, substream);
        push_u16(&mut data, 0x0DBB);
        push_u16(&mut data, 0x07CC);
        if self.biff8 {
            push_u32(&mut data, 0);
            push_u32(&mut data, 0x0006);
        }
        data
    }

    fn string_short(&self, s: &str) -> Vec<u8> {
        if self.biff8 {
            unicode_short(s)
        } else {
            byte_short(s.as_bytes())
        }
    }

    fn font(&self) -> Vec<u8> {
        let mut data = Vec::new();
        push_u16(&mut data, 200);
        push_u16(&mut data, 0);
        push_u16(&mut data, 0x7FFF);
        push_u16(&mut data, 400);
        push_u16(&mut data, 0);
        data.extend_from_slice(&[0, 0, 0, 0]);
        data.extend(self.string_short("Arial"));
        record(FONT, &data)
    }

    fn xf_record(&self, font: u16, format: u16) -> Vec<u8> {
        let mut data = Vec::new();
        push_u16(&mut data, font);
        push_u16(&mut data, format);
        push_u16(&mut data, 0x0001);
        data.extend_from_slice(&[0x20, 0]);
        if self.biff8 {
            data.extend_from_slice(&[0; 2]);
            push_u32(&mut data, 0);
            push_u32(&mut data, 0);
            push_u16(&mut data, 0x20C0);
        } else {
            push_u32(&mut data, 0x0000_20C0);
            push_u32(&mut data, 0);
        }
        record(XF, &data)
    }

    /// SST record and its CONTINUE records, strings split across records
    /// restate their compression flag
    fn sst(&self) -> Vec<u8> {
        let mut chunks: Vec<Vec<u8>> = Vec::new();
        let mut cur = Vec::new();
        push_u32(&mut cur, self.strings.len() as u32);
        push_u32(&mut cur, self.strings.len() as u32);
        for s in &self.strings {
            let (len, body) = unicode_body(s);
            let flags = body[0];
            let width = if flags & 1 != 0 { 2 } else { 1 };
            if cur.len() + 3 > self.sst_chunk {
                chunks.push(std::mem::take(&mut cur));
            }
            push_u16(&mut cur, len as u16);
            cur.push(flags);
            let mut chars = &body[1..];
            while !chars.is_empty() {
                let room = (self.sst_chunk.saturating_sub(cur.len()) / width) * width;
                if room == 0 {
                    chunks.push(std::mem::take(&mut cur));
                    cur.push(flags);
                    continue;
                }
                let n = room.min(chars.len());
                cur.extend_from_slice(&chars[..n]);
                chars = &chars[n..];
            }
        }
        chunks.push(cur);
        let mut buf = Vec::new();
        for (i, c) in chunks.iter().enumerate() {
            buf.extend(record(if i == 0 { SST } else { CONTINUE }, c));
        }
        buf
    }

    fn sheet_record(&self, offset: u32, sheet: &SheetBuilder) -> Vec<u8> {
        let mut data = Vec::new();
        push_u32(&mut data, offset);
        data.push(sheet.visibility);
        data.push(0);
        data.extend(self.string_short(&sheet.name));
        record(SHEET, &data)
    }

    /// Workbook stream bytes
    pub fn build(&self) -> Vec<u8> {
        let mut globals = record(BOF, &self.bof(0x0005));
        globals.extend(record(CODEPAGE, &self.codepage.to_le_bytes()));
        let mut window = vec![0u8; 18];
        window[10..12].copy_from_slice(&self.active_sheet.to_le_bytes());
        globals.extend(record(WINDOW1, &window));
        globals.extend(record(DATEMODE, &self.date_mode.to_le_bytes()));
        for _ in 0..5 {
            globals.extend(self.font());
        }
        for (id, code) in &self.formats {
            let mut data = Vec::new();
            push_u16(&mut data, *id);
            if self.biff8 {
                data.extend(unicode_long(code));
            } else {
                data.extend(byte_short(code.as_bytes()));
            }
            globals.extend(record(FORMAT, &data));
        }
        for (font, format) in &self.xfs {
            globals.extend(self.xf_record(*font, *format));
        }
        if self.biff8 && !self.strings.is_empty() {
            globals.extend(self.sst());
        }

        let sheet_records_len: usize = self
            .sheets
            .iter()
            .map(|s| self.sheet_record(0, s).len())
            .sum();
        let eof = record(EOF, &[]);
        let mut offset = globals.len() + sheet_records_len + eof.len();
        let substreams: Vec<Vec<u8>> = self
            .sheets
            .iter()
            .map(|s| s.build(&self.bof(0x0010)))
            .collect();
        for (sheet, bytes) in self.sheets.iter().zip(&substreams) {
            globals.extend(self.sheet_record(offset as u32, sheet));
            offset += bytes.len();
        }
        globals.extend(eof);
        for bytes in substreams {
            globals.extend(bytes);
        }
        globals
    }

    /// Compound file holding the workbook stream under its BIFF name
    pub fn build_file(&self) -> Vec<u8> {
        let stream = self.build();
        let name = if self.biff8 { "Workbook" } else { "Book" };
        compound_file(&[(name, &stream)])
    }
}

/// HYPERLINK to an absolute url, with an optional description
pub fn url_hyperlink(range: (u16, u16, u16, u16), url: &str, description: Option<&str>) -> Vec<u8> {
    let mut flags = 0x01 | 0x02;
    if description.is_some() {
        flags |= 0x14;
    }
    let mut data = Vec::new();
    for v in [range.0, range.1, range.2, range.3] {
        push_u16(&mut data, v);
    }
    data.extend_from_slice(&[0; 16]);
    push_u32(&mut data, 2);
    push_u32(&mut data, flags);
    if let Some(d) = description {
        push_u32(&mut data, d.encode_utf16().count() as u32 + 1);
        data.extend(utf16(d));
        data.extend_from_slice(&[0, 0]);
    }
    // url moniker class id
    data.extend_from_slice(&[
        0xE0, 0xC9, 0xEA, 0x79, 0xF9, 0xBA, 0xCE, 0x11, 0x8C, 0x82, 0x00, 0xAA, 0x00, 0x4B, 0xA9,
        0x0B,
    ]);
    let mut target = utf16(url);
    target.extend_from_slice(&[0, 0]);
    push_u32(&mut data, target.len() as u32);
    data.extend(target);
    record(HYPERLINK, &data)
}

/// HYPERLINK to a place of the workbook
pub fn local_hyperlink(range: (u16, u16, u16, u16), mark: &str) -> Vec<u8> {
    let mut data = Vec::new();
    for v in [range.0, range.1, range.2, range.3] {
        push_u16(&mut data, v);
    }
    data.extend_from_slice(&[0; 16]);
    push_u32(&mut data, 2);
    push_u32(&mut data, 0x08);
    push_u32(&mut data, mark.encode_utf16().count() as u32 + 1);
    data.extend(utf16(mark));
    data.extend_from_slice(&[0, 0]);
    record(HYPERLINK, &data)
}

/// QUICKTIP attached to a range
pub fn quicktip(range: (u16, u16, u16, u16), text: &str) -> Vec<u8> {
    let mut data = Vec::new();
    push_u16(&mut data, QUICKTIP);
    push_u16(&mut data, 0);
    for v in [range.0, range.1, range.2, range.3] {
        push_u16(&mut data, v);
    }
    data.extend(utf16(text));
    data.extend_from_slice(&[0, 0]);
    record(QUICKTIP, &data)
}
