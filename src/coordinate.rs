//! Cell coordinates in `A1` notation
//!
//! Rows and columns are 0-based everywhere in the crate, `A1` is `(0, 0)`.

use std::fmt;

/// Number of columns addressable by a worksheet
pub const MAX_COLUMNS: u32 = 16_384;

/// Converts a 0-based column index into its letters (`0` is `A`, `26` is `AA`)
pub fn column_letter(index: u32) -> String {
    let mut buf = [0u8; 8];
    let mut pos = buf.len();
    let mut n = index as u64 + 1;
    while n > 0 {
        n -= 1;
        pos -= 1;
        buf[pos] = b'A' + (n % 26) as u8;
        n /= 26;
    }
    buf[pos..].iter().map(|&b| b as char).collect()
}

/// Converts column letters (case insensitive) into a 0-based column index
pub fn column_index(letters: &str) -> Option<u32> {
    if letters.is_empty() || letters.len() > 7 {
        return None;
    }
    let mut index = 0u64;
    for b in letters.bytes() {
        if !b.is_ascii_alphabetic() {
            return None;
        }
        index = index * 26 + (b.to_ascii_uppercase() - b'A') as u64 + 1;
    }
    u32::try_from(index - 1).ok()
}

/// Formats a `(row, column)` position as `A1` text
pub fn coordinate(row: u32, col: u32) -> String {
    format!("{}{}", column_letter(col), row as u64 + 1)
}

/// Parses `A1` text into a 0-based `(row, column)` position
///
/// Absolute markers (`$B$3`) are accepted.
pub fn parse_coordinate(s: &str) -> Option<(u32, u32)> {
    let s = s.trim();
    let bytes = s.as_bytes();
    let mut split = 0;
    let mut letters = String::with_capacity(3);
    for &b in bytes {
        match b {
            b'$' => {}
            b if b.is_ascii_alphabetic() => letters.push(b as char),
            _ => break,
        }
        split += 1;
    }
    let digits = bytes[split..].strip_prefix(b"$").unwrap_or(&bytes[split..]);
    let row = atoi_simd::parse::<u32>(digits).ok()?;
    if row == 0 {
        return None;
    }
    Some((row - 1, column_index(&letters)?))
}

/// A rectangular block of cells, bounds included
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    /// Top left `(row, column)`
    pub start: (u32, u32),
    /// Bottom right `(row, column)`
    pub end: (u32, u32),
}

impl CellRange {
    /// Creates a range from two corners
    pub fn new(start: (u32, u32), end: (u32, u32)) -> CellRange {
        CellRange { start, end }
    }

    /// Parses `A1:B2` or a single `A1` coordinate
    pub fn parse(s: &str) -> Option<CellRange> {
        match s.split_once(':') {
            Some((a, b)) => Some(CellRange::new(parse_coordinate(a)?, parse_coordinate(b)?)),
            None => parse_coordinate(s).map(|p| CellRange::new(p, p)),
        }
    }

    /// Whether the position lies inside the range
    pub fn contains(&self, row: u32, col: u32) -> bool {
        (self.start.0..=self.end.0).contains(&row) && (self.start.1..=self.end.1).contains(&col)
    }

    /// Every `(row, column)` of the range, row by row
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32)> {
        let (c0, c1) = (self.start.1, self.end.1);
        (self.start.0..=self.end.0).flat_map(move |r| (c0..=c1).map(move |c| (r, c)))
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            coordinate(self.start.0, self.start.1),
            coordinate(self.end.0, self.end.1)
        )
    }
}
