//! Rows and cells produced by row iterators
//!
//! Every backend decodes raw values into a [`Row`] then calls
//! [`enrich_row`], which attaches styles, hyperlinks and merged ranges the
//! same way for all of them.

use std::cell::OnceCell;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::config::Calendar;
use crate::coordinate::{coordinate, CellRange};
use crate::datatype::Data;
use crate::de::{DeError, RowDeserializer};
use crate::formats::format_value;
use crate::style::Style;
use crate::workbook::{Hyperlink, Sheet, Workbook};

/// A decoded cell
#[derive(Debug, Clone, Default)]
pub struct Cell {
    row: u32,
    col: Option<u32>,
    xf_index: usize,
    value: Data,
    formula: Option<String>,
    formatted: OnceCell<String>,
    calendar: Calendar,
    merge: Option<CellRange>,
    hyperlink: Option<Hyperlink>,
    style: Option<Arc<Style>>,
}

impl Cell {
    /// Creates an empty cell
    pub fn new(row: u32, col: Option<u32>) -> Cell {
        Cell {
            row,
            col,
            ..Cell::default()
        }
    }

    /// 0-based row
    pub fn row(&self) -> u32 {
        self.row
    }

    /// 0-based column, `None` until the cell is placed
    pub fn column(&self) -> Option<u32> {
        self.col
    }

    /// `A1` coordinate, `None` until the cell is placed
    pub fn coordinate(&self) -> Option<String> {
        self.col.map(|c| coordinate(self.row, c))
    }

    /// Index of the XF record
    pub fn xf_index(&self) -> usize {
        self.xf_index
    }

    /// Sets the index of the XF record
    pub fn set_xf_index(&mut self, xf_index: usize) {
        self.xf_index = xf_index;
    }

    /// Raw value
    pub fn value(&self) -> &Data {
        &self.value
    }

    /// Sets the raw value, dropping any cached formatted value
    pub fn set_value(&mut self, value: Data) {
        self.value = value;
        self.formatted = OnceCell::new();
    }

    /// Formula text, for backends that keep it
    pub fn formula(&self) -> Option<&str> {
        self.formula.as_deref()
    }

    /// Sets the formula text
    pub fn set_formula(&mut self, formula: String) {
        self.formula = Some(formula);
    }

    /// Value rendered with the number format of its style
    ///
    /// Computed once then cached. Non numeric values and cells without a
    /// style render as their raw text.
    pub fn formatted_value(&self) -> &str {
        self.formatted.get_or_init(|| match (&self.style, self.value.as_f64()) {
            (Some(style), Some(v)) if !style.format_code().is_empty() => {
                format_value(v, style.format_code(), self.calendar)
            }
            _ => self.value.to_string(),
        })
    }

    /// First merged range containing the cell
    pub fn merge_range(&self) -> Option<&CellRange> {
        self.merge.as_ref()
    }

    /// Hyperlink of the cell
    pub fn hyperlink(&self) -> Option<&Hyperlink> {
        self.hyperlink.as_ref()
    }

    /// Resolved style
    pub fn style(&self) -> Option<&Arc<Style>> {
        self.style.as_ref()
    }
}

/// Cells of one row, dense from column 0
#[derive(Debug, Clone, Default)]
pub struct Row {
    index: u32,
    cells: Vec<Cell>,
}

impl Row {
    /// A row of `width` empty cells
    pub fn empty(index: u32, width: u32) -> Row {
        Row {
            index,
            cells: (0..width).map(|c| Cell::new(index, Some(c))).collect(),
        }
    }

    /// 0-based row index
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Cells
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Cell at a column
    pub fn get(&self, col: u32) -> Option<&Cell> {
        self.cells.get(col as usize)
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the row has no cell at all
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterates over the cells
    pub fn iter(&self) -> std::slice::Iter<'_, Cell> {
        self.cells.iter()
    }

    /// Text of every cell, formatted or raw
    pub fn to_values(&self, formatted: bool) -> Vec<String> {
        self.cells
            .iter()
            .map(|c| {
                if formatted {
                    c.formatted_value().to_string()
                } else {
                    c.value().to_string()
                }
            })
            .collect()
    }

    /// Deserializes the raw cell values, in column order, into `T`
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, DeError> {
        serde::Deserialize::deserialize(RowDeserializer::new(self))
    }

    /// Cell at a column, growing the row when the column is past its end
    pub fn cell_mut(&mut self, col: u32) -> &mut Cell {
        let index = self.index;
        let len = self.cells.len() as u32;
        if col >= len {
            self.cells
                .extend((len..=col).map(|c| Cell::new(index, Some(c))));
        }
        &mut self.cells[col as usize]
    }
}

impl<'a> IntoIterator for &'a Row {
    type Item = &'a Cell;
    type IntoIter = std::slice::Iter<'a, Cell>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.iter()
    }
}

/// Lazy, forward only iteration over a half-open window of rows
///
/// `Iterator::next` yields [`current`](RowIterator::current) then
/// [`advance`](RowIterator::advance)s while the iterator is
/// [`valid`](RowIterator::valid).
pub trait RowIterator: Iterator<Item = Row> {
    /// Current 0-based row
    fn position(&self) -> u32;
    /// Whether the position is inside `[start_row, end_row)`
    fn valid(&self) -> bool {
        (self.start_row()..self.end_row()).contains(&self.position())
    }
    /// Decodes and enriches the row at the current position
    fn current(&mut self) -> Row;
    /// Moves to the next row
    fn advance(&mut self);
    /// Moves back to the first row of the window
    fn rewind(&mut self);
    /// First row of the window
    fn start_row(&self) -> u32;
    /// Row after the last row of the window
    fn end_row(&self) -> u32;
}

/// What [`enrich_row`] reads
#[derive(Debug, Clone, Copy)]
pub struct EnrichContext<'a> {
    /// Workbook holding the style table
    pub workbook: &'a Workbook,
    /// Sheet holding hyperlinks and merged ranges
    pub sheet: &'a Sheet,
}

/// Attaches style, hyperlink and first containing merge range to every
/// placed cell of the row
pub fn enrich_row(row: &mut Row, ctx: &EnrichContext<'_>) {
    let calendar = ctx.workbook.calendar();
    let merges: Vec<&CellRange> = ctx.sheet.merge_cells_in_row(row.index).collect();
    for cell in row.cells.iter_mut() {
        cell.calendar = calendar;
        cell.style = Some(ctx.workbook.style_at(cell.xf_index).clone());
        let Some(col) = cell.col else {
            continue;
        };
        cell.hyperlink = ctx.sheet.hyperlink_at(cell.row, col).cloned();
        cell.merge = merges.iter().find(|r| r.contains(cell.row, col)).copied().copied();
        cell.formatted = OnceCell::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::NumberFormat;

    fn workbook_with_format(code: &str) -> Workbook {
        let mut wb = Workbook::default();
        let style = Style {
            number_format: NumberFormat::new(164, code),
            index: Some(21),
            ..Style::default()
        };
        wb.styles.insert(21, Arc::new(style));
        wb
    }

    #[test]
    fn rows_grow_past_their_width() {
        let mut row = Row::empty(4, 2);
        row.cell_mut(4).set_value(Data::Int(1));
        assert_eq!(row.len(), 5);
        assert_eq!(row.get(3).unwrap().coordinate().as_deref(), Some("D5"));
        assert_eq!(row.to_values(false), vec!["", "", "", "", "1"]);
    }

    #[test]
    fn enrichment() {
        let wb = workbook_with_format("0.00");
        let mut sheet = Sheet::default();
        sheet.add_merge(CellRange::new((0, 1), (1, 2)));
        sheet.add_hyperlink(CellRange::new((0, 0), (0, 0)), "https://example.com".into());

        let mut row = Row::empty(0, 3);
        row.cell_mut(0).set_value(Data::Float(3.1));
        row.cell_mut(0).set_xf_index(21);
        row.cell_mut(2).set_value(Data::String("x".to_string()));
        enrich_row(
            &mut row,
            &EnrichContext {
                workbook: &wb,
                sheet: &sheet,
            },
        );

        let a1 = row.get(0).unwrap();
        assert_eq!(a1.formatted_value(), "3.10");
        assert_eq!(a1.value().to_string(), "3.1");
        assert_eq!(a1.hyperlink().and_then(|h| h.url()), Some("https://example.com"));
        assert!(a1.merge_range().is_none());

        let c1 = row.get(2).unwrap();
        assert_eq!(c1.merge_range().map(|r| r.to_string()).as_deref(), Some("B1:C2"));
        assert_eq!(c1.formatted_value(), "x");
        // unknown xf index falls back to the default style
        assert_eq!(c1.style().unwrap().format_code(), "General");
        assert_eq!(row.to_values(true), vec!["3.10", "", "x"]);
    }
}
