//! Decoded workbook: sheets, styles and shared strings

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::Calendar;
use crate::coordinate::{column_letter, parse_coordinate, CellRange};
use crate::style::Style;

/// Url prefix of links pointing inside the workbook
pub const INTERNAL_LINK_PREFIX: &str = "sheet://";

/// A hyperlink attached to a cell
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hyperlink {
    pub(crate) url: Option<String>,
    pub(crate) tooltip: Option<String>,
}

impl Hyperlink {
    /// Creates a link to `url`
    pub fn new(url: impl Into<String>) -> Hyperlink {
        Hyperlink {
            url: Some(url.into()),
            tooltip: None,
        }
    }

    /// Target, `None` for UNC paths and tooltip-only entries
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Tooltip shown when hovering the cell
    pub fn tooltip(&self) -> Option<&str> {
        self.tooltip.as_deref()
    }

    /// Whether the link targets another place of the workbook
    pub fn is_internal(&self) -> bool {
        self.url
            .as_deref()
            .is_some_and(|u| u.contains(INTERNAL_LINK_PREFIX))
    }
}

/// Visibility of a sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SheetVisible {
    /// Visible
    #[default]
    Visible,
    /// Hidden
    Hidden,
    /// The sheet is hidden and cannot be displayed using the user interface
    VeryHidden,
}

/// Type of a sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SheetType {
    /// WorkSheet
    #[default]
    WorkSheet,
    /// MacroSheet
    MacroSheet,
    /// ChartSheet
    ChartSheet,
    /// VBA module
    Vba,
}

/// Auto filter applied to a sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoFilter {
    /// Filtered range, header row included
    pub range: CellRange,
}

/// Sheet metadata known once the workbook is open
///
/// Cell values are not stored here, they are decoded row by row.
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub(crate) name: String,
    pub(crate) index: usize,
    pub(crate) total_rows: u32,
    pub(crate) total_columns: u32,
    pub(crate) visible: SheetVisible,
    pub(crate) typ: SheetType,
    pub(crate) auto_filter: Option<AutoFilter>,
    pub(crate) hyperlinks: Vec<(CellRange, Hyperlink)>,
    /// Indexes into `hyperlinks` of the ranges covering each row
    pub(crate) hyperlinks_by_row: BTreeMap<u32, Vec<usize>>,
    pub(crate) merges: Vec<CellRange>,
    /// Indexes into `merges` of the ranges covering each row
    pub(crate) merges_by_row: BTreeMap<u32, Vec<usize>>,
}

impl Sheet {
    /// Sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position in the workbook
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of rows, from the DIMENSION record
    pub fn total_rows(&self) -> u32 {
        self.total_rows
    }

    /// Number of columns, from the DIMENSION record
    pub fn total_columns(&self) -> u32 {
        self.total_columns
    }

    /// Letters of the last column, `None` for an empty sheet
    pub fn last_column_letter(&self) -> Option<String> {
        self.total_columns
            .checked_sub(1)
            .map(column_letter)
    }

    /// Visibility
    pub fn visible(&self) -> SheetVisible {
        self.visible
    }

    /// Sheet type
    pub fn sheet_type(&self) -> SheetType {
        self.typ
    }

    /// Auto filter, if any
    pub fn auto_filter(&self) -> Option<&AutoFilter> {
        self.auto_filter.as_ref()
    }

    /// Sets the auto filter
    pub fn set_auto_filter(&mut self, auto_filter: Option<AutoFilter>) {
        self.auto_filter = auto_filter;
    }

    /// Hyperlinks with the range they cover, in record order
    pub fn hyperlinks(&self) -> &[(CellRange, Hyperlink)] {
        &self.hyperlinks
    }

    /// Hyperlink at a position, the last record covering it wins
    pub fn hyperlink_at(&self, row: u32, col: u32) -> Option<&Hyperlink> {
        self.hyperlinks_by_row
            .get(&row)?
            .iter()
            .rev()
            .filter_map(|&i| self.hyperlinks.get(i))
            .find(|(range, _)| range.contains(row, col))
            .map(|(_, link)| link)
    }

    /// Hyperlink at an `A1` coordinate
    pub fn hyperlink(&self, coordinate: &str) -> Option<&Hyperlink> {
        let (row, col) = parse_coordinate(coordinate)?;
        self.hyperlink_at(row, col)
    }

    /// Merged ranges in record order
    pub fn merge_cells(&self) -> &[CellRange] {
        &self.merges
    }

    /// Merged ranges covering `row`
    pub fn merge_cells_in_row(&self, row: u32) -> impl Iterator<Item = &CellRange> {
        self.merges_by_row
            .get(&row)
            .into_iter()
            .flatten()
            .filter_map(|&i| self.merges.get(i))
    }

    /// First merged range containing a position
    pub fn merge_range_at(&self, row: u32, col: u32) -> Option<&CellRange> {
        self.merge_cells_in_row(row).find(|r| r.contains(row, col))
    }

    /// First merged range containing an `A1` coordinate
    pub fn merge_cell(&self, coordinate: &str) -> Option<&CellRange> {
        let (row, col) = parse_coordinate(coordinate)?;
        self.merge_range_at(row, col)
    }

    pub(crate) fn add_merge(&mut self, range: CellRange) {
        let i = self.merges.len();
        for row in range.start.0..=range.end.0 {
            self.merges_by_row.entry(row).or_default().push(i);
        }
        self.merges.push(range);
    }

    pub(crate) fn add_hyperlink(&mut self, range: CellRange, url: String) {
        self.push_hyperlink(range, Hyperlink::new(url));
    }

    fn push_hyperlink(&mut self, range: CellRange, link: Hyperlink) {
        let i = self.hyperlinks.len();
        for row in range.start.0..=range.end.0 {
            self.hyperlinks_by_row.entry(row).or_default().push(i);
        }
        self.hyperlinks.push((range, link));
    }

    /// Attaches a tooltip to the last link over the same range, or to a new
    /// url-less link
    pub(crate) fn add_tooltip(&mut self, range: CellRange, tooltip: String) {
        match self.hyperlinks.iter_mut().rev().find(|(r, _)| *r == range) {
            Some((_, link)) => link.tooltip = Some(tooltip),
            None => self.push_hyperlink(
                range,
                Hyperlink {
                    url: None,
                    tooltip: Some(tooltip),
                },
            ),
        }
    }
}

/// Everything decoded from the workbook globals
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    pub(crate) sheets: Vec<Sheet>,
    pub(crate) styles: BTreeMap<usize, Arc<Style>>,
    pub(crate) default_style: Arc<Style>,
    pub(crate) strings: Vec<String>,
    pub(crate) biff_version: u16,
    pub(crate) codepage: u16,
    pub(crate) calendar: Calendar,
    pub(crate) full_precision: bool,
    pub(crate) active_sheet: usize,
}

impl Workbook {
    /// Sheets in workbook order
    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    /// Sheet names in workbook order
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name()).collect()
    }

    /// Sheet selected when the workbook was saved
    pub fn active_sheet(&self) -> Option<&Sheet> {
        self.sheets.get(self.active_sheet)
    }

    /// Style of an xf index, the default style when it is not a cell style
    pub fn style_at(&self, xf_index: usize) -> &Arc<Style> {
        self.styles.get(&xf_index).unwrap_or(&self.default_style)
    }

    /// Cell styles by xf index
    pub fn styles(&self) -> &BTreeMap<usize, Arc<Style>> {
        &self.styles
    }

    /// Shared string by index
    pub fn shared_string_at(&self, index: usize) -> Option<&str> {
        self.strings.get(index).map(|s| s.as_str())
    }

    /// Number of shared strings
    pub fn shared_string_count(&self) -> usize {
        self.strings.len()
    }

    /// BIFF version of the workbook globals (`0x0600` for BIFF8)
    pub fn biff_version(&self) -> u16 {
        self.biff_version
    }

    /// Code page of 8-bit strings
    pub fn codepage(&self) -> u16 {
        self.codepage
    }

    /// Date system of serial numbers
    pub fn calendar(&self) -> Calendar {
        self.calendar
    }

    /// Whether formulas use stored values rather than displayed ones
    pub fn full_precision(&self) -> bool {
        self.full_precision
    }
}
