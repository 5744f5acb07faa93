// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

//! Cell formatting decoded from the XF records of a workbook
//!
//! A [`Style`] is built once per cell XF, with its font and palette colors
//! already resolved, and shared between cells through the workbook style
//! table. Two styles are equal when their content is equal, whatever their
//! xf index.

use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};

use crate::formats::is_date_format;

/// An opaque RGB color, resolved from the workbook palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    /// Red channel
    pub red: u8,
    /// Green channel
    pub green: u8,
    /// Blue channel
    pub blue: u8,
}

impl Color {
    /// Color from its channels
    pub const fn rgb(red: u8, green: u8, blue: u8) -> Color {
        Color { red, green, blue }
    }

    /// Color from a `0xRRGGBB` integer, as palette tables are written
    pub const fn from_rgb_u32(rgb: u32) -> Color {
        Color::rgb((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
    }

    /// `RRGGBB` hexadecimal text
    pub fn to_hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.red, self.green, self.blue)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.to_hex())
    }
}

/// Line style of a border, in XF nibble order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BorderStyle {
    /// No line
    #[default]
    None,
    /// Thin
    Thin,
    /// Medium
    Medium,
    /// Dashed
    Dashed,
    /// Dotted
    Dotted,
    /// Thick
    Thick,
    /// Double
    Double,
    /// Hair
    Hair,
    /// Medium dashed
    MediumDashed,
    /// Dash dot
    DashDot,
    /// Medium dash dot
    MediumDashDot,
    /// Dash dot dot
    DashDotDot,
    /// Medium dash dot dot
    MediumDashDotDot,
    /// Slanted dash dot
    SlantDashDot,
}

/// One side of the cell border
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Border {
    /// Line style
    pub style: BorderStyle,
    /// Line color, set for every decoded side even without a line
    pub color: Option<Color>,
}

impl Border {
    /// Whether a line is drawn
    pub fn is_visible(&self) -> bool {
        self.style != BorderStyle::None
    }
}

/// Diagonals drawn with the diagonal border (BIFF8 only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DiagonalDirection {
    /// No diagonal
    #[default]
    None,
    /// Top left to bottom right
    Down,
    /// Bottom left to top right
    Up,
    /// Both diagonals
    Both,
}

/// The four sides and the diagonal of a cell
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Borders {
    /// Left
    pub left: Border,
    /// Right
    pub right: Border,
    /// Top
    pub top: Border,
    /// Bottom
    pub bottom: Border,
    /// Diagonal, drawn along `diagonal_direction`
    pub diagonal: Border,
    /// Diagonal direction
    pub diagonal_direction: DiagonalDirection,
}

impl Borders {
    /// Whether any line is drawn around or across the cell
    pub fn has_visible_borders(&self) -> bool {
        [&self.left, &self.right, &self.top, &self.bottom]
            .iter()
            .any(|b| b.is_visible())
            || (self.diagonal_direction != DiagonalDirection::None && self.diagonal.is_visible())
    }
}

/// Font weight, bold being the 0x2BC FONT weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontWeight {
    /// Normal
    #[default]
    Normal,
    /// Bold
    Bold,
}

/// Font slant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontStyle {
    /// Upright
    #[default]
    Normal,
    /// Italic
    Italic,
}

/// Underline kind of the FONT record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UnderlineStyle {
    /// None
    #[default]
    None,
    /// Single
    Single,
    /// Double
    Double,
    /// Single accounting
    SingleAccounting,
    /// Double accounting
    DoubleAccounting,
}

/// Superscript / subscript position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontVerticalAlign {
    /// Baseline
    #[default]
    Baseline,
    /// Superscript
    Superscript,
    /// Subscript
    Subscript,
}

/// A FONT record with its color resolved
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Font {
    /// Face name
    pub name: Option<String>,
    /// Height in points
    pub size: Option<f64>,
    /// Weight
    pub weight: FontWeight,
    /// Slant
    pub style: FontStyle,
    /// Underline
    pub underline: UnderlineStyle,
    /// Struck out
    pub strikethrough: bool,
    /// Superscript / subscript
    pub vertical_align: FontVerticalAlign,
    /// Color
    pub color: Option<Color>,
}

impl Hash for Font {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.size.map(f64::to_bits).hash(state);
        self.weight.hash(state);
        self.style.hash(state);
        self.underline.hash(state);
        self.strikethrough.hash(state);
        self.vertical_align.hash(state);
        self.color.hash(state);
    }
}

impl Font {
    /// Bold weight
    pub fn is_bold(&self) -> bool {
        self.weight == FontWeight::Bold
    }

    /// Italic slant
    pub fn is_italic(&self) -> bool {
        self.style == FontStyle::Italic
    }

    /// Any underline
    pub fn has_underline(&self) -> bool {
        self.underline != UnderlineStyle::None
    }
}

/// Horizontal alignment (3 low bits of the XF alignment byte)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HorizontalAlignment {
    /// General: text left, numbers right
    #[default]
    General,
    /// Left
    Left,
    /// Center
    Center,
    /// Right
    Right,
    /// Repeat the content to fill the cell
    Fill,
    /// Justify
    Justify,
    /// Centered across the selection
    CenterContinuous,
    /// Distributed
    Distributed,
}

/// Vertical alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VerticalAlignment {
    /// Top
    Top,
    /// Center
    Center,
    /// Bottom
    #[default]
    Bottom,
    /// Justify
    Justify,
    /// Distributed
    Distributed,
}

/// Text orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextRotation {
    /// Horizontal
    #[default]
    None,
    /// Counterclockwise angle, negative values rotate clockwise
    Degrees(i16),
    /// Letters stacked top to bottom
    Stacked,
}

/// Cell alignment
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Alignment {
    /// Horizontal alignment
    pub horizontal: HorizontalAlignment,
    /// Vertical alignment
    pub vertical: VerticalAlignment,
    /// Orientation
    pub text_rotation: TextRotation,
    /// Wrap text
    pub wrap_text: bool,
    /// Indent level (BIFF8)
    pub indent: u8,
    /// Shrink to fit (BIFF8)
    pub shrink_to_fit: bool,
}

/// Fill pattern, in XF pattern index order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FillPattern {
    /// No fill
    #[default]
    None,
    /// Solid
    Solid,
    /// 50% gray
    MediumGray,
    /// 75% gray
    DarkGray,
    /// 25% gray
    LightGray,
    /// Dark horizontal stripes
    DarkHorizontal,
    /// Dark vertical stripes
    DarkVertical,
    /// Dark down diagonal stripes
    DarkDown,
    /// Dark up diagonal stripes
    DarkUp,
    /// Dark grid
    DarkGrid,
    /// Dark trellis
    DarkTrellis,
    /// Light horizontal stripes
    LightHorizontal,
    /// Light vertical stripes
    LightVertical,
    /// Light down diagonal stripes
    LightDown,
    /// Light up diagonal stripes
    LightUp,
    /// Light grid
    LightGrid,
    /// Light trellis
    LightTrellis,
    /// 12.5% gray
    Gray125,
    /// 6.25% gray
    Gray0625,
}

/// Cell background
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Fill {
    /// Pattern
    pub pattern: FillPattern,
    /// Pattern color
    pub foreground_color: Option<Color>,
    /// Background color
    pub background_color: Option<Color>,
}

impl Fill {
    /// Whether a pattern is painted
    pub fn is_visible(&self) -> bool {
        self.pattern != FillPattern::None
    }
}

/// Number format referenced by an XF: a FORMAT record or a builtin id
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NumberFormat {
    /// FORMAT id
    pub id: u16,
    /// Format code, `General` for unknown ids
    pub code: String,
}

impl NumberFormat {
    /// Format `code` stored under `id`
    pub fn new(id: u16, code: impl Into<String>) -> NumberFormat {
        NumberFormat {
            id,
            code: code.into(),
        }
    }

    /// Whether numbers are rendered as dates or times
    pub fn is_date(&self) -> bool {
        is_date_format(&self.code)
    }
}

impl Default for NumberFormat {
    fn default() -> Self {
        NumberFormat::new(0, "General")
    }
}

/// Cell protection flags
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Protection {
    /// Locked when the sheet is protected
    pub locked: bool,
    /// Formula hidden when the sheet is protected
    pub hidden: bool,
}

impl Default for Protection {
    fn default() -> Self {
        Protection {
            locked: true,
            hidden: false,
        }
    }
}

/// The formatting of a cell XF
#[derive(Debug, Clone, Default)]
pub struct Style {
    /// Font
    pub font: Font,
    /// Background
    pub fill: Fill,
    /// Borders
    pub borders: Borders,
    /// Alignment
    pub alignment: Alignment,
    /// Number format
    pub number_format: NumberFormat,
    /// Protection
    pub protection: Protection,
    /// XF index, `None` for the default style
    pub index: Option<usize>,
}

impl Style {
    /// Code of the number format
    pub fn format_code(&self) -> &str {
        &self.number_format.code
    }

    /// Content hash, the xf index is not part of it
    pub fn hash_code(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

impl Hash for Style {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.font.hash(state);
        self.fill.hash(state);
        self.borders.hash(state);
        self.alignment.hash(state);
        self.number_format.hash(state);
        self.protection.hash(state);
    }
}

impl PartialEq for Style {
    fn eq(&self, other: &Self) -> bool {
        self.font == other.font
            && self.fill == other.fill
            && self.borders == other.borders
            && self.alignment == other.alignment
            && self.number_format == other.number_format
            && self.protection == other.protection
    }
}
