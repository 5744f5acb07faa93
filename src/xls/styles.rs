// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

//! Workbook style catalog: PALETTE, FONT, FORMAT and XF records
//!
//! Colors are stored as palette indexes while scanning and resolved once
//! the whole globals substream is read, a PALETTE record may come after
//! the records using it.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use log::{debug, warn};

use super::codec::{
    read_byte_string_short, read_unicode_string_long, read_unicode_string_short, XlsEncoding,
};
use super::Biff;
use crate::formats::builtin_format_code;
use crate::style::{
    Alignment, BorderStyle, Borders, Color, DiagonalDirection, Fill, FillPattern, Font,
    FontStyle, FontVerticalAlign, FontWeight, HorizontalAlignment, NumberFormat, Protection,
    Style, TextRotation, UnderlineStyle, VerticalAlignment,
};
use crate::utils::{read_u16, read_u32, read_u8};

const BUILTIN_COLORS: [u32; 8] = [
    0x000000, 0xFFFFFF, 0xFF0000, 0x00FF00, 0x0000FF, 0xFFFF00, 0xFF00FF, 0x00FFFF,
];

/// Default BIFF8 palette, indexes 8 to 63
const BIFF8_COLORS: [u32; 56] = [
    0x000000, 0xFFFFFF, 0xFF0000, 0x00FF00, 0x0000FF, 0xFFFF00, 0xFF00FF, 0x00FFFF, 0x800000,
    0x008000, 0x000080, 0x808000, 0x800080, 0x008080, 0xC0C0C0, 0x808080, 0x9999FF, 0x993366,
    0xFFFFCC, 0xCCFFFF, 0x660066, 0xFF8080, 0x0066CC, 0xCCCCFF, 0x000080, 0xFF00FF, 0xFFFF00,
    0x00FFFF, 0x800080, 0x800000, 0x008080, 0x0000FF, 0x00CCFF, 0xCCFFFF, 0xCCFFCC, 0xFFFF99,
    0x99CCFF, 0xFF99CC, 0xCC99FF, 0xFFCC99, 0x3366FF, 0x33CCCC, 0x99CC00, 0xFFCC00, 0xFF9900,
    0xFF6600, 0x666699, 0x969696, 0x003366, 0x339966, 0x003300, 0x333300, 0x993300, 0x993366,
    0x333399, 0x333333,
];

/// Default BIFF5 palette, indexes 8 to 63
const BIFF5_COLORS: [u32; 56] = [
    0x000000, 0xFFFFFF, 0xFF0000, 0x00FF00, 0x0000FF, 0xFFFF00, 0xFF00FF, 0x00FFFF, 0x800000,
    0x008000, 0x000080, 0x808000, 0x800080, 0x008080, 0xC0C0C0, 0x808080, 0x8080FF, 0x802060,
    0xFFFFC0, 0xA0E0F0, 0x600080, 0xFF8080, 0x0080C0, 0xC0C0FF, 0x000080, 0xFF00FF, 0xFFFF00,
    0x00FFFF, 0x800080, 0x800000, 0x008080, 0x0000FF, 0x00CFFF, 0x69FFFF, 0xE0FFE0, 0xFFFF80,
    0xA6CAF0, 0xDD9CB3, 0xB38FEE, 0xE3E3E3, 0x2A6FF9, 0x3FB8CD, 0x488436, 0x958C41, 0x8E5E42,
    0xA0627A, 0x624FAC, 0x969696, 0x1D2FBE, 0x286676, 0x004500, 0x453E01, 0x6A2813, 0x85396A,
    0x4A3285, 0x424242,
];

/// Resolves a palette index to a color
///
/// Indexes 0 to 7 and 64 or more use the fixed colors (64 is the system
/// text color, 65 the system background), the others the workbook
/// PALETTE then the default palette of the BIFF version.
pub(crate) fn indexed_color(index: u16, palette: &[Color], biff: Biff) -> Color {
    let index = index as usize;
    let rgb = if index <= 0x07 {
        BUILTIN_COLORS[index]
    } else if index >= 0x40 {
        match index {
            0x41 => 0xFFFFFF,
            _ => 0x000000,
        }
    } else if let Some(c) = palette.get(index - 8) {
        return *c;
    } else if biff == Biff::Biff8 {
        BIFF8_COLORS[index - 8]
    } else {
        BIFF5_COLORS[index - 8]
    };
    Color::from_rgb_u32(rgb)
}

pub(crate) fn border_style(index: u32) -> BorderStyle {
    match index {
        1 => BorderStyle::Thin,
        2 => BorderStyle::Medium,
        3 => BorderStyle::Dashed,
        4 => BorderStyle::Dotted,
        5 => BorderStyle::Thick,
        6 => BorderStyle::Double,
        7 => BorderStyle::Hair,
        8 => BorderStyle::MediumDashed,
        9 => BorderStyle::DashDot,
        10 => BorderStyle::MediumDashDot,
        11 => BorderStyle::DashDotDot,
        12 => BorderStyle::MediumDashDotDot,
        13 => BorderStyle::SlantDashDot,
        _ => BorderStyle::None,
    }
}

pub(crate) fn fill_pattern(index: u32) -> FillPattern {
    match index {
        1 => FillPattern::Solid,
        2 => FillPattern::MediumGray,
        3 => FillPattern::DarkGray,
        4 => FillPattern::LightGray,
        5 => FillPattern::DarkHorizontal,
        6 => FillPattern::DarkVertical,
        7 => FillPattern::DarkDown,
        8 => FillPattern::DarkUp,
        9 => FillPattern::DarkGrid,
        10 => FillPattern::DarkTrellis,
        11 => FillPattern::LightHorizontal,
        12 => FillPattern::LightVertical,
        13 => FillPattern::LightDown,
        14 => FillPattern::LightUp,
        15 => FillPattern::LightGrid,
        16 => FillPattern::LightTrellis,
        17 => FillPattern::Gray125,
        18 => FillPattern::Gray0625,
        _ => FillPattern::None,
    }
}

fn horizontal_alignment(v: u8) -> HorizontalAlignment {
    match v {
        1 => HorizontalAlignment::Left,
        2 => HorizontalAlignment::Center,
        3 => HorizontalAlignment::Right,
        4 => HorizontalAlignment::Fill,
        5 => HorizontalAlignment::Justify,
        6 => HorizontalAlignment::CenterContinuous,
        7 => HorizontalAlignment::Distributed,
        _ => HorizontalAlignment::General,
    }
}

fn vertical_alignment(v: u8) -> VerticalAlignment {
    match v {
        0 => VerticalAlignment::Top,
        1 => VerticalAlignment::Center,
        3 => VerticalAlignment::Justify,
        4 => VerticalAlignment::Distributed,
        _ => VerticalAlignment::Bottom,
    }
}

/// A FONT record waiting for its color
#[derive(Debug, Clone, Default)]
struct RawFont {
    font: Font,
    color: u16,
}

/// Palette indexes of an XF, in the order they are resolved
#[derive(Debug, Clone, Default)]
struct XfColors {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
    diagonal: u16,
    fill_fg: u16,
    fill_bg: u16,
}

#[derive(Debug, Clone)]
struct RawXf {
    index: usize,
    font: usize,
    style: Style,
    colors: XfColors,
}

/// Accumulates style records of the workbook globals
#[derive(Debug)]
pub(crate) struct StyleCatalog {
    biff: Biff,
    palette: Vec<Color>,
    fonts: Vec<RawFont>,
    formats: HashMap<u16, String>,
    xfs: Vec<RawXf>,
    xf_count: usize,
}

impl StyleCatalog {
    pub fn new(biff: Biff) -> StyleCatalog {
        StyleCatalog {
            biff,
            palette: Vec::new(),
            fonts: Vec::new(),
            formats: HashMap::new(),
            xfs: Vec::new(),
            xf_count: 0,
        }
    }

    /// PALETTE: count then 4 bytes RGB entries
    pub fn add_palette(&mut self, data: &[u8]) {
        let count = read_u16(data, 0) as usize;
        self.palette = data
            .get(2..)
            .unwrap_or_default()
            .chunks_exact(4)
            .take(count)
            .map(|c| Color::rgb(c[0], c[1], c[2]))
            .collect();
        debug!("custom palette of {} colors", self.palette.len());
    }

    pub fn add_font(&mut self, data: &[u8], enc: &XlsEncoding) {
        let flags = read_u16(data, 2);
        let name = match self.biff {
            Biff::Biff8 => read_unicode_string_short(data.get(14..).unwrap_or_default(), enc),
            Biff::Biff5 => read_byte_string_short(data.get(14..).unwrap_or_default(), enc),
        };
        let font = Font {
            name: Some(name),
            size: Some(read_u16(data, 0) as f64 / 20.0),
            weight: if read_u16(data, 6) == 0x02BC {
                FontWeight::Bold
            } else {
                FontWeight::Normal
            },
            style: if flags & 0x02 != 0 {
                FontStyle::Italic
            } else {
                FontStyle::Normal
            },
            underline: match read_u8(data, 10) {
                0x01 => UnderlineStyle::Single,
                0x02 => UnderlineStyle::Double,
                0x21 => UnderlineStyle::SingleAccounting,
                0x22 => UnderlineStyle::DoubleAccounting,
                _ => UnderlineStyle::None,
            },
            strikethrough: flags & 0x08 != 0,
            vertical_align: match read_u16(data, 8) {
                1 => FontVerticalAlign::Superscript,
                2 => FontVerticalAlign::Subscript,
                _ => FontVerticalAlign::Baseline,
            },
            color: None,
        };
        self.fonts.push(RawFont {
            font,
            color: read_u16(data, 4),
        });
    }

    pub fn add_format(&mut self, data: &[u8], enc: &XlsEncoding) {
        let id = read_u16(data, 0);
        let code = match self.biff {
            Biff::Biff8 => read_unicode_string_long(data.get(2..).unwrap_or_default(), enc),
            Biff::Biff5 => read_byte_string_short(data.get(2..).unwrap_or_default(), enc),
        };
        self.formats.insert(id, code);
    }

    fn format_code(&self, id: u16) -> String {
        if let Some(code) = self.formats.get(&id) {
            return code.clone();
        }
        builtin_format_code(id)
            .filter(|c| !c.is_empty())
            .unwrap_or("General")
            .to_string()
    }

    pub fn add_xf(&mut self, data: &[u8]) {
        let index = self.xf_count;
        self.xf_count += 1;

        let type_prot = read_u16(data, 4);
        if type_prot & 0x04 != 0 {
            // cell style XF, never referenced by cells
            return;
        }

        let font = read_u16(data, 0) as usize;
        // font index 4 does not exist
        let font = if font >= 4 { font - 1 } else { font };
        let format_id = read_u16(data, 2);

        let align = read_u8(data, 6);
        let mut alignment = Alignment {
            horizontal: horizontal_alignment(align & 0x07),
            vertical: vertical_alignment((align & 0x70) >> 4),
            wrap_text: align & 0x08 != 0,
            ..Alignment::default()
        };

        let mut borders = Borders::default();
        let mut fill = Fill::default();
        let mut colors = XfColors::default();
        match self.biff {
            Biff::Biff8 => {
                let rotation = read_u8(data, 7);
                alignment.text_rotation = match rotation {
                    0 => TextRotation::None,
                    1..=90 => TextRotation::Degrees(rotation as i16),
                    91..=180 => TextRotation::Degrees(90 - rotation as i16),
                    255 => TextRotation::Stacked,
                    _ => TextRotation::None,
                };
                let indent = read_u8(data, 8);
                alignment.indent = indent & 0x0F;
                alignment.shrink_to_fit = indent & 0x10 != 0;

                let flags = read_u32(data, 10);
                borders.left.style = border_style(flags & 0x0F);
                borders.right.style = border_style((flags & 0xF0) >> 4);
                borders.top.style = border_style((flags & 0xF00) >> 8);
                borders.bottom.style = border_style((flags & 0xF000) >> 12);
                colors.left = ((flags & 0x007F_0000) >> 16) as u16;
                colors.right = ((flags & 0x3F80_0000) >> 23) as u16;
                borders.diagonal_direction = match (flags >> 30) & 0x03 {
                    1 => DiagonalDirection::Down,
                    2 => DiagonalDirection::Up,
                    3 => DiagonalDirection::Both,
                    _ => DiagonalDirection::None,
                };

                let flags = read_u32(data, 14);
                colors.top = (flags & 0x7F) as u16;
                colors.bottom = ((flags & 0x3F80) >> 7) as u16;
                colors.diagonal = ((flags & 0x001F_C000) >> 14) as u16;
                borders.diagonal.style = border_style((flags & 0x01E0_0000) >> 21);
                fill.pattern = fill_pattern((flags & 0xFC00_0000) >> 26);

                let flags = read_u16(data, 18);
                colors.fill_fg = flags & 0x7F;
                colors.fill_bg = (flags & 0x3F80) >> 7;
            }
            Biff::Biff5 => {
                alignment.text_rotation = match read_u8(data, 7) & 0x03 {
                    1 => TextRotation::Stacked,
                    2 => TextRotation::Degrees(90),
                    3 => TextRotation::Degrees(-90),
                    _ => TextRotation::None,
                };

                let flags = read_u32(data, 8);
                colors.fill_fg = (flags & 0x7F) as u16;
                colors.fill_bg = ((flags & 0x3F80) >> 7) as u16;
                fill.pattern = fill_pattern((flags & 0x003F_0000) >> 16);
                borders.bottom.style = border_style((flags & 0x01C0_0000) >> 22);
                colors.bottom = ((flags & 0xFE00_0000) >> 25) as u16;

                let flags = read_u32(data, 12);
                borders.top.style = border_style(flags & 0x07);
                borders.left.style = border_style((flags & 0x38) >> 3);
                borders.right.style = border_style((flags & 0x1C0) >> 6);
                colors.top = ((flags & 0xFE00) >> 9) as u16;
                colors.left = ((flags & 0x007F_0000) >> 16) as u16;
                colors.right = ((flags & 0x3F80_0000) >> 23) as u16;
            }
        }

        let style = Style {
            fill,
            borders,
            alignment,
            number_format: NumberFormat::new(format_id, self.format_code(format_id)),
            protection: Protection {
                locked: type_prot & 0x01 != 0,
                hidden: type_prot & 0x02 != 0,
            },
            index: Some(index),
            ..Style::default()
        };
        self.xfs.push(RawXf {
            index,
            font,
            style,
            colors,
        });
    }

    /// Resolves fonts and colors, returning the cell styles by xf index
    pub fn finish(self) -> BTreeMap<usize, Arc<Style>> {
        let color = |i: u16| indexed_color(i, &self.palette, self.biff);
        let mut styles = BTreeMap::new();
        for xf in &self.xfs {
            let mut style = xf.style.clone();
            match self.fonts.get(xf.font) {
                Some(f) => {
                    style.font = f.font.clone();
                    style.font.color = Some(color(f.color));
                }
                None => warn!("xf {} references missing font {}", xf.index, xf.font),
            }
            let c = &xf.colors;
            let b = &mut style.borders;
            b.left.color = Some(color(c.left));
            b.right.color = Some(color(c.right));
            b.top.color = Some(color(c.top));
            b.bottom.color = Some(color(c.bottom));
            if self.biff == Biff::Biff8 {
                b.diagonal.color = Some(color(c.diagonal));
            }
            style.fill.foreground_color = Some(color(c.fill_fg));
            style.fill.background_color = Some(color(c.fill_bg));
            styles.insert(xf.index, Arc::new(style));
        }
        debug!(
            "{} cell styles out of {} XF records, {} fonts",
            styles.len(),
            self.xf_count,
            self.fonts.len()
        );
        styles
    }
}
