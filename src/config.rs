//! Decoding configuration
//!
//! A [`Config`] is built once and handed to the reader when a workbook is
//! opened. It never changes afterward, every sheet and row iterator of that
//! workbook sees the same values.

use std::fmt;
use std::sync::Arc;

use encoding_rs::Encoding;
use log::warn;

/// Base date of serial day numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Calendar {
    /// 1900 date system, serial 1 is 1900-01-01
    #[default]
    Windows1900,
    /// 1904 date system, serial 0 is 1904-01-01
    Mac1904,
}

impl Calendar {
    /// Calendar announced by a DATEMODE record value
    pub fn from_date_mode(mode: u16) -> Calendar {
        if mode == 0 {
            Calendar::Windows1900
        } else {
            Calendar::Mac1904
        }
    }
}

/// Converts non UTF-8 bytes into text
///
/// Used wherever the workbook stores text in a legacy code page or in
/// UTF-16. Any `Fn(&[u8], &'static Encoding) -> String` closure is a
/// converter too.
pub trait TextConverter: Send + Sync {
    /// Decodes `bytes` stored with `encoding`
    fn convert(&self, bytes: &[u8], encoding: &'static Encoding) -> String;
}

impl<F> TextConverter for F
where
    F: Fn(&[u8], &'static Encoding) -> String + Send + Sync,
{
    fn convert(&self, bytes: &[u8], encoding: &'static Encoding) -> String {
        self(bytes, encoding)
    }
}

/// Default converter backed by `encoding_rs`
#[derive(Debug, Clone, Copy, Default)]
pub struct EncodingRsConverter;

impl TextConverter for EncodingRsConverter {
    fn convert(&self, bytes: &[u8], encoding: &'static Encoding) -> String {
        let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
        if had_errors {
            warn!(
                "malformed {} sequence replaced while decoding {} bytes",
                encoding.name(),
                bytes.len()
            );
        }
        text.into_owned()
    }
}

/// Immutable decoding options
#[derive(Clone)]
pub struct Config {
    calendar: Option<Calendar>,
    converter: Arc<dyn TextConverter>,
    default_codepage: u16,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            calendar: None,
            converter: Arc::new(EncodingRsConverter),
            default_codepage: 1252,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("calendar", &self.calendar)
            .field("default_codepage", &self.default_codepage)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Creates the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Forces the calendar, ignoring the workbook DATEMODE record
    pub fn with_calendar(mut self, calendar: Calendar) -> Self {
        self.calendar = Some(calendar);
        self
    }

    /// Replaces the text converter
    pub fn with_converter<C: TextConverter + 'static>(mut self, converter: C) -> Self {
        self.converter = Arc::new(converter);
        self
    }

    /// Code page assumed when the workbook has no CODEPAGE record
    pub fn with_default_codepage(mut self, codepage: u16) -> Self {
        self.default_codepage = codepage;
        self
    }

    /// Forced calendar, if any
    pub fn calendar(&self) -> Option<Calendar> {
        self.calendar
    }

    /// Text converter
    pub fn converter(&self) -> &dyn TextConverter {
        &*self.converter
    }

    /// Fallback code page
    pub fn default_codepage(&self) -> u16 {
        self.default_codepage
    }

    /// Resolves a code page number, falling back to the configured default
    /// and finally to windows-1252
    pub(crate) fn encoding_for(&self, codepage: u16) -> &'static Encoding {
        codepage::to_encoding(codepage)
            .or_else(|| {
                warn!(
                    "unsupported codepage {codepage}, using {}",
                    self.default_codepage
                );
                codepage::to_encoding(self.default_codepage)
            })
            .unwrap_or(encoding_rs::WINDOWS_1252)
    }
}
