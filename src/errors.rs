//! `Error` management module
//!
//! Provides all errors conversion and description

use crate::de::DeError;
use crate::xls::XlsError;

/// A struct to handle crate specific errors
#[derive(Debug)]
pub enum Error {
    /// I/O error
    Io(std::io::Error),
    /// Xls specific error
    Xls(XlsError),
    /// Row deserialization error
    De(DeError),
    /// General error message
    Msg(&'static str),
}

from_err!(std::io::Error, Error, Io);
from_err!(XlsError, Error, Xls);
from_err!(DeError, Error, De);
from_err!(&'static str, Error, Msg);

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::Xls(e) => write!(f, "Xls error: {e}"),
            Error::De(e) => write!(f, "Deserializer error: {e}"),
            Error::Msg(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Xls(e) => Some(e),
            Error::De(e) => Some(e),
            Error::Msg(_) => None,
        }
    }
}
