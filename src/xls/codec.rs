//! Scalar and text decoding shared by the workbook and sheet parsers

use encoding_rs::{Encoding, UTF_16LE};

use crate::config::TextConverter;
use crate::datatype::Data;
use crate::utils::{read_u16, read_u8, slice_at};

/// Decodes an RK encoded number
///
/// Bit 1 selects a 30 bits signed integer over the upper 30 bits of a
/// double, bit 0 divides the result by 100.
pub fn decode_rk(word: u32) -> f64 {
    let v = if word & 0x02 != 0 {
        ((word as i32) >> 2) as f64
    } else {
        f64::from_bits(((word & 0xFFFF_FFFC) as u64) << 32)
    };
    if word & 0x01 != 0 {
        v / 100.0
    } else {
        v
    }
}

/// Decodes an RK number, integers without the /100 flag stay integers
pub fn rk_to_data(word: u32) -> Data {
    if word & 0x03 == 0x02 {
        Data::Int(((word as i32) >> 2) as i64)
    } else {
        Data::Float(decode_rk(word))
    }
}

/// Text decoding context of a workbook: the codepage encoding and the
/// converter that turns bytes into strings
#[derive(Clone, Copy)]
pub(crate) struct XlsEncoding<'a> {
    pub encoding: &'static Encoding,
    pub converter: &'a dyn TextConverter,
}

impl XlsEncoding<'_> {
    /// Decodes 8-bit characters in the workbook codepage
    pub fn decode_bytes(&self, bytes: &[u8]) -> String {
        self.converter.convert(bytes, self.encoding)
    }

    /// Decodes UTF-16LE characters
    pub fn decode_utf16(&self, bytes: &[u8]) -> String {
        self.converter.convert(bytes, UTF_16LE)
    }
}

/// Adds the zero high bytes a compressed unicode payload omits
pub(crate) fn uncompress(bytes: &[u8], buf: &mut Vec<u8>) {
    buf.reserve(bytes.len() * 2);
    for &b in bytes {
        buf.push(b);
        buf.push(0);
    }
}

/// 8-bit string with a 1 byte length prefix
pub(crate) fn read_byte_string_short(data: &[u8], enc: &XlsEncoding) -> String {
    let len = read_u8(data, 0) as usize;
    enc.decode_bytes(slice_at(data, 1, len))
}

/// 8-bit string with a 2 bytes length prefix
pub(crate) fn read_byte_string_long(data: &[u8], enc: &XlsEncoding) -> String {
    let len = read_u16(data, 0) as usize;
    enc.decode_bytes(slice_at(data, 2, len))
}

/// Unicode string with a 1 byte length prefix
pub(crate) fn read_unicode_string_short(data: &[u8], enc: &XlsEncoding) -> String {
    let len = read_u8(data, 0) as usize;
    read_unicode_string(slice_at(data, 1, usize::MAX), len, enc)
}

/// Unicode string with a 2 bytes length prefix
pub(crate) fn read_unicode_string_long(data: &[u8], enc: &XlsEncoding) -> String {
    let len = read_u16(data, 0) as usize;
    read_unicode_string(slice_at(data, 2, usize::MAX), len, enc)
}

/// Unicode string body: option flags then `len` characters
fn read_unicode_string(data: &[u8], len: usize, enc: &XlsEncoding) -> String {
    let flags = read_u8(data, 0);
    let mut pos = 1;
    if flags & 0x04 != 0 {
        pos += 4;
    }
    if flags & 0x08 != 0 {
        pos += 2;
    }
    if flags & 0x01 != 0 {
        enc.decode_utf16(slice_at(data, pos, 2 * len))
    } else {
        let mut buf = Vec::new();
        uncompress(slice_at(data, pos, len), &mut buf);
        enc.decode_utf16(&buf)
    }
}

/// UTF-16LE characters up to the first zero word
pub(crate) fn read_utf16_z(data: &[u8], enc: &XlsEncoding) -> String {
    let end = data
        .chunks_exact(2)
        .position(|c| c == [0, 0])
        .map_or(data.len() & !1, |i| 2 * i);
    enc.decode_utf16(&data[..end])
}
