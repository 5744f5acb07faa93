//! Internal module providing handy function

use byteorder::{ByteOrder, LittleEndian};

macro_rules! from_err {
    ($from:ty, $to:tt, $var:tt) => {
        impl From<$from> for $to {
            fn from(e: $from) -> $to {
                $to::$var(e)
            }
        }
    };
}

/// Returns `len` bytes at `pos` or `None` when the buffer is too short
#[inline]
pub(crate) fn get_bytes(s: &[u8], pos: usize, len: usize) -> Option<&[u8]> {
    pos.checked_add(len).and_then(|end| s.get(pos..end))
}

/// Returns up to `len` bytes at `pos`, truncated at the end of the buffer
#[inline]
pub(crate) fn slice_at(s: &[u8], pos: usize, len: usize) -> &[u8] {
    let start = pos.min(s.len());
    let end = pos.saturating_add(len).min(s.len());
    &s[start..end]
}

#[inline]
pub(crate) fn read_u8(s: &[u8], pos: usize) -> u8 {
    s.get(pos).copied().unwrap_or(0)
}

#[inline]
pub(crate) fn read_u16(s: &[u8], pos: usize) -> u16 {
    get_bytes(s, pos, 2).map_or(0, LittleEndian::read_u16)
}

#[inline]
pub(crate) fn read_u32(s: &[u8], pos: usize) -> u32 {
    get_bytes(s, pos, 4).map_or(0, LittleEndian::read_u32)
}

#[inline]
pub(crate) fn read_f64(s: &[u8], pos: usize) -> f64 {
    get_bytes(s, pos, 8).map_or(0., LittleEndian::read_f64)
}

#[inline]
pub(crate) fn read_usize(s: &[u8], pos: usize) -> usize {
    read_u32(s, pos) as usize
}

/// Reads a little endian integer of `width` bytes (1 to 4) at `pos`.
///
/// The most significant byte of a 4 bytes integer is sign folded, which
/// makes `0xFFFFFFFE` (end of chain) read back as `-2` and `0xFFFFFFFF`
/// (free sector) as `-1`. Values at or above `0xFFFFFFFE` saturate to `-2`.
/// Bytes past the end of the buffer read as 0.
pub fn read_int(s: &[u8], pos: usize, width: usize) -> i64 {
    let mut value = 0i64;
    for i in 0..width.min(4) {
        let byte = match pos.checked_add(i) {
            Some(p) => read_u8(s, p) as i64,
            None => 0,
        };
        let byte = if i == 3 && byte >= 128 {
            byte - 256
        } else {
            byte
        };
        value |= byte << (8 * i);
    }
    if value >= 4_294_967_294 {
        -2
    } else {
        value
    }
}
