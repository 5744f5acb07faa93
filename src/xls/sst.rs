//! Shared string table

use std::cmp::min;

use log::{debug, warn};

use super::codec::{uncompress, XlsEncoding};
use super::records::Record;
use crate::utils::{read_u16, read_u8, read_usize};

/// Parses an SST record and its CONTINUE records
///
/// Strings decoded before a truncation are kept.
pub(crate) fn parse_sst(r: &mut Record<'_>, enc: &XlsEncoding) -> Vec<String> {
    let len = read_usize(r.data, 4);
    let mut sst = Vec::with_capacity(min(len, 1 << 16));
    r.data = r.data.get(8..).unwrap_or_default();
    for i in 0..len {
        match read_rich_extended_string(r, enc) {
            Some(s) => sst.push(s),
            None => {
                warn!("shared string table truncated after {i} of {len} strings");
                break;
            }
        }
    }
    debug!("{} shared strings", sst.len());
    sst
}

fn read_rich_extended_string(r: &mut Record<'_>, enc: &XlsEncoding) -> Option<String> {
    if r.data.is_empty() && !r.continue_record() || r.data.len() < 3 {
        return None;
    }

    let str_len = read_u16(r.data, 0) as usize;
    let flags = read_u8(r.data, 2);
    r.data = &r.data[3..];
    let mut high_byte = flags & 0x1 != 0;

    let mut unused_len = 0;
    if flags & 0x8 != 0 {
        unused_len += 4 * read_u16(r.data, 0) as usize;
        r.data = r.data.get(2..).unwrap_or_default();
    }
    if flags & 0x4 != 0 {
        unused_len += read_usize(r.data, 0);
        r.data = r.data.get(4..).unwrap_or_default();
    }

    let s = read_dbcs(&mut high_byte, str_len, r, enc)?;

    while unused_len > 0 {
        if r.data.is_empty() && !r.continue_record() {
            warn!("continued record too short while reading extended string");
            break;
        }
        let l = min(unused_len, r.data.len());
        r.data = &r.data[l..];
        unused_len -= l;
    }

    Some(s)
}

/// Reads `len` characters which may span several CONTINUE records, each
/// continuation starting with its own compression flag
fn read_dbcs(
    high_byte: &mut bool,
    mut len: usize,
    r: &mut Record<'_>,
    enc: &XlsEncoding,
) -> Option<String> {
    let mut buf = Vec::with_capacity(2 * len);
    while len > 0 {
        let l = if *high_byte {
            let l = min(r.data.len() / 2, len);
            let (data, next) = r.data.split_at(2 * l);
            buf.extend_from_slice(data);
            r.data = next;
            l
        } else {
            let l = min(r.data.len(), len);
            let (data, next) = r.data.split_at(l);
            uncompress(data, &mut buf);
            r.data = next;
            l
        };

        len -= l;
        if len > 0 {
            if !r.continue_record() || r.data.is_empty() {
                warn!("cannot decode entire dbcs stream, {len} characters missing");
                return None;
            }
            *high_byte = r.data[0] & 0x1 != 0;
            r.data = &r.data[1..];
        }
    }
    Some(enc.decode_utf16(&buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EncodingRsConverter;
    use crate::xls::records::{RecordIter, CONTINUE, SST};

    fn record(typ: u16, data: &[u8]) -> Vec<u8> {
        let mut buf = typ.to_le_bytes().to_vec();
        buf.extend_from_slice(&(data.len() as u16).to_le_bytes());
        buf.extend_from_slice(data);
        buf
    }

    fn parse(stream: &[u8]) -> Vec<String> {
        let enc = XlsEncoding {
            encoding: encoding_rs::WINDOWS_1252,
            converter: &EncodingRsConverter,
        };
        let mut r = RecordIter::new(stream).next().unwrap();
        parse_sst(&mut r, &enc)
    }

    #[test]
    fn plain_strings() {
        let mut sst = vec![2, 0, 0, 0, 2, 0, 0, 0];
        sst.extend_from_slice(b"\x03\x00\x00abc");
        sst.extend_from_slice(b"\x01\x00\x01\x3B\x04");
        assert_eq!(parse(&record(SST, &sst)), vec!["abc", "л"]);
    }

    #[test]
    fn string_split_across_continue_switches_width() {
        // "hello" starts compressed, continues as 16-bit
        let mut sst = vec![1, 0, 0, 0, 1, 0, 0, 0];
        sst.extend_from_slice(b"\x05\x00\x00hel");
        let mut stream = record(SST, &sst);
        stream.extend(record(CONTINUE, b"\x01l\x00o\x00"));
        assert_eq!(parse(&stream), vec!["hello"]);
    }

    #[test]
    fn rich_runs_and_phonetic_are_skipped() {
        let mut sst = vec![2, 0, 0, 0, 2, 0, 0, 0];
        // 2 chars, rich (1 run) + phonetic (3 bytes)
        sst.extend_from_slice(b"\x02\x00\x0C\x01\x00\x03\x00\x00\x00ab");
        sst.extend_from_slice(&[0, 0, 1, 0]);
        let mut stream = record(SST, &sst);
        // phonetic block straddles the continuation
        stream.extend(record(CONTINUE, b"\x00\x00\x00\x01\x00\x00z"));
        assert_eq!(parse(&stream), vec!["ab", "z"]);
    }

    #[test]
    fn truncated_table_keeps_decoded_strings() {
        let mut sst = vec![3, 0, 0, 0, 3, 0, 0, 0];
        sst.extend_from_slice(b"\x01\x00\x00a\x04\x00\x00bc");
        assert_eq!(parse(&record(SST, &sst)), vec!["a"]);
    }
}
