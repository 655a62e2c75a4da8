//! JSON string unescaping for envelope keys and string members

use std::borrow::Cow;

use crate::scanner::{ScanError, UNESCAPE_STACK_BUF_SIZE};

/// Unescape the raw content of a JSON string (quotes already stripped).
///
/// An unescaped string is never longer than its escaped form, so inputs up
/// to [`UNESCAPE_STACK_BUF_SIZE`] bytes are decoded into `stack` and only
/// longer ones allocate.
pub(crate) fn unescape<'b>(
    raw: &[u8],
    stack: &'b mut [u8; UNESCAPE_STACK_BUF_SIZE],
) -> Result<Cow<'b, [u8]>, ScanError> {
    if raw.len() <= stack.len() {
        let len = decode_into(raw, &mut stack[..])?;
        Ok(Cow::Borrowed(&stack[..len]))
    } else {
        let mut heap = vec![0u8; raw.len()];
        let len = decode_into(raw, &mut heap)?;
        heap.truncate(len);
        Ok(Cow::Owned(heap))
    }
}

/// Unescape into an owned string, borrowing when there is nothing to decode.
pub(crate) fn unescape_str(raw: &[u8], escaped: bool) -> Result<Cow<'_, str>, ScanError> {
    if !escaped {
        return std::str::from_utf8(raw)
            .map(Cow::Borrowed)
            .map_err(|_| ScanError::InvalidUtf8);
    }
    let mut buf = vec![0u8; raw.len()];
    let len = decode_into(raw, &mut buf)?;
    buf.truncate(len);
    String::from_utf8(buf)
        .map(Cow::Owned)
        .map_err(|_| ScanError::InvalidUtf8)
}

/// Decode escape sequences from `raw` into `out`, returning the written length.
/// `out` must be at least as long as `raw`.
fn decode_into(raw: &[u8], out: &mut [u8]) -> Result<usize, ScanError> {
    let mut r = 0;
    let mut w = 0;

    while r < raw.len() {
        let c = raw[r];
        if c != b'\\' {
            out[w] = c;
            r += 1;
            w += 1;
            continue;
        }

        let kind = *raw.get(r + 1).ok_or(ScanError::InvalidEscape)?;
        r += 2;
        let simple = match kind {
            b'"' => Some(b'"'),
            b'\\' => Some(b'\\'),
            b'/' => Some(b'/'),
            b'b' => Some(0x08),
            b'f' => Some(0x0c),
            b'n' => Some(b'\n'),
            b'r' => Some(b'\r'),
            b't' => Some(b'\t'),
            b'u' => None,
            _ => return Err(ScanError::InvalidEscape),
        };
        if let Some(byte) = simple {
            out[w] = byte;
            w += 1;
            continue;
        }

        let high = read_hex4(raw, r)?;
        r += 4;
        let code = if (0xD800..0xDC00).contains(&high) {
            // high surrogate: a low surrogate escape must follow
            if raw.get(r) != Some(&b'\\') || raw.get(r + 1) != Some(&b'u') {
                return Err(ScanError::InvalidEscape);
            }
            let low = read_hex4(raw, r + 2)?;
            if !(0xDC00..0xE000).contains(&low) {
                return Err(ScanError::InvalidEscape);
            }
            r += 6;
            0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
        } else {
            high
        };

        let ch = char::from_u32(code).ok_or(ScanError::InvalidEscape)?;
        w += ch.encode_utf8(&mut out[w..]).len();
    }

    Ok(w)
}

fn read_hex4(raw: &[u8], at: usize) -> Result<u32, ScanError> {
    let digits = raw.get(at..at + 4).ok_or(ScanError::InvalidEscape)?;
    digits.iter().try_fold(0u32, |acc, &d| {
        let v = (d as char).to_digit(16).ok_or(ScanError::InvalidEscape)?;
        Ok(acc * 16 + v)
    })
}
