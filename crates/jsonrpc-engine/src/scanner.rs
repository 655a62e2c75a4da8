//! Envelope scanner
//!
//! A single left-to-right pass over the bytes of one JSON object that pulls
//! out the four envelope members (`id`, `jsonrpc`, `method`, `params`)
//! without decoding anything else. Values are reported as [`Span`]s into the
//! input; nested objects and arrays are matched by bracket depth and never
//! traversed. The only scratch memory is a fixed stack buffer used when a
//! key contains escape sequences.

use std::borrow::Cow;
use std::fmt;
use std::ops::Range;

use thiserror::Error;

use crate::escape::unescape;

/// Stack space reserved for unescaping keys; longer escaped keys go to the heap
pub const UNESCAPE_STACK_BUF_SIZE: usize = 64;

/// Type of a scanned JSON value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    String,
    Number,
    Object,
    Array,
    Boolean,
    Null,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValueType::String => "string",
            ValueType::Number => "number",
            ValueType::Object => "object",
            ValueType::Array => "array",
            ValueType::Boolean => "boolean",
            ValueType::Null => "null",
        })
    }
}

/// Byte range of one JSON value inside the scanned input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub kind: ValueType,
}

impl Span {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn bytes<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        &data[self.range()]
    }

    /// Range of the content between the quotes of a string value
    pub fn inner(&self) -> Range<usize> {
        match self.kind {
            ValueType::String => self.start + 1..self.end - 1,
            _ => self.range(),
        }
    }
}

/// The envelope members found in one request object
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Envelope {
    /// String, number or null; `None` marks a notification
    pub id: Option<Span>,
    /// Always a string span
    pub jsonrpc: Option<Span>,
    /// Always a string span
    pub method: Option<Span>,
    /// Untouched value of any type
    pub params: Option<Span>,
    /// First member found with the wrong JSON type; its span is left unset
    pub field_error: Option<ScanError>,
}

/// Reasons the scanner rejects its input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("unexpected byte {byte:?} at offset {offset}")]
    UnexpectedByte { byte: char, offset: usize },

    #[error("value is string, but can't find closing '\"' symbol")]
    MalformedString,

    #[error("value is array, but can't find closing ']' symbol")]
    MalformedArray,

    #[error("value looks like object, but can't find closing '}}' symbol")]
    MalformedObject,

    #[error("unknown value literal at offset {offset}")]
    UnknownValue { offset: usize },

    #[error("invalid escape sequence in string")]
    InvalidEscape,

    #[error("string is not valid UTF-8")]
    InvalidUtf8,

    #[error("field `{field}` must be {expected}, found {found}")]
    IncorrectFieldType {
        field: &'static str,
        expected: &'static str,
        found: ValueType,
    },
}

impl ScanError {
    /// Well-formed JSON with the wrong type for a known envelope member
    pub fn is_field_type_error(&self) -> bool {
        matches!(self, ScanError::IncorrectFieldType { .. })
    }

    pub(crate) fn unexpected(data: &[u8], offset: usize) -> Self {
        match data.get(offset) {
            Some(&byte) => ScanError::UnexpectedByte {
                byte: byte as char,
                offset,
            },
            None => ScanError::UnexpectedEnd,
        }
    }
}

/// Scan one JSON-RPC request object.
///
/// Unknown members are skipped; a repeated member keeps its last value.
/// Anything other than whitespace after the closing brace is rejected.
///
/// A known member with the wrong type does not stop the scan, since the
/// object is still well-formed JSON. It is reported in
/// [`Envelope::field_error`] so the caller can still recover the `id`.
pub fn scan(data: &[u8]) -> Result<Envelope, ScanError> {
    let mut envelope = Envelope::default();
    let mut stackbuf = [0u8; UNESCAPE_STACK_BUF_SIZE];

    let mut i = skip_whitespace(data, 0);
    if data.get(i) != Some(&b'{') {
        return Err(ScanError::unexpected(data, i));
    }
    i += 1;

    let mut first = true;
    loop {
        i = skip_whitespace(data, i);
        match data.get(i) {
            Some(b'}') if first => {
                i += 1;
                break;
            }
            Some(b'"') => {}
            // '{', '[' and ':' all land here: only a key may start a member
            _ => return Err(ScanError::unexpected(data, i)),
        }
        first = false;

        let key_start = i + 1;
        let (key_len, escaped) =
            string_end(&data[key_start..]).ok_or(ScanError::MalformedString)?;
        let key_raw = &data[key_start..key_start + key_len - 1];
        i = skip_whitespace(data, key_start + key_len);

        if data.get(i) != Some(&b':') {
            return Err(ScanError::unexpected(data, i));
        }
        i = skip_whitespace(data, i + 1);

        let span = value_span(data, i)?;
        i = span.end;

        let key: Cow<'_, [u8]> = if escaped {
            unescape(key_raw, &mut stackbuf)?
        } else {
            Cow::Borrowed(key_raw)
        };

        match &*key {
            b"id" => envelope.id = checked(&mut envelope.field_error, expect_id(span)),
            b"jsonrpc" => {
                envelope.jsonrpc =
                    checked(&mut envelope.field_error, expect_string("jsonrpc", span))
            }
            b"method" => {
                envelope.method = checked(&mut envelope.field_error, expect_string("method", span))
            }
            b"params" => envelope.params = Some(span),
            _ => {}
        }

        i = skip_whitespace(data, i);
        match data.get(i) {
            Some(b',') => i += 1,
            Some(b'}') => {
                i += 1;
                break;
            }
            _ => return Err(ScanError::unexpected(data, i)),
        }
    }

    let rest = skip_whitespace(data, i);
    if rest < data.len() {
        return Err(ScanError::unexpected(data, rest));
    }

    Ok(envelope)
}

/// Keep the first field-type error and carry on scanning
fn checked(field_error: &mut Option<ScanError>, value: Result<Span, ScanError>) -> Option<Span> {
    match value {
        Ok(span) => Some(span),
        Err(err) => {
            field_error.get_or_insert(err);
            None
        }
    }
}

fn expect_id(span: Span) -> Result<Span, ScanError> {
    match span.kind {
        ValueType::String | ValueType::Number | ValueType::Null => Ok(span),
        found => Err(ScanError::IncorrectFieldType {
            field: "id",
            expected: "a string, number or null",
            found,
        }),
    }
}

fn expect_string(field: &'static str, span: Span) -> Result<Span, ScanError> {
    match span.kind {
        ValueType::String => Ok(span),
        found => Err(ScanError::IncorrectFieldType {
            field,
            expected: "a string",
            found,
        }),
    }
}

/// Determine type and extent of the value starting at `start`.
pub(crate) fn value_span(data: &[u8], start: usize) -> Result<Span, ScanError> {
    let rest = &data[start.min(data.len())..];
    let (kind, len) = match rest.first() {
        None => return Err(ScanError::UnexpectedEnd),
        Some(b'"') => {
            let (len, _) = string_end(&rest[1..]).ok_or(ScanError::MalformedString)?;
            (ValueType::String, len + 1)
        }
        Some(b'[') => (
            ValueType::Array,
            block_end(rest, b'[', b']').ok_or(ScanError::MalformedArray)?,
        ),
        Some(b'{') => (
            ValueType::Object,
            block_end(rest, b'{', b'}').ok_or(ScanError::MalformedObject)?,
        ),
        Some(&first) => {
            let len = token_end(rest);
            if len == 0 {
                return Err(ScanError::unexpected(data, start));
            }
            let token = &rest[..len];
            let kind = match first {
                b't' | b'f' if token == b"true" || token == b"false" => ValueType::Boolean,
                b'n' if token == b"null" => ValueType::Null,
                b'-' | b'0'..=b'9' if token.iter().all(|c| is_number_byte(*c)) => {
                    ValueType::Number
                }
                _ => return Err(ScanError::UnknownValue { offset: start }),
            };
            (kind, len)
        }
    };

    Ok(Span {
        start,
        end: start + len,
        kind,
    })
}

fn is_number_byte(c: u8) -> bool {
    matches!(c, b'0'..=b'9' | b'-' | b'+' | b'.' | b'e' | b'E')
}

pub(crate) fn is_whitespace(c: u8) -> bool {
    matches!(c, b' ' | b'\n' | b'\r' | b'\t')
}

/// Offset of the first non-whitespace byte at or after `from`
pub(crate) fn skip_whitespace(data: &[u8], from: usize) -> usize {
    let mut i = from;
    while i < data.len() && is_whitespace(data[i]) {
        i += 1;
    }
    i
}

/// Length of a scalar token: up to the next delimiter or whitespace
fn token_end(data: &[u8]) -> usize {
    data.iter()
        .position(|&c| is_whitespace(c) || matches!(c, b',' | b'}' | b']'))
        .unwrap_or(data.len())
}

/// Find the end of a string whose opening quote was already consumed.
///
/// Returns the offset just past the closing quote and whether the string
/// contains escape sequences.
pub(crate) fn string_end(data: &[u8]) -> Option<(usize, bool)> {
    let mut escaped = false;
    let mut i = 0;
    while i < data.len() {
        match data[i] {
            b'\\' => {
                escaped = true;
                i += 2;
            }
            b'"' => return Some((i + 1, escaped)),
            _ => i += 1,
        }
    }
    None
}

/// Find the end of an array or object starting at `data[0]`.
///
/// Only `open`/`close` affect the depth; string contents are skipped so
/// brackets inside them do not count.
pub(crate) fn block_end(data: &[u8], open: u8, close: u8) -> Option<usize> {
    let mut level = 0usize;
    let mut i = 0;
    while i < data.len() {
        let c = data[i];
        if c == b'"' {
            let (len, _) = string_end(&data[i + 1..])?;
            i += len + 1;
            continue;
        }
        if c == open {
            level += 1;
        } else if c == close {
            level = level.checked_sub(1)?;
            if level == 0 {
                return Some(i + 1);
            }
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text<'a>(data: &'a [u8], span: Option<Span>) -> &'a str {
        std::str::from_utf8(span.unwrap().bytes(data)).unwrap()
    }

    #[test]
    fn test_scan_full_envelope() {
        let data = br#"{"jsonrpc":"2.0","method":"sum","params":[1, 2, 3, 4],"id":1}"#;
        let env = scan(data).unwrap();

        assert_eq!(text(data, env.jsonrpc), r#""2.0""#);
        assert_eq!(&data[env.method.unwrap().inner()], b"sum");
        assert_eq!(text(data, env.params), "[1, 2, 3, 4]");
        assert_eq!(text(data, env.id), "1");
        assert_eq!(env.id.unwrap().kind, ValueType::Number);
    }

    #[test]
    fn test_scan_notification_has_no_id() {
        let data = br#" { "jsonrpc": "2.0", "method": "sum", "params": [1, 2, 3, 4] } "#;
        let env = scan(data).unwrap();
        assert!(env.id.is_none());
        assert_eq!(env.params.unwrap().kind, ValueType::Array);
    }

    #[test]
    fn test_scan_null_and_string_ids() {
        let data = br#"{"id":null,"method":"m","jsonrpc":"2.0"}"#;
        assert_eq!(scan(data).unwrap().id.unwrap().kind, ValueType::Null);

        let data = br#"{"id":"a\"b","method":"m","jsonrpc":"2.0"}"#;
        let env = scan(data).unwrap();
        assert_eq!(text(data, env.id), r#""a\"b""#);
    }

    #[test]
    fn test_nested_values_are_opaque() {
        let data = br#"{"params":{"a":{"b":"}"},"c":[1,{"d":2}]},"other":[[],"]"],"method":"x"}"#;
        let env = scan(data).unwrap();
        assert_eq!(
            text(data, env.params),
            r#"{"a":{"b":"}"},"c":[1,{"d":2}]}"#
        );
        assert_eq!(&data[env.method.unwrap().inner()], b"x");
    }

    #[test]
    fn test_scalar_params() {
        for (data, kind) in [
            (&br#"{"params":true}"#[..], ValueType::Boolean),
            (br#"{"params":null}"#, ValueType::Null),
            (br#"{"params":-1.5e3 }"#, ValueType::Number),
            (br#"{"params":"error"}"#, ValueType::String),
        ] {
            assert_eq!(scan(data).unwrap().params.unwrap().kind, kind);
        }
    }

    #[test]
    fn test_escaped_keys_are_unescaped() {
        let data = br#"{"meth\u006fd":"sum","json\"rpc\"":1,"jsonrpc":"2.0"}"#;
        let env = scan(data).unwrap();
        assert_eq!(&data[env.method.unwrap().inner()], b"sum");
        assert!(env.jsonrpc.is_some());
    }

    #[test]
    fn test_long_escaped_key_is_skipped() {
        let key = format!("{}\\n", "k".repeat(UNESCAPE_STACK_BUF_SIZE * 2));
        let data = format!(r#"{{"{}":1,"method":"m"}}"#, key);
        let env = scan(data.as_bytes()).unwrap();
        assert!(env.method.is_some());
    }

    #[test]
    fn test_field_type_errors() {
        let env = scan(br#"{"id":{"a":1}}"#).unwrap();
        assert!(env.id.is_none());
        assert!(env.field_error.unwrap().is_field_type_error());

        let env = scan(br#"{"id":[1],"method":"m"}"#).unwrap();
        assert!(env.field_error.is_some());
        assert!(env.method.is_some());

        let data = br#"{"id":7,"method":1,"jsonrpc":"2.0"}"#;
        let env = scan(data).unwrap();
        assert_eq!(text(data, env.id), "7");
        assert!(env.method.is_none());
        assert!(env.jsonrpc.is_some());
        assert_eq!(
            env.field_error,
            Some(ScanError::IncorrectFieldType {
                field: "method",
                expected: "a string",
                found: ValueType::Number
            })
        );

        // first offender wins
        let env = scan(br#"{"jsonrpc":2.0,"method":true}"#).unwrap();
        assert!(matches!(
            env.field_error,
            Some(ScanError::IncorrectFieldType { field: "jsonrpc", .. })
        ));
    }

    #[test]
    fn test_field_type_error_does_not_hide_syntax_errors() {
        let err = scan(br#"{"method":1,"params":[}"#).unwrap_err();
        assert!(!err.is_field_type_error());
    }

    #[test]
    fn test_parse_errors() {
        let cases: &[&[u8]] = &[
            br#"{"jsonrpc": "2.0", "method": "foobar, "params": "bar", "baz]"#,
            br#"{"jsonrpc":"2.0""#,
            br#"{"params":[1,2}"#,
            br#"{"params":{"a":1}"#,
            br#"{{"method":"x"}}"#,
            br#"[{"method":"x"}]"#,
            br#"{:"x"}"#,
            br#"{"method" "x"}"#,
            br#"{"method":"x",}"#,
            br#"{"params":tru}"#,
            br#"{"params":}"#,
            br#"{"method":"x"} trailing"#,
            b"",
            b"   ",
        ];

        for case in cases {
            let err = scan(case).unwrap_err();
            assert!(
                !err.is_field_type_error(),
                "{:?} should be a parse error, got {err}",
                String::from_utf8_lossy(case)
            );
        }
    }

    #[test]
    fn test_empty_object() {
        assert_eq!(scan(b"{ }").unwrap(), Envelope::default());
    }

    #[test]
    fn test_block_end_skips_strings() {
        assert_eq!(block_end(br#"{"a":"}"} tail"#, b'{', b'}'), Some(9));
        assert_eq!(block_end(br#"[1,"]",[2]]"#, b'[', b']'), Some(11));
        assert_eq!(block_end(br#"{"a":1"#, b'{', b'}'), None);
    }

    #[test]
    fn test_string_end_handles_escaped_quotes() {
        assert_eq!(string_end(br#"ab" rest"#), Some((3, false)));
        assert_eq!(string_end(br#"a\"b" rest"#), Some((5, true)));
        assert_eq!(string_end(br#"a\\" rest"#), Some((4, true)));
        assert_eq!(string_end(br#"unterminated\"#), None);
    }
}
