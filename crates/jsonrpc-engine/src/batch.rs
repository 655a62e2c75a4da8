//! Batch splitter
//!
//! Slices a top-level JSON array into the byte ranges of its elements. Each
//! element must be an object; its contents are skipped by brace matching and
//! left for the envelope scanner.

use std::ops::Range;

use thiserror::Error;

use crate::error::JsonRpcErrorObject;
use crate::scanner::{block_end, is_whitespace, skip_whitespace};

/// Reasons a batch cannot be split
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SplitError {
    #[error("input is not a JSON array")]
    NotArray,

    #[error("batch element at offset {offset} is not an object")]
    NotAnObject { offset: usize },

    #[error("batch array is not terminated")]
    Unterminated,

    #[error("unexpected data after batch array at offset {offset}")]
    TrailingData { offset: usize },
}

impl SplitError {
    /// Protocol error reported for this failure
    pub fn to_error_object(&self) -> JsonRpcErrorObject {
        match self {
            SplitError::NotAnObject { .. } => JsonRpcErrorObject::invalid_request(),
            _ => JsonRpcErrorObject::parse_error(),
        }
    }
}

/// Whether the first non-whitespace byte opens an array
pub fn is_array(data: &[u8]) -> bool {
    data.iter().find(|c| !is_whitespace(**c)) == Some(&b'[')
}

/// Byte ranges of every element, in request order
pub fn split(data: &[u8]) -> Result<Vec<Range<usize>>, SplitError> {
    let mut spans = Vec::new();
    walk(data, |span| spans.push(span))?;
    Ok(spans)
}

/// Number of elements, without recording their ranges
pub fn array_len(data: &[u8]) -> Result<usize, SplitError> {
    let mut len = 0;
    walk(data, |_| len += 1)?;
    Ok(len)
}

fn walk(data: &[u8], mut on_element: impl FnMut(Range<usize>)) -> Result<(), SplitError> {
    let mut i = skip_whitespace(data, 0);
    if data.get(i) != Some(&b'[') {
        return Err(SplitError::NotArray);
    }
    i += 1;

    loop {
        match data.get(i) {
            None => return Err(SplitError::Unterminated),
            Some(&c) if c == b',' || is_whitespace(c) => i += 1,
            Some(b']') => {
                i += 1;
                break;
            }
            Some(b'{') => {
                let len = block_end(&data[i..], b'{', b'}').ok_or(SplitError::Unterminated)?;
                on_element(i..i + len);
                i += len;
            }
            Some(_) => return Err(SplitError::NotAnObject { offset: i }),
        }
    }

    let rest = skip_whitespace(data, i);
    if rest < data.len() {
        return Err(SplitError::TrailingData { offset: rest });
    }
    Ok(())
}
