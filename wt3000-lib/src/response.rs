//! Decoding of raw response bytes into text and measurement values.
//!
//! Text responses (identification, module type) are returned verbatim once the
//! terminator is removed. Numeric responses are decoded according to the
//! numeric format the instrument was configured with:
//!
//! - **ASCII**: comma-separated decimal fields, e.g. `1.250,-2.0,0.0`
//! - **FLOat**: an IEEE 488.2 definite-length block (`#<n><len><data>`) of
//!   big-endian single-precision values. A FLOat response that does not start
//!   with `#` falls back to the ASCII decoder.

use crate::constants::NUMERIC_SEPARATOR;
use crate::error::{Result, WTError};
use crate::state::{ConfigurationState, NumericFormat};
use bytes::Buf;

const BLOCK_MARKER: u8 = b'#';
const FLOAT_SIZE: usize = 4;

/// Interprets responses under one snapshot of the configuration state.
#[derive(Debug, Clone, Copy)]
pub struct ResponseDecoder<'a> {
    terminator: &'a [u8],
    header: bool,
    format: Option<NumericFormat>,
}

impl<'a> ResponseDecoder<'a> {
    pub fn new(terminator: &'a [u8], state: &ConfigurationState) -> Self {
        Self {
            terminator,
            header: state.header(),
            format: state.numeric_format(),
        }
    }

    /// Identification or module string with framing removed.
    pub fn text(&self, raw: &[u8]) -> String {
        let text = String::from_utf8_lossy(strip_terminator(raw, self.terminator));
        if self.header {
            strip_header(&text).to_string()
        } else {
            text.into_owned()
        }
    }

    /// Decodes a `:NUMeric:VALue?` response into values in reported order.
    pub fn numeric(&self, raw: &[u8]) -> Result<Vec<f32>> {
        // The header precedes a binary block too, so it goes before the marker check
        let raw = if self.header { &raw[header_end(raw)..] } else { raw };
        match self.format {
            Some(NumericFormat::Float) if raw.first() == Some(&BLOCK_MARKER) => parse_float_block(raw, self.terminator),
            Some(NumericFormat::Float) | Some(NumericFormat::Ascii) | None => {
                let body = strip_terminator(raw, self.terminator);
                let text = std::str::from_utf8(body)
                    .map_err(|e| WTError::MalformedNumericResponse(format!("response is not ASCII: {e}")))?;
                parse_ascii_values(text)
            }
        }
    }
}

/// Removes one trailing terminator, then any trailing CR/LF left behind.
pub fn strip_terminator<'b>(raw: &'b [u8], terminator: &[u8]) -> &'b [u8] {
    let raw = if terminator.is_empty() {
        raw
    } else {
        raw.strip_suffix(terminator).unwrap_or(raw)
    };
    let end = raw
        .iter()
        .rposition(|b| !matches!(b, b'\r' | b'\n'))
        .map_or(0, |i| i + 1);
    &raw[..end]
}

/// Drops a leading `:<header> ` from a subsystem response. Text without a
/// header (common-command responses) is returned unchanged.
pub fn strip_header(text: &str) -> &str {
    // header_end always lands on an ASCII byte, so this is a char boundary
    &text[header_end(text.as_bytes())..]
}

/// Offset of the first byte after a leading `:<header> ` and the spaces that
/// follow it, or 0 when there is no such header.
fn header_end(raw: &[u8]) -> usize {
    if raw.first() != Some(&b':') {
        return 0;
    }
    match raw.iter().position(|&b| b == b' ') {
        Some(space) => {
            let spaces = raw[space..].iter().take_while(|&&b| b == b' ').count();
            space + spaces
        }
        None => 0,
    }
}

/// Parses comma-separated decimal fields. Fails on an empty response or any
/// field that is not a number.
pub fn parse_ascii_values(text: &str) -> Result<Vec<f32>> {
    let text = text.trim();
    if text.is_empty() {
        return Err(WTError::MalformedNumericResponse(
            "empty response, expected at least one value".to_string(),
        ));
    }

    text.split(NUMERIC_SEPARATOR)
        .enumerate()
        .map(|(index, field)| {
            let field = field.trim();
            field.parse::<f32>().map_err(|e| {
                WTError::MalformedNumericResponse(format!("field {index} ({field:?}) is not a number: {e}"))
            })
        })
        .collect()
}

/// Parses an IEEE 488.2 block of big-endian `f32`s. `#0` (indefinite length)
/// runs to the terminator.
pub fn parse_float_block(raw: &[u8], terminator: &[u8]) -> Result<Vec<f32>> {
    let malformed = |msg: String| WTError::MalformedNumericResponse(msg);

    let rest = raw
        .strip_prefix(&[BLOCK_MARKER])
        .ok_or_else(|| malformed("block does not start with '#'".to_string()))?;
    let (&digits, rest) = rest
        .split_first()
        .ok_or_else(|| malformed("block header is missing its length digit".to_string()))?;
    let digits = (digits as char)
        .to_digit(10)
        .ok_or_else(|| malformed(format!("invalid block length digit {:?}", digits as char)))? as usize;

    let data = if digits == 0 {
        // Only the terminator itself; CR/LF bytes before it are float data
        rest.strip_suffix(terminator).unwrap_or(rest)
    } else {
        if rest.len() < digits {
            return Err(malformed(format!("block header needs {digits} length digits")));
        }
        let (len_field, rest) = rest.split_at(digits);
        let length: usize = std::str::from_utf8(len_field)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| malformed(format!("invalid block length {:?}", String::from_utf8_lossy(len_field))))?;
        if rest.len() < length {
            return Err(malformed(format!("block declares {length} bytes, only {} present", rest.len())));
        }
        &rest[..length]
    };

    if data.is_empty() {
        return Err(malformed("empty block, expected at least one value".to_string()));
    }
    if data.len() % FLOAT_SIZE != 0 {
        return Err(malformed(format!(
            "block length {} is not a multiple of {FLOAT_SIZE}",
            data.len()
        )));
    }

    let mut buf = data;
    let mut values = Vec::with_capacity(data.len() / FLOAT_SIZE);
    while buf.has_remaining() {
        values.push(buf.get_f32());
    }
    Ok(values)
}
