//! Tests for decoding `:NUMeric:VALue?` responses

mod common;

use common::*;
use wt3000_lib::response::{parse_ascii_values, parse_float_block, strip_terminator};

#[test]
fn test_ascii_values_in_reported_order() {
    let values = parse_ascii_values("1.250,-2.0,0.0").unwrap();
    assert_eq!(values, vec![1.25, -2.0, 0.0]);
}

#[test]
fn test_ascii_values_keep_duplicates() {
    let values = parse_ascii_values("5.0,1.0,5.0,1.0").unwrap();
    assert_eq!(values, vec![5.0, 1.0, 5.0, 1.0]);
}

#[test]
fn test_ascii_value_count_matches_fields() {
    let text = (0..255).map(|i| format!("{i}.5E+00")).collect::<Vec<_>>().join(",");
    let values = parse_ascii_values(&text).unwrap();
    assert_eq!(values.len(), 255);
    assert_eq!(values[254], 254.5);
}

#[test]
fn test_ascii_value_not_a_number() {
    match parse_ascii_values("1.25,abc") {
        Err(WTError::MalformedNumericResponse(msg)) => {
            assert!(msg.contains("abc"), "message should name the field: {msg}");
        }
        other => panic!("Expected MalformedNumericResponse, got {other:?}"),
    }
}

#[test]
fn test_empty_response_is_malformed() {
    for text in ["", "   ", "\n"] {
        assert!(
            matches!(parse_ascii_values(text), Err(WTError::MalformedNumericResponse(_))),
            "empty response {text:?} should be rejected"
        );
    }
}

#[test]
fn test_terminator_then_ascii() {
    let raw = b"1.0,2.0\r\n";
    let text = std::str::from_utf8(strip_terminator(raw, b"\n")).unwrap();
    assert_eq!(parse_ascii_values(text).unwrap(), vec![1.0, 2.0]);
}

#[test]
fn test_float_block_values() {
    let expected = [230.1f32, 4.98, -1146.0, 0.0];
    let mut raw = format!("#2{:02}", expected.len() * 4).into_bytes();
    for value in expected {
        raw.extend_from_slice(&value.to_be_bytes());
    }
    raw.extend_from_slice(b"\n");

    assert_eq!(parse_float_block(&raw, b"\n").unwrap(), expected.to_vec());
}

#[test]
fn test_float_block_short_data() {
    // Declares 8 bytes, carries 4
    let mut raw = b"#18".to_vec();
    raw.extend_from_slice(&1.0f32.to_be_bytes());
    assert!(matches!(
        parse_float_block(&raw, b"\n"),
        Err(WTError::MalformedNumericResponse(_))
    ));
}
