use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::Value;

use crate::normalize::{normalize, NestedValue};

const PRETTY_INDENT: &[u8] = b"    ";

/// Render a nested value as JSON text for display in a chat message.
///
/// Values with real structure (a nested container at the first level, or
/// a mapping with named keys) are pretty-printed; flat lists and
/// numerically keyed mappings of scalars stay on one line. Slashes and
/// non-ASCII characters are emitted literally.
pub fn stringify(value: &NestedValue) -> String {
    let normalized = normalize(value);

    if needs_pretty(&normalized) {
        encode_pretty(&normalized)
    } else {
        normalized.to_string()
    }
}

/// Whether `value` should be rendered in indented multi-line form.
pub fn needs_pretty(value: &NestedValue) -> bool {
    has_second_dimension(value) || has_non_numeric_keys(value)
}

fn has_second_dimension(value: &NestedValue) -> bool {
    let is_container = |v: &Value| matches!(v, Value::Array(_) | Value::Object(_));
    match value {
        Value::Array(items) => items.iter().any(is_container),
        Value::Object(map) => map.values().any(is_container),
        _ => false,
    }
}

fn has_non_numeric_keys(value: &NestedValue) -> bool {
    match value {
        Value::Object(map) => map.keys().any(|key| !looks_numeric(key)),
        _ => false,
    }
}

/// Loose numeric check for mapping keys: optional surrounding whitespace,
/// optional sign, digits with an optional fraction and exponent.
pub fn looks_numeric(key: &str) -> bool {
    let s = key.trim_matches(|c: char| c.is_ascii_whitespace());
    let s = s.strip_prefix(['+', '-']).unwrap_or(s);

    let (mantissa, exponent) = match s.find(['e', 'E']) {
        Some(at) => (&s[..at], Some(&s[at + 1..])),
        None => (s, None),
    };

    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (mantissa, ""),
    };
    let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if int_part.is_empty() && frac_part.is_empty() {
        return false;
    }
    if !all_digits(int_part) || !all_digits(frac_part) {
        return false;
    }

    match exponent {
        None => true,
        Some(exp) => {
            let exp = exp.strip_prefix(['+', '-']).unwrap_or(exp);
            !exp.is_empty() && all_digits(exp)
        }
    }
}

fn encode_pretty(value: &NestedValue) -> String {
    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(PRETTY_INDENT));
    // A `Value` has string keys only and the writer is an in-memory `Vec`,
    // so serialization has no failure path; serde_json only emits UTF-8.
    value
        .serialize(&mut serializer)
        .expect("serializing a serde_json::Value into memory cannot fail");
    String::from_utf8(buf).expect("serde_json output is valid UTF-8")
}
