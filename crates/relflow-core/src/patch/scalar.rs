//! Scalar rendering with quote-style preservation.

use std::fmt::Write;

use serde_yaml::Value;

/// How a scalar is written in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum QuoteStyle {
    Plain,
    Single,
    Double,
}

impl QuoteStyle {
    /// Detects the style of an existing scalar.
    pub fn of(text: &str) -> Self {
        if text.starts_with('"') {
            Self::Double
        } else if text.starts_with('\'') {
            Self::Single
        } else {
            Self::Plain
        }
    }
}

/// Renders `value` in `style`, falling back to double quotes when the
/// requested style would not read back as the same string.
pub(crate) fn render(value: &str, style: QuoteStyle, flow: bool) -> String {
    match style {
        QuoteStyle::Plain if plain_is_safe(value, flow) => value.to_string(),
        QuoteStyle::Single if !value.chars().any(char::is_control) => {
            format!("'{}'", value.replace('\'', "''"))
        }
        _ => double_quoted(value),
    }
}

/// Renders a mapping key, plain whenever possible.
pub(crate) fn render_key(name: &str) -> String {
    render(name, QuoteStyle::Plain, false)
}

fn plain_is_safe(value: &str, flow: bool) -> bool {
    if value.is_empty() || value.trim() != value {
        return false;
    }
    if value.chars().any(char::is_control) {
        return false;
    }
    if flow && value.contains([',', '[', ']', '{', '}']) {
        return false;
    }
    if value.contains(": ") || value.contains(" #") || value.ends_with(':') {
        return false;
    }

    // Anything YAML would resolve to a non-string (numbers, booleans, null)
    // or read differently must be quoted.
    matches!(
        serde_yaml::from_str::<Value>(value),
        Ok(Value::String(parsed)) if parsed == value
    )
}

fn double_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04X}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
