//! In-place edits of single-line flow mappings (`{A: 1, B: 2}`).

use super::lines::{opens_quote, split_key};
use super::scalar::{QuoteStyle, render, render_key};

/// Sets `key` to `value` inside a flow mapping written on one line.
///
/// `flow` must start with `{` and end with `}`. Returns the edited text and
/// whether the key already existed, or `None` if the mapping cannot be split
/// into entries.
pub(crate) fn set_entry(flow: &str, key: &str, value: &str) -> Option<(String, bool)> {
    let inner = flow.strip_prefix('{')?.strip_suffix('}')?;
    let segments = split_entries(inner)?;

    let mut last_end = None;
    for (start, end) in segments {
        let segment = &inner[start..end];
        let trimmed = segment.trim();
        if trimmed.is_empty() {
            continue;
        }
        let lead = segment.len() - segment.trim_start().len();
        let entry_start = start + lead;
        last_end = Some(entry_start + trimmed.len());

        let split = split_key(trimmed)?;
        if split.name() != key {
            continue;
        }

        let value_text = split.rest.trim();
        let value_start = entry_start + (trimmed.len() - split.rest.len())
            + (split.rest.len() - split.rest.trim_start().len());
        let value_end = value_start + value_text.len();

        let rendered = render(value, QuoteStyle::of(value_text), true);
        let replacement = if value_text.is_empty() {
            format!(" {rendered}")
        } else {
            rendered
        };

        // Offsets are relative to `inner`; +1 skips the opening brace.
        let text = splice(flow, value_start + 1, value_end + 1, &replacement);
        return Some((text, true));
    }

    let entry = format!("{}: {}", render_key(key), render(value, QuoteStyle::Plain, true));
    let text = match last_end {
        Some(end) => splice(flow, end + 1, end + 1, &format!(", {entry}")),
        None => format!("{{{entry}}}"),
    };
    Some((text, false))
}

fn splice(text: &str, start: usize, end: usize, replacement: &str) -> String {
    format!("{}{}{}", &text[..start], replacement, &text[end..])
}

/// Splits flow content at top-level commas, returning byte ranges.
fn split_entries(inner: &str) -> Option<Vec<(usize, usize)>> {
    let bytes = inner.as_bytes();
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        match quote {
            Some(b'\'') => {
                if c == b'\'' {
                    if bytes.get(i + 1) == Some(&b'\'') {
                        i += 1;
                    } else {
                        quote = None;
                    }
                }
            }
            Some(_) => {
                if c == b'\\' {
                    i += 1;
                } else if c == b'"' {
                    quote = None;
                }
            }
            None => match c {
                b'"' | b'\'' if opens_quote(bytes, i) => quote = Some(c),
                b'{' | b'[' => depth += 1,
                b'}' | b']' => depth = depth.checked_sub(1)?,
                b',' if depth == 0 => {
                    segments.push((start, i));
                    start = i + 1;
                }
                _ => {}
            },
        }
        i += 1;
    }

    if quote.is_some() || depth != 0 {
        return None;
    }
    segments.push((start, bytes.len()));
    Some(segments)
}
