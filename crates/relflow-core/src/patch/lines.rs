//! Line-level view of a YAML document.

/// One physical line, without its line ending.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Line<'a> {
    /// Byte offset of the line in the source.
    pub start: usize,
    /// Line content without the line ending.
    pub text: &'a str,
}

impl<'a> Line<'a> {
    /// Byte offset just past the content (before the line ending).
    pub fn end(&self) -> usize {
        self.start + self.text.len()
    }

    /// Number of leading spaces.
    pub fn indent(&self) -> usize {
        self.text.len() - self.text.trim_start_matches(' ').len()
    }

    /// Content after the indentation.
    pub fn body(&self) -> &'a str {
        &self.text[self.indent()..]
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn is_comment(&self) -> bool {
        self.text.trim_start().starts_with('#')
    }

    /// Document markers (`---`, `...`) and directives (`%YAML`).
    pub fn is_marker(&self) -> bool {
        let text = self.text;
        text.starts_with('%')
            || ["---", "..."].iter().any(|marker| {
                text.strip_prefix(marker)
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with([' ', '\t']))
            })
    }

    /// True for lines that carry YAML content.
    pub fn is_content(&self) -> bool {
        !self.is_blank() && !self.is_comment() && !self.is_marker()
    }

    /// True if the body starts a block sequence item.
    pub fn is_sequence_item(&self) -> bool {
        let body = self.body();
        body == "-" || body.starts_with("- ")
    }
}

/// Splits `source` into lines, keeping byte offsets.
pub(crate) fn split_lines(source: &str) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    let mut start = 0;

    for chunk in source.split_inclusive('\n') {
        let text = chunk
            .strip_suffix('\n')
            .map_or(chunk, |t| t.strip_suffix('\r').unwrap_or(t));
        lines.push(Line { start, text });
        start += chunk.len();
    }

    lines
}

/// Returns the line ending used by the document.
pub(crate) fn detect_eol(source: &str) -> &'static str {
    if source
        .find('\n')
        .is_some_and(|pos| source[..pos].ends_with('\r'))
    {
        "\r\n"
    } else {
        "\n"
    }
}

/// Splits a line fragment into its value and trailing comment.
///
/// The comment keeps the whitespace that precedes it so it can be written
/// back unchanged. `#` only starts a comment outside quotes and after
/// whitespace (or at the very start).
pub(crate) fn split_comment(s: &str) -> (&str, &str) {
    let bytes = s.as_bytes();
    let mut quote: Option<u8> = None;
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
            None => {
                if c == b'#' && (i == 0 || matches!(bytes[i - 1], b' ' | b'\t')) {
                    let value = s[..i].trim_end();
                    return (value, &s[value.len()..]);
                }
                if matches!(c, b'"' | b'\'') && opens_quote(bytes, i) {
                    quote = Some(c);
                }
            }
        }
        i += 1;
    }

    let value = s.trim_end();
    (value, &s[value.len()..])
}

pub(crate) fn opens_quote(bytes: &[u8], i: usize) -> bool {
    i == 0 || matches!(bytes[i - 1], b' ' | b'\t' | b'{' | b'[' | b',' | b':' | b'-')
}

/// A `key: value` split of a line body or flow entry.
#[derive(Debug, Clone, Copy)]
pub(crate) struct KeySplit<'a> {
    /// Key as written, including quotes.
    pub key_text: &'a str,
    /// Everything after the `:` (value, comment, leading whitespace).
    pub rest: &'a str,
}

impl KeySplit<'_> {
    /// The key with quotes removed.
    pub fn name(&self) -> String {
        unquote(self.key_text).unwrap_or_else(|| self.key_text.to_string())
    }
}

/// Splits `body` at the mapping indicator of its key.
///
/// Returns `None` for sequence items, complex keys, and lines without a key.
pub(crate) fn split_key(body: &str) -> Option<KeySplit<'_>> {
    let first = body.chars().next()?;

    if first == '"' || first == '\'' {
        let end = closing_quote(body, first)?;
        let key_text = &body[..=end];
        let after = body[end + 1..].trim_start_matches([' ', '\t']);
        let rest = after.strip_prefix(':')?;
        return Some(KeySplit { key_text, rest });
    }

    if matches!(
        first,
        '?' | '#' | '{' | '[' | '&' | '*' | '!' | '|' | '>' | '%' | '@' | '`' | ','
    ) || body == "-"
        || body.starts_with("- ")
    {
        return None;
    }

    let bytes = body.as_bytes();
    for i in 0..bytes.len() {
        match bytes[i] {
            b':' if matches!(bytes.get(i + 1), None | Some(b' ' | b'\t')) => {
                let key_text = body[..i].trim_end();
                if key_text.is_empty() {
                    return None;
                }
                return Some(KeySplit {
                    key_text,
                    rest: &body[i + 1..],
                });
            }
            b'#' if i > 0 && matches!(bytes[i - 1], b' ' | b'\t') => return None,
            _ => {}
        }
    }

    None
}

/// Byte index of the quote closing the scalar that starts at index 0.
pub(crate) fn closing_quote(s: &str, quote: char) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut i = 1;

    while i < bytes.len() {
        let c = bytes[i];
        if quote == '"' {
            if c == b'\\' {
                i += 2;
                continue;
            }
            if c == b'"' {
                return Some(i);
            }
        } else if c == b'\'' {
            if bytes.get(i + 1) == Some(&b'\'') {
                i += 2;
                continue;
            }
            return Some(i);
        }
        i += 1;
    }

    None
}

/// Removes the quotes of a single-line quoted scalar.
///
/// Returns `None` for plain scalars.
pub(crate) fn unquote(s: &str) -> Option<String> {
    if s.len() >= 2 && s.starts_with('\'') && s.ends_with('\'') {
        return Some(s[1..s.len() - 1].replace("''", "'"));
    }

    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        let inner = &s[1..s.len() - 1];
        let mut out = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                out.push(c);
                continue;
            }
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('0') => out.push('\0'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        }
        return Some(out);
    }

    None
}

/// Byte offset of `inner` within `outer`.
///
/// `inner` must be a subslice of `outer`.
pub(crate) fn offset_in(outer: &str, inner: &str) -> usize {
    inner.as_ptr() as usize - outer.as_ptr() as usize
}
