//! Deployment config patcher.
//!
//! Sets `<section>.<key>` (by default `environment.VERSION`) in a YAML file
//! without re-serializing it. The document is parsed with `serde_yaml` to
//! learn what the section holds, then only the affected lines are spliced, so
//! comments, quoting, key order and blank lines elsewhere stay byte-identical.
//! The spliced text is parsed again and compared with the original before it
//! is accepted.
//!
//! Supported layouts for the section:
//! - absent: a block mapping is appended at the end of the document
//! - null (`environment:`, `environment: ~`): turned into a block mapping
//! - block mapping: the key is replaced in place or added after the last entry
//! - single-line flow mapping (`{DEBUG: "1"}`): edited inside the braces
//! - block sequence of `KEY=value` strings: the item is replaced or appended

mod flow;
mod lines;
mod scalar;

use std::cmp::Reverse;
use std::fmt::{self, Write};
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};
use tracing::{debug, info};

use crate::{CoreError, CoreResult, PatchError, PatchResult};
use lines::{Line, detect_eol, offset_in, split_comment, split_key, split_lines, unquote};
use scalar::{QuoteStyle, render, render_key};

/// Default top-level section.
pub const DEFAULT_SECTION: &str = "environment";

/// Default key inside the section.
pub const DEFAULT_KEY: &str = "VERSION";

/// What a patch did to the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchKind {
    /// The document already held the value.
    Unchanged,
    /// An existing value was overwritten.
    Replaced,
    /// The key was added to an existing section.
    Inserted,
    /// The section was created (or a null section filled in).
    Created,
}

impl fmt::Display for PatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unchanged => "unchanged",
            Self::Replaced => "updated",
            Self::Inserted => "added",
            Self::Created => "created",
        };
        f.write_str(label)
    }
}

/// Result of patching a document in memory.
#[derive(Debug, Clone)]
pub struct Patched {
    /// The edited document.
    pub text: String,
    /// What changed.
    pub kind: PatchKind,
}

/// Result of patching a file on disk.
#[derive(Debug, Clone)]
pub struct PatchOutcome {
    /// The patched file.
    pub path: PathBuf,
    /// What changed.
    pub kind: PatchKind,
    /// Whether the file was rewritten.
    pub written: bool,
}

/// Which entry of the document to set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvPatch {
    section: String,
    key: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectionState {
    Absent,
    Null,
    Mapping,
    Sequence,
}

struct Edit {
    range: Range<usize>,
    text: String,
}

/// Lines `first..=last` of one entry of a block collection.
#[derive(Debug, Clone, Copy)]
struct Entry {
    first: usize,
    last: usize,
}

struct Document<'a> {
    source: &'a str,
    lines: Vec<Line<'a>>,
    eol: &'static str,
    root_indent: usize,
    width: usize,
}

impl Default for EnvPatch {
    fn default() -> Self {
        Self::new(DEFAULT_SECTION, DEFAULT_KEY)
    }
}

impl EnvPatch {
    /// Targets `<section>.<key>`.
    #[must_use]
    pub fn new(section: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            key: key.into(),
        }
    }

    /// Returns the section name.
    #[must_use]
    pub fn section(&self) -> &str {
        &self.section
    }

    /// Returns the key name.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Sets the key to `value` in `source` and returns the edited text.
    ///
    /// # Errors
    ///
    /// Returns an error if the source is not a YAML mapping, the section is
    /// not a mapping, its layout cannot be edited in place, or the edited
    /// text does not read back as expected.
    pub fn apply(&self, source: &str, value: &str) -> PatchResult<Patched> {
        let original = parse_root(source)?;
        let state = self.section_state(&original)?;
        let doc = Document::new(source);

        if doc.root_is_flow() {
            return Err(self.unsupported("flow-style document root"));
        }

        let (edits, kind) = match (doc.find_section(&self.section), state) {
            (None, SectionState::Absent) => (vec![self.append_section(&doc, value)], PatchKind::Created),
            (None, _) => return Err(self.unsupported("section is not a plain top-level key")),
            (Some(_), SectionState::Absent) => {
                return Err(self.unsupported("section key does not resolve to a plain string"));
            }
            (Some(at), state) => self.edit_section(&doc, at, state, value)?,
        };

        let text = apply_edits(source, edits);
        self.verify(&original, &text, value)?;

        let kind = if text == source {
            PatchKind::Unchanged
        } else {
            kind
        };
        debug!(section = %self.section, key = %self.key, %kind, "patched document");

        Ok(Patched { text, kind })
    }

    fn section_state(&self, root: &Mapping) -> PatchResult<SectionState> {
        match lookup(root, &self.section) {
            None => Ok(SectionState::Absent),
            Some(Value::Null) => Ok(SectionState::Null),
            Some(Value::Mapping(_)) => Ok(SectionState::Mapping),
            Some(Value::Sequence(_)) => Ok(SectionState::Sequence),
            Some(_) => Err(PatchError::SectionNotAMapping(self.section.clone())),
        }
    }

    fn unsupported(&self, reason: &str) -> PatchError {
        PatchError::UnsupportedLayout {
            section: self.section.clone(),
            reason: reason.to_string(),
        }
    }

    fn append_section(&self, doc: &Document<'_>, value: &str) -> Edit {
        let eol = doc.eol;
        let indent = " ".repeat(doc.root_indent);
        let child_indent = " ".repeat(doc.root_indent + doc.width);

        // A trailing `...` ends the document; the block goes in front of it.
        let at = doc.end_marker().map_or(doc.source.len(), |line| line.start);

        let mut text = String::new();
        if at > 0 && !doc.source[..at].ends_with('\n') {
            text.push_str(eol);
        }
        let _ = write!(
            text,
            "{indent}{}:{eol}{child_indent}{}: {}{eol}",
            render_key(&self.section),
            render_key(&self.key),
            render(value, QuoteStyle::Plain, false),
        );

        Edit {
            range: at..at,
            text,
        }
    }

    fn edit_section(
        &self,
        doc: &Document<'_>,
        at: usize,
        state: SectionState,
        value: &str,
    ) -> PatchResult<(Vec<Edit>, PatchKind)> {
        let line = doc.lines[at];
        let split = split_key(line.body()).ok_or_else(|| self.unsupported("unreadable key line"))?;
        let (value_part, comment) = split_comment(split.rest);
        let (props, inline) = split_properties(value_part.trim());

        if inline.starts_with('*') {
            return Err(self.unsupported("alias value"));
        }

        let entries = doc.entries(doc.section_body(at));

        match state {
            SectionState::Null => {
                if !entries.is_empty() || !(inline.is_empty() || is_null_literal(inline)) {
                    return Err(self.unsupported("null section with unexpected content"));
                }

                let props = if props.is_empty() {
                    String::new()
                } else {
                    format!(" {props}")
                };
                let text = format!(
                    "{}:{props}{comment}{}{}{}: {}",
                    split.key_text,
                    doc.eol,
                    " ".repeat(doc.root_indent + doc.width),
                    render_key(&self.key),
                    render(value, QuoteStyle::Plain, false),
                );
                let start = line.start + line.indent();
                Ok((
                    vec![Edit {
                        range: start..line.end(),
                        text,
                    }],
                    PatchKind::Created,
                ))
            }
            SectionState::Mapping if inline.starts_with('{') => {
                if !inline.ends_with('}') || !entries.is_empty() {
                    return Err(self.unsupported("multi-line flow mapping"));
                }

                let (text, existed) = flow::set_entry(inline, &self.key, value)
                    .ok_or_else(|| self.unsupported("unreadable flow mapping"))?;
                let start = line.start + offset_in(line.text, inline);
                let kind = if existed {
                    PatchKind::Replaced
                } else {
                    PatchKind::Inserted
                };
                Ok((
                    vec![Edit {
                        range: start..start + inline.len(),
                        text,
                    }],
                    kind,
                ))
            }
            SectionState::Mapping if inline.is_empty() && !entries.is_empty() => {
                self.edit_block_mapping(doc, &entries, value)
            }
            SectionState::Sequence if inline.is_empty() && !entries.is_empty() => {
                self.edit_block_sequence(doc, &entries, value)
            }
            SectionState::Sequence if inline.starts_with('[') => {
                Err(self.unsupported("flow sequence"))
            }
            _ => Err(self.unsupported("unexpected inline value")),
        }
    }

    fn edit_block_mapping(
        &self,
        doc: &Document<'_>,
        entries: &[Entry],
        value: &str,
    ) -> PatchResult<(Vec<Edit>, PatchKind)> {
        for entry in entries {
            let line = doc.lines[entry.first];
            let split =
                split_key(line.body()).ok_or_else(|| self.unsupported("entry without a key"))?;
            if split.name() != self.key {
                continue;
            }

            let after = split.rest.trim_start_matches([' ', '\t']);
            let (current, comment) = split_comment(after);
            let (sep, comment) = if current.is_empty() {
                let comment = if after.is_empty() {
                    String::new()
                } else {
                    format!(" {after}")
                };
                (" ", comment)
            } else {
                (&split.rest[..split.rest.len() - after.len()], comment.to_string())
            };

            let style = if current.starts_with(['|', '>', '&', '!']) {
                QuoteStyle::Plain
            } else {
                QuoteStyle::of(current)
            };
            let text = format!(
                "{}:{sep}{}{comment}",
                split.key_text,
                render(value, style, false)
            );

            let start = line.start + line.indent();
            let mut edits = vec![Edit {
                range: start..line.end(),
                text,
            }];
            edits.extend(doc.drop_continuation(*entry));
            return Ok((edits, PatchKind::Replaced));
        }

        let indent = doc.lines[entries[0].first].indent();
        let text = format!(
            "{}{}{}: {}",
            doc.eol,
            " ".repeat(indent),
            render_key(&self.key),
            render(value, QuoteStyle::Plain, false)
        );
        Ok((vec![doc.insert_after(entries, text)], PatchKind::Inserted))
    }

    fn edit_block_sequence(
        &self,
        doc: &Document<'_>,
        entries: &[Entry],
        value: &str,
    ) -> PatchResult<(Vec<Edit>, PatchKind)> {
        let prefix = format!("{}=", self.key);
        let item = format!("{prefix}{value}");

        for entry in entries {
            let line = doc.lines[entry.first];
            let body = line
                .body()
                .strip_prefix('-')
                .ok_or_else(|| self.unsupported("sequence item expected"))?;
            let (current, _) = split_comment(body.trim_start());
            let text_value = unquote(current).unwrap_or_else(|| current.to_string());
            if !text_value.starts_with(&prefix) {
                continue;
            }

            let start = line.start + offset_in(line.text, current);
            let mut edits = vec![Edit {
                range: start..start + current.len(),
                text: render(&item, QuoteStyle::of(current), false),
            }];
            edits.extend(doc.drop_continuation(*entry));
            return Ok((edits, PatchKind::Replaced));
        }

        let indent = doc.lines[entries[0].first].indent();
        let text = format!(
            "{}{}- {}",
            doc.eol,
            " ".repeat(indent),
            render(&item, QuoteStyle::Plain, false)
        );
        Ok((vec![doc.insert_after(entries, text)], PatchKind::Inserted))
    }

    fn verify(&self, original: &Mapping, text: &str, value: &str) -> PatchResult<()> {
        let fail = |reason: String| Err(PatchError::Verification(reason));

        let patched = parse_root(text).map_err(|e| {
            PatchError::Verification(format!("patched text does not parse: {e}"))
        })?;

        if without(original, &self.section) != without(&patched, &self.section) {
            return fail(format!("keys outside `{}` changed", self.section));
        }

        match (lookup(original, &self.section), lookup(&patched, &self.section)) {
            (old, Some(Value::Mapping(new))) => {
                let expected = Value::String(value.to_string());
                if lookup(new, &self.key) != Some(&expected) {
                    return fail(format!(
                        "`{}.{}` does not read back as {value:?}",
                        self.section, self.key
                    ));
                }
                let old_rest = match old {
                    Some(Value::Mapping(old)) => without(old, &self.key),
                    _ => Mapping::new(),
                };
                if old_rest != without(new, &self.key) {
                    return fail(format!("other `{}` entries changed", self.section));
                }
                Ok(())
            }
            (Some(Value::Sequence(old)), Some(Value::Sequence(new))) => {
                let prefix = format!("{}=", self.key);
                let expected = Value::String(format!("{prefix}{value}"));
                let is_ours =
                    |item: &&Value| item.as_str().is_some_and(|s| s.starts_with(&prefix));

                let ours: Vec<&Value> = new.iter().filter(is_ours).collect();
                if ours != [&expected] {
                    return fail(format!(
                        "`{}` does not hold exactly one {prefix}{value} item",
                        self.section
                    ));
                }
                let old_rest: Vec<&Value> = old.iter().filter(|v| !is_ours(v)).collect();
                let new_rest: Vec<&Value> = new.iter().filter(|v| !is_ours(v)).collect();
                if old_rest != new_rest {
                    return fail(format!("other `{}` items changed", self.section));
                }
                Ok(())
            }
            _ => fail(format!("`{}` is not a mapping after patching", self.section)),
        }
    }
}

impl<'a> Document<'a> {
    fn new(source: &'a str) -> Self {
        let lines = split_lines(source);
        let root_indent = lines
            .iter()
            .find(|l| l.is_content())
            .map_or(0, Line::indent);
        let width = lines
            .iter()
            .filter(|l| l.is_content())
            .map(Line::indent)
            .find(|&indent| indent > root_indent)
            .map_or(2, |indent| indent - root_indent);

        Self {
            source,
            lines,
            eol: detect_eol(source),
            root_indent,
            width,
        }
    }

    fn root_is_flow(&self) -> bool {
        self.lines
            .iter()
            .find(|l| l.is_content())
            .is_some_and(|l| l.body().starts_with(['{', '[']))
    }

    /// The `...` document end marker, when it is the last meaningful line.
    fn end_marker(&self) -> Option<&Line<'a>> {
        self.lines
            .iter()
            .rev()
            .find(|l| !l.is_blank() && !l.is_comment())
            .filter(|l| l.is_marker() && l.text.starts_with("..."))
    }

    /// Index of the line declaring the top-level `section` key.
    fn find_section(&self, section: &str) -> Option<usize> {
        self.lines.iter().position(|line| {
            line.is_content()
                && line.indent() == self.root_indent
                && split_key(line.body()).is_some_and(|split| split.name() == section)
        })
    }

    /// Line range holding the nested value of the key at line `at`.
    fn section_body(&self, at: usize) -> Range<usize> {
        let mut end = at + 1;
        let mut compact = None;

        for (idx, line) in self.lines.iter().enumerate().skip(at + 1) {
            if !line.is_content() {
                continue;
            }
            let indent = line.indent();
            // A sequence may sit at the same indentation as its key.
            let is_compact = *compact
                .get_or_insert(indent == self.root_indent && line.is_sequence_item());
            let inside = indent > self.root_indent
                || (is_compact && indent == self.root_indent && line.is_sequence_item());
            if !inside {
                break;
            }
            end = idx + 1;
        }

        at + 1..end
    }

    /// Splits a block collection body into its entries.
    fn entries(&self, body: Range<usize>) -> Vec<Entry> {
        let Some(child_indent) = self.lines[body.clone()]
            .iter()
            .find(|l| l.is_content())
            .map(Line::indent)
        else {
            return Vec::new();
        };

        let starts: Vec<usize> = body
            .clone()
            .filter(|&idx| {
                let line = &self.lines[idx];
                line.is_content() && line.indent() == child_indent
            })
            .collect();

        starts
            .iter()
            .enumerate()
            .map(|(n, &first)| {
                let next = starts.get(n + 1).copied().unwrap_or(body.end);
                let last = (first..next)
                    .rev()
                    .find(|&idx| {
                        let line = &self.lines[idx];
                        !line.is_blank() && (line.is_content() || line.indent() > child_indent)
                    })
                    .unwrap_or(first);
                Entry { first, last }
            })
            .collect()
    }

    /// Deletes the continuation lines of a value collapsed onto its first line.
    ///
    /// Comment and blank lines inside the entry are kept.
    fn drop_continuation(&self, entry: Entry) -> Vec<Edit> {
        (entry.first + 1..=entry.last)
            .filter(|&idx| self.lines[idx].is_content())
            .map(|idx| Edit {
                range: self.lines[idx - 1].end()..self.lines[idx].end(),
                text: String::new(),
            })
            .collect()
    }

    /// Inserts `text` right after the last entry, before its line ending.
    fn insert_after(&self, entries: &[Entry], text: String) -> Edit {
        let end = entries
            .last()
            .map_or(self.source.len(), |entry| self.lines[entry.last].end());
        Edit {
            range: end..end,
            text,
        }
    }
}

/// Reads the document root, treating an empty document as an empty mapping.
fn parse_root(source: &str) -> PatchResult<Mapping> {
    if !split_lines(source).iter().any(Line::is_content) {
        return Ok(Mapping::new());
    }

    match serde_yaml::from_str::<Value>(source)? {
        Value::Mapping(mapping) => Ok(mapping),
        Value::Null => Ok(Mapping::new()),
        _ => Err(PatchError::RootNotAMapping),
    }
}

fn lookup<'m>(mapping: &'m Mapping, name: &str) -> Option<&'m Value> {
    mapping
        .iter()
        .find(|(key, _)| key.as_str() == Some(name))
        .map(|(_, value)| value)
}

fn without(mapping: &Mapping, name: &str) -> Mapping {
    mapping
        .iter()
        .filter(|(key, _)| key.as_str() != Some(name))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Splits leading anchors and tags (`&env`, `!!map`) off an inline value.
fn split_properties(inline: &str) -> (&str, &str) {
    let mut rest = inline;
    while rest.starts_with(['&', '!']) {
        let end = rest.find([' ', '\t']).unwrap_or(rest.len());
        rest = rest[end..].trim_start();
    }
    let props = inline[..inline.len() - rest.len()].trim_end();
    (props, rest)
}

fn is_null_literal(s: &str) -> bool {
    matches!(s, "~" | "null" | "Null" | "NULL")
}

fn apply_edits(source: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by_key(|edit| Reverse(edit.range.start));
    let mut text = source.to_string();
    for edit in edits {
        text.replace_range(edit.range, &edit.text);
    }
    text
}

/// Sets `environment.VERSION` to `version` in a YAML document.
///
/// # Errors
///
/// See [`EnvPatch::apply`].
pub fn patch_environment(source: &str, version: &str) -> PatchResult<Patched> {
    EnvPatch::default().apply(source, version)
}

/// Patches the YAML file at `path` in place.
///
/// The file is only rewritten when `write` is set and the text changed.
///
/// # Errors
///
/// Returns an error if the file is missing, unreadable, not valid YAML, or
/// cannot be patched.
pub fn patch_file(
    path: &Path,
    patch: &EnvPatch,
    version: &str,
    write: bool,
) -> CoreResult<PatchOutcome> {
    if !path.exists() {
        return Err(CoreError::TargetNotFound(path.to_path_buf()));
    }

    let source = fs::read_to_string(path)?;
    let patched = patch
        .apply(&source, version)
        .map_err(|source| CoreError::Patch {
            path: path.to_path_buf(),
            source,
        })?;

    let written = write && patched.kind != PatchKind::Unchanged;
    if written {
        fs::write(path, &patched.text)?;
        info!(?path, kind = %patched.kind, "wrote patched config");
    } else {
        debug!(?path, kind = %patched.kind, write, "config left untouched");
    }

    Ok(PatchOutcome {
        path: path.to_path_buf(),
        kind: patched.kind,
        written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn patch(source: &str) -> Patched {
        patch_environment(source, "1.2.3").unwrap()
    }

    fn read(text: &str) -> Mapping {
        parse_root(text).unwrap()
    }

    #[test]
    fn test_absent_section_is_appended() {
        let source = "name: confkit\nimage: app:latest\n";
        let patched = patch(source);

        assert_eq!(patched.kind, PatchKind::Created);
        assert_eq!(
            patched.text,
            "name: confkit\nimage: app:latest\nenvironment:\n  VERSION: 1.2.3\n"
        );

        let root = read(&patched.text);
        let env = lookup(&root, "environment").unwrap().as_mapping().unwrap();
        assert_eq!(env.len(), 1);
        assert_eq!(lookup(env, "VERSION").unwrap().as_str(), Some("1.2.3"));
    }

    #[test]
    fn test_absent_section_without_trailing_newline() {
        assert_eq!(
            patch("name: x").text,
            "name: x\nenvironment:\n  VERSION: 1.2.3\n"
        );
    }

    #[test]
    fn test_absent_section_uses_document_indent() {
        let source = "services:\n    web:\n        image: nginx\n";
        assert_eq!(
            patch(source).text,
            "services:\n    web:\n        image: nginx\nenvironment:\n    VERSION: 1.2.3\n"
        );
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(patch("").text, "environment:\n  VERSION: 1.2.3\n");
        assert_eq!(
            patch("# nothing yet\n").text,
            "# nothing yet\nenvironment:\n  VERSION: 1.2.3\n"
        );
    }

    #[test]
    fn test_null_section_is_filled() {
        let patched = patch("environment:\nname: x\n");
        assert_eq!(patched.kind, PatchKind::Created);
        assert_eq!(patched.text, "environment:\n  VERSION: 1.2.3\nname: x\n");
    }

    #[test]
    fn test_explicit_null_keeps_comment() {
        assert_eq!(
            patch("environment: ~ # fill me\n").text,
            "environment: # fill me\n  VERSION: 1.2.3\n"
        );
        assert_eq!(
            patch("environment: null\n").text,
            "environment:\n  VERSION: 1.2.3\n"
        );
    }

    #[test]
    fn test_existing_keys_survive_insert() {
        let source = r#"# deploy config
name: confkit  # app name
environment:
  DEBUG: "1"
  LOG_LEVEL: 'info'
volumes:
  - data:/data
"#;
        let patched = patch(source);

        assert_eq!(patched.kind, PatchKind::Inserted);
        assert_eq!(
            patched.text,
            r#"# deploy config
name: confkit  # app name
environment:
  DEBUG: "1"
  LOG_LEVEL: 'info'
  VERSION: 1.2.3
volumes:
  - data:/data
"#
        );
    }

    #[test]
    fn test_existing_value_is_replaced_in_place() {
        let source = "environment:\n  VERSION: \"0.9.0\"  # managed by release\n  DEBUG: \"1\"\n";
        let patched = patch(source);

        assert_eq!(patched.kind, PatchKind::Replaced);
        assert_eq!(
            patched.text,
            "environment:\n  VERSION: \"1.2.3\"  # managed by release\n  DEBUG: \"1\"\n"
        );
    }

    #[test]
    fn test_single_quotes_are_kept() {
        assert_eq!(
            patch("environment:\n  VERSION: '0.1.0'\n").text,
            "environment:\n  VERSION: '1.2.3'\n"
        );
    }

    #[test]
    fn test_empty_value_is_replaced() {
        assert_eq!(
            patch("environment:\n  VERSION:\n  DEBUG: \"1\"\n").text,
            "environment:\n  VERSION: 1.2.3\n  DEBUG: \"1\"\n"
        );
    }

    #[test]
    fn test_block_scalar_value_is_collapsed() {
        let source = "environment:\n  VERSION: |\n    0.1.0\n  DEBUG: \"1\"\n";
        assert_eq!(
            patch(source).text,
            "environment:\n  VERSION: 1.2.3\n  DEBUG: \"1\"\n"
        );
    }

    #[test]
    fn test_insert_after_nested_entry() {
        let source = "environment:\n  # injected at deploy\n  NESTED:\n    A: 1\n\nports: []\n";
        assert_eq!(
            patch(source).text,
            "environment:\n  # injected at deploy\n  NESTED:\n    A: 1\n  VERSION: 1.2.3\n\nports: []\n"
        );
    }

    #[test]
    fn test_patching_twice_is_idempotent() {
        let sources = [
            "name: x\n",
            "environment:\n",
            "environment:\n  DEBUG: \"1\"\n",
            "environment: {DEBUG: \"1\"}\n",
            "environment:\n  - DEBUG=1\n",
        ];

        for source in sources {
            let once = patch(source);
            let twice = patch(&once.text);
            assert_eq!(twice.text, once.text, "source: {source:?}");
            assert_eq!(twice.kind, PatchKind::Unchanged, "source: {source:?}");
        }
    }

    #[test]
    fn test_only_target_line_changes() {
        let source = "# header\n\nname: 'confkit'   # quoted\nenvironment:\n  DEBUG: \"1\"\n  VERSION: 0.0.1\n\n# trailing\nports:\n  - \"8080:80\"\n";
        let patched = patch(source);

        let before: Vec<&str> = source.lines().collect();
        let after: Vec<&str> = patched.text.lines().collect();
        assert_eq!(before.len(), after.len());

        let changed: Vec<(&str, &str)> = before
            .iter()
            .zip(&after)
            .filter(|(a, b)| a != b)
            .map(|(a, b)| (*a, *b))
            .collect();
        assert_eq!(changed, vec![("  VERSION: 0.0.1", "  VERSION: 1.2.3")]);
    }

    #[test]
    fn test_comment_under_value_survives() {
        let source = "environment:\n  VERSION: 0.9.0\n    # keep this note\n  DEBUG: \"1\"\n";
        let patched = patch(source);

        assert_eq!(patched.kind, PatchKind::Replaced);
        assert_eq!(
            patched.text,
            "environment:\n  VERSION: 1.2.3\n    # keep this note\n  DEBUG: \"1\"\n"
        );
    }

    #[test]
    fn test_collapsed_value_keeps_comments() {
        let source = "environment:\n  VERSION:\n    0.9.0\n    # stamped by ci\n  DEBUG: \"1\"\n";
        assert_eq!(
            patch(source).text,
            "environment:\n  VERSION: 1.2.3\n    # stamped by ci\n  DEBUG: \"1\"\n"
        );
    }

    #[test]
    fn test_sequence_item_comment_survives() {
        let source = "environment:\n  - VERSION=0.1.0\n    # pinned\n  - DEBUG=1\n";
        assert_eq!(
            patch(source).text,
            "environment:\n  - VERSION=1.2.3\n    # pinned\n  - DEBUG=1\n"
        );
    }

    #[test]
    fn test_sequence_reads_back() {
        let patched = patch("environment:\n  - DEBUG=1\n");

        let root = read(&patched.text);
        let items: Vec<&str> = lookup(&root, "environment")
            .unwrap()
            .as_sequence()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(items, vec!["DEBUG=1", "VERSION=1.2.3"]);
    }

    #[test]
    fn test_section_goes_before_end_marker() {
        let patched = patch("name: x\n...\n");
        assert_eq!(patched.kind, PatchKind::Created);
        assert_eq!(patched.text, "name: x\nenvironment:\n  VERSION: 1.2.3\n...\n");

        let again = patch(&patched.text);
        assert_eq!(again.kind, PatchKind::Unchanged);
    }

    #[test]
    fn test_flow_mapping() {
        assert_eq!(
            patch("environment: {DEBUG: \"1\"}  # inline\n").text,
            "environment: {DEBUG: \"1\", VERSION: 1.2.3}  # inline\n"
        );
        assert_eq!(
            patch("environment: {}\n").text,
            "environment: {VERSION: 1.2.3}\n"
        );
    }

    #[test]
    fn test_sequence_item_is_replaced() {
        let source = "environment:\n  - DEBUG=1\n  - VERSION=0.1.0 # bumped\n";
        let patched = patch(source);
        assert_eq!(patched.kind, PatchKind::Replaced);
        assert_eq!(
            patched.text,
            "environment:\n  - DEBUG=1\n  - VERSION=1.2.3 # bumped\n"
        );
    }

    #[test]
    fn test_compact_sequence_item_is_appended() {
        let source = "environment:\n- DEBUG=1\nports: []\n";
        assert_eq!(
            patch(source).text,
            "environment:\n- DEBUG=1\n- VERSION=1.2.3\nports: []\n"
        );
    }

    #[test]
    fn test_crlf_line_endings() {
        let source = "name: x\r\nenvironment:\r\n  DEBUG: \"1\"\r\n";
        assert_eq!(
            patch(source).text,
            "name: x\r\nenvironment:\r\n  DEBUG: \"1\"\r\n  VERSION: 1.2.3\r\n"
        );
    }

    #[test]
    fn test_float_like_version_is_quoted() {
        let patched = patch_environment("", "1.0").unwrap();
        assert_eq!(patched.text, "environment:\n  VERSION: \"1.0\"\n");

        let root = read(&patched.text);
        let env = lookup(&root, "environment").unwrap().as_mapping().unwrap();
        assert_eq!(lookup(env, "VERSION").unwrap().as_str(), Some("1.0"));
    }

    #[test]
    fn test_custom_section_and_key() {
        let patch = EnvPatch::new("env", "APP_VERSION");
        assert_eq!(patch.section(), "env");
        assert_eq!(patch.key(), "APP_VERSION");

        let patched = patch.apply("env:\n  A: b\n", "2.0.0").unwrap();
        assert_eq!(patched.text, "env:\n  A: b\n  APP_VERSION: 2.0.0\n");
    }

    #[test]
    fn test_scalar_section_is_rejected() {
        let err = patch_environment("environment: production\n", "1.2.3").unwrap_err();
        assert!(matches!(err, PatchError::SectionNotAMapping(ref s) if s == "environment"));
    }

    #[test]
    fn test_non_mapping_root_is_rejected() {
        let err = patch_environment("- a\n- b\n", "1.2.3").unwrap_err();
        assert!(matches!(err, PatchError::RootNotAMapping));
    }

    #[test]
    fn test_invalid_yaml_is_rejected() {
        let err = patch_environment("a: [1, 2\n", "1.2.3").unwrap_err();
        assert!(matches!(err, PatchError::Parse(_)));
    }

    #[test]
    fn test_alias_section_is_rejected() {
        let err = patch_environment("base: &b {A: 1}\nenvironment: *b\n", "1.2.3").unwrap_err();
        assert!(matches!(err, PatchError::UnsupportedLayout { .. }));
    }

    #[test]
    fn test_split_properties() {
        assert_eq!(split_properties("&env {A: 1}"), ("&env", "{A: 1}"));
        assert_eq!(split_properties("!!map &a"), ("!!map &a", ""));
        assert_eq!(split_properties("{A: 1}"), ("", "{A: 1}"));
    }

    #[test]
    fn test_patch_kind_display() {
        assert_eq!(PatchKind::Created.to_string(), "created");
        assert_eq!(PatchKind::Inserted.to_string(), "added");
        assert_eq!(PatchKind::Replaced.to_string(), "updated");
        assert_eq!(PatchKind::Unchanged.to_string(), "unchanged");
    }

    #[test]
    fn test_patch_file_writes_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("engine.yml");
        fs::write(&path, "name: confkit\n").unwrap();

        let first = patch_file(&path, &EnvPatch::default(), "1.2.3", true).unwrap();
        assert!(first.written);
        assert_eq!(first.kind, PatchKind::Created);
        let after_first = fs::read_to_string(&path).unwrap();

        let second = patch_file(&path, &EnvPatch::default(), "1.2.3", true).unwrap();
        assert!(!second.written);
        assert_eq!(second.kind, PatchKind::Unchanged);
        assert_eq!(fs::read_to_string(&path).unwrap(), after_first);
    }

    #[test]
    fn test_patch_file_dry_run_leaves_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("engine.yml");
        fs::write(&path, "name: confkit\n").unwrap();

        let outcome = patch_file(&path, &EnvPatch::default(), "1.2.3", false).unwrap();
        assert!(!outcome.written);
        assert_eq!(outcome.kind, PatchKind::Created);
        assert_eq!(fs::read_to_string(&path).unwrap(), "name: confkit\n");
    }

    #[test]
    fn test_patch_file_missing() {
        let result = patch_file(
            Path::new("/nonexistent/engine.yml"),
            &EnvPatch::default(),
            "1.2.3",
            true,
        );
        assert!(matches!(result, Err(CoreError::TargetNotFound(_))));
    }

    #[test]
    fn test_patch_file_invalid_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("engine.yml");
        fs::write(&path, "environment: [unclosed\n").unwrap();

        let result = patch_file(&path, &EnvPatch::default(), "1.2.3", true);
        assert!(matches!(
            result,
            Err(CoreError::Patch {
                source: PatchError::Parse(_),
                ..
            })
        ));
    }
}
