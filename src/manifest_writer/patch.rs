//! In-place patching of constant assignments.
//!
//! A patch target holds three assignments, located by anchor name:
//!
//! ```python
//! VERSION = "0.1.30888"
//! RELEASES_BASE_URL = "https://github.com/CircleCI-Public/circleci-cli/releases/download"
//! ARCHIVE_SHA256 = {
//!     "darwin_amd64": ("circleci-cli_0.1.30888_darwin_amd64.tar.gz", "eb56..."),
//! }
//! ```
//!
//! Only the string literals and the `{ ... }` mapping literal are replaced;
//! every other byte of the file is kept. [`read_patched_state`] recovers the
//! [`ManifestState`] from a patched file so writes can be verified.

use super::scanner::{ScanError, Token, TokenKind, quote_string, string_value, tokenize};
use crate::config::PatchTarget;
use circleci_mirror_common::{
    ArchiveKey, ChecksumEntry, ChecksumMap, ManifestState, ModelError, Sha256Digest, Version,
};
use std::ops::Range;

/// Indentation added for each mapping entry.
const ENTRY_INDENT: &str = "    ";

/// Errors arising from patching or reading a patch target.
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    /// The file could not be tokenised.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// No assignment to the anchor was found.
    #[error("no assignment to {anchor} found")]
    AnchorNotFound {
        /// The anchor name.
        anchor: String,
    },

    /// The anchor is assigned more than once.
    #[error("{anchor} is assigned more than once")]
    AmbiguousAnchor {
        /// The anchor name.
        anchor: String,
    },

    /// The assigned value has the wrong shape.
    #[error("{anchor} must be assigned {expected}")]
    UnexpectedValue {
        /// The anchor name.
        anchor: String,
        /// Description of the expected value.
        expected: &'static str,
    },

    /// The mapping literal never closes.
    #[error("mapping assigned to {anchor} is not closed")]
    UnbalancedMapping {
        /// The anchor name.
        anchor: String,
    },

    /// A mapping entry could not be read.
    #[error("invalid entry in {anchor}: {reason}")]
    InvalidEntry {
        /// The anchor name.
        anchor: String,
        /// What was wrong with the entry.
        reason: String,
    },

    /// A recovered value was rejected by the data model.
    #[error(transparent)]
    Model(#[from] ModelError),
}

type Result<T> = std::result::Result<T, PatchError>;

/// Byte spans of the three anchored values in one file.
struct AnchorSpans {
    version: Range<usize>,
    base_url: Range<usize>,
    archives: Range<usize>,
}

impl AnchorSpans {
    fn locate(source: &str, tokens: &[Token], target: &PatchTarget) -> Result<Self> {
        Ok(Self {
            version: string_span(source, tokens, &target.version_anchor)?,
            base_url: string_span(source, tokens, &target.base_url_anchor)?,
            archives: mapping_span(source, tokens, &target.archives_anchor)?,
        })
    }
}

/// Replace the anchored values in `source` with those of `state`.
///
/// # Errors
///
/// Returns [`PatchError`] if the file does not tokenise or an anchor is
/// missing, duplicated or assigned a value of the wrong shape.
pub fn patch_source(source: &str, target: &PatchTarget, state: &ManifestState) -> Result<String> {
    let tokens = tokenize(source)?;
    let spans = AnchorSpans::locate(source, &tokens, target)?;

    let version = requote(source, &spans.version, &state.version().to_string());
    let base_url = requote(source, &spans.base_url, state.base_url());
    let archives = render_mapping(state, line_indent(source, spans.archives.start));
    let mut edits = [
        (spans.version, version),
        (spans.base_url, base_url),
        (spans.archives, archives),
    ];
    edits.sort_by_key(|(span, _)| span.start);

    let mut patched = String::with_capacity(source.len());
    let mut cursor = 0;
    for (span, replacement) in edits {
        patched.push_str(source.get(cursor..span.start).unwrap_or_default());
        patched.push_str(&replacement);
        cursor = span.end;
    }
    patched.push_str(source.get(cursor..).unwrap_or_default());
    Ok(patched)
}

/// Recover the manifest state recorded in a patched file.
///
/// # Errors
///
/// Returns [`PatchError`] if an anchor is missing or malformed, or the
/// recovered values are not a complete manifest.
pub fn read_patched_state(source: &str, target: &PatchTarget) -> Result<ManifestState> {
    let tokens = tokenize(source)?;
    let spans = AnchorSpans::locate(source, &tokens, target)?;

    let version = Version::parse(&literal_at(source, &spans.version))?;
    let base_url = literal_at(source, &spans.base_url);
    let inner: Vec<&Token> = tokens
        .iter()
        .filter(|t| t.span.start > spans.archives.start && t.span.end < spans.archives.end)
        .collect();
    let archives = parse_mapping(source, &inner, &target.archives_anchor)?;
    Ok(ManifestState::new(version, base_url, archives)?)
}

/// Find the index of the value token assigned to `anchor`.
///
/// Keyword arguments (`f(NAME=...)`), attributes (`x.NAME = ...`) and
/// comparisons (`NAME == ...`) are not assignments.
fn assignment_value(source: &str, tokens: &[Token], anchor: &str) -> Result<usize> {
    let mut found = None;
    for (index, window) in tokens.windows(3).enumerate() {
        let [name, eq, value] = window else {
            continue;
        };
        let in_expression = index
            .checked_sub(1)
            .and_then(|prev| tokens.get(prev))
            .is_some_and(|prev| prev.is_punct('.') || prev.is_punct('(') || prev.is_punct(','));
        let is_assignment = name.kind == TokenKind::Ident
            && name.text(source) == anchor
            && eq.is_punct('=')
            && !value.is_punct('=')
            && !in_expression;
        if !is_assignment {
            continue;
        }
        if found.is_some() {
            return Err(PatchError::AmbiguousAnchor {
                anchor: anchor.to_owned(),
            });
        }
        found = Some(index + 2);
    }
    found.ok_or_else(|| PatchError::AnchorNotFound {
        anchor: anchor.to_owned(),
    })
}

fn string_span(source: &str, tokens: &[Token], anchor: &str) -> Result<Range<usize>> {
    let index = assignment_value(source, tokens, anchor)?;
    match tokens.get(index) {
        Some(token) if token.kind == TokenKind::Str => Ok(token.span.clone()),
        _ => Err(PatchError::UnexpectedValue {
            anchor: anchor.to_owned(),
            expected: "a string literal",
        }),
    }
}

/// Return the span from the opening `{` to its matching `}` inclusive.
fn mapping_span(source: &str, tokens: &[Token], anchor: &str) -> Result<Range<usize>> {
    let index = assignment_value(source, tokens, anchor)?;
    let open = match tokens.get(index) {
        Some(token) if token.is_punct('{') => token,
        _ => {
            return Err(PatchError::UnexpectedValue {
                anchor: anchor.to_owned(),
                expected: "a mapping literal",
            });
        }
    };

    let mut depth = 0_usize;
    for token in tokens.iter().skip(index) {
        if token.is_punct('{') {
            depth += 1;
        } else if token.is_punct('}') {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return Ok(open.span.start..token.span.end);
            }
        }
    }
    Err(PatchError::UnbalancedMapping {
        anchor: anchor.to_owned(),
    })
}

fn literal_at(source: &str, span: &Range<usize>) -> String {
    string_value(source.get(span.clone()).unwrap_or_default())
}

/// Render `value` with the quote character of the literal at `span`.
fn requote(source: &str, span: &Range<usize>, value: &str) -> String {
    let quote = source
        .get(span.clone())
        .and_then(|literal| literal.chars().next())
        .unwrap_or('"');
    quote_string(value, quote)
}

/// Return the leading whitespace of the line containing `offset`.
fn line_indent(source: &str, offset: usize) -> &str {
    let line_start = source
        .get(..offset)
        .and_then(|before| before.rfind('\n'))
        .map_or(0, |newline| newline + 1);
    let line = source.get(line_start..).unwrap_or_default();
    let width = line.len() - line.trim_start_matches([' ', '\t']).len();
    line.get(..width).unwrap_or_default()
}

/// Render the archive mapping, one entry per line.
fn render_mapping(state: &ManifestState, indent: &str) -> String {
    let mut rendered = String::from("{\n");
    for (key, entry) in state.archives() {
        rendered.push_str(&format!(
            "{indent}{ENTRY_INDENT}{}: ({}, {}),\n",
            quote_string(&key.to_string(), '"'),
            quote_string(&entry.filename, '"'),
            quote_string(entry.sha256.as_str(), '"'),
        ));
    }
    rendered.push_str(indent);
    rendered.push('}');
    rendered
}

/// Parse the tokens between the braces of an archive mapping.
///
/// Accepts `"<key>": ("<filename>", "<sha256>")` entries separated by
/// commas, with optional trailing commas in both the tuple and the mapping.
fn parse_mapping(source: &str, tokens: &[&Token], anchor: &str) -> Result<ChecksumMap> {
    let invalid = |reason: String| PatchError::InvalidEntry {
        anchor: anchor.to_owned(),
        reason,
    };
    let mut archives = ChecksumMap::new();
    let mut rest = tokens;

    while !rest.is_empty() {
        let (key_text, filename, digest, remaining) = match rest {
            [key, colon, open, filename, comma, digest, tail @ ..]
                if key.kind == TokenKind::Str
                    && colon.is_punct(':')
                    && open.is_punct('(')
                    && filename.kind == TokenKind::Str
                    && comma.is_punct(',')
                    && digest.kind == TokenKind::Str =>
            {
                (
                    string_value(key.text(source)),
                    string_value(filename.text(source)),
                    string_value(digest.text(source)),
                    tail,
                )
            }
            [first, ..] => {
                return Err(invalid(format!(
                    "expected \"<os>_<arch>\": (\"<filename>\", \"<sha256>\") near {}",
                    first.text(source)
                )));
            }
            [] => break,
        };
        let remaining = skip_punct(remaining, ',');
        let Some((close, after)) = remaining.split_first() else {
            return Err(invalid(format!("entry {key_text} is not closed")));
        };
        if !close.is_punct(')') {
            return Err(invalid(format!("entry {key_text} has extra values")));
        }
        rest = skip_punct(after, ',');

        let key: ArchiveKey = key_text.parse()?;
        let sha256 = Sha256Digest::try_from(digest)?;
        if archives.insert(key, ChecksumEntry::new(filename, sha256)).is_some() {
            return Err(invalid(format!("duplicate entry {key}")));
        }
    }
    Ok(archives)
}

fn skip_punct<'t, 'a>(tokens: &'t [&'a Token], c: char) -> &'t [&'a Token] {
    match tokens.split_first() {
        Some((first, rest)) if first.is_punct(c) => rest,
        _ => tokens,
    }
}

#[cfg(test)]
#[path = "patch_tests.rs"]
mod tests;
