//! Human-authored annotation overlay.
//!
//! Annotations are loaded from a properties file with dotted keys:
//!
//! ```text
//! schema.name = Shop database
//! schema.notes = <p>Everything the storefront persists.</p>
//! table.customers.shortdesc = People who buy things
//! table.customers.notes = <p>Rows are never deleted, \
//!     only anonymised.</p>
//! table.orders.column.customer_id.shortdesc = Who placed the order
//! table.orders.index.orders_customer_idx.shortdesc = Order history lookups
//! ```
//!
//! Values are trusted markup and are emitted without escaping.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnnotationError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: invalid \\u escape")]
    InvalidEscape { line: usize },
}

/// Canonical annotation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationKey<'a> {
    SchemaName,
    SchemaNotes,
    TableShortDesc(&'a str),
    TableNotes(&'a str),
    ColumnShortDesc { table: &'a str, column: &'a str },
    IndexShortDesc { table: &'a str, index: &'a str },
}

impl fmt::Display for AnnotationKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SchemaName => f.write_str("schema.name"),
            Self::SchemaNotes => f.write_str("schema.notes"),
            Self::TableShortDesc(table) => write!(f, "table.{}.shortdesc", table),
            Self::TableNotes(table) => write!(f, "table.{}.notes", table),
            Self::ColumnShortDesc { table, column } => {
                write!(f, "table.{}.column.{}.shortdesc", table, column)
            }
            Self::IndexShortDesc { table, index } => {
                write!(f, "table.{}.index.{}.shortdesc", table, index)
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotations {
    values: HashMap<String, String>,
}

impl Annotations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, AnnotationError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| AnnotationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, AnnotationError> {
        let mut values = HashMap::new();
        for (line, logical) in logical_lines(text) {
            let (key, value) = split_entry(&logical);
            values.insert(unescape(key, line)?, unescape(value, line)?);
        }
        Ok(Self { values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value for `key`, or `default` when the key is absent.
    ///
    /// An empty value counts as present.
    pub fn get<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.values.get(key).map(String::as_str).unwrap_or(default)
    }

    pub fn lookup<'a>(&'a self, key: &AnnotationKey<'_>, fallback: &'a str) -> &'a str {
        self.get(&key.to_string(), fallback)
    }

    /// Value for an optional document section: present and non-empty.
    pub fn section(&self, key: &AnnotationKey<'_>) -> Option<&str> {
        self.values
            .get(&key.to_string())
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Annotations {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Joins continuation lines and drops blanks and comments.
///
/// Yields the 1-based number of each entry's first physical line.
fn logical_lines(text: &str) -> Vec<(usize, String)> {
    let mut entries = Vec::new();
    let mut current: Option<(usize, String)> = None;

    for (idx, raw) in text.lines().enumerate() {
        let trimmed = raw.trim_start();
        let continues = ends_with_odd_backslashes(trimmed);
        let body = if continues { &trimmed[..trimmed.len() - 1] } else { trimmed };

        match current.as_mut() {
            Some((_, buf)) => buf.push_str(body),
            None => {
                if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                    continue;
                }
                current = Some((idx + 1, body.to_string()));
            }
        }

        if !continues {
            entries.extend(current.take());
        }
    }
    entries.extend(current);
    entries
}

fn ends_with_odd_backslashes(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

/// Splits at the first unescaped `=`, `:` or whitespace.
fn split_entry(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => {
                key_end = i;
                break;
            }
            c if c.is_whitespace() => {
                key_end = i;
                break;
            }
            _ => {}
        }
    }

    let key = &line[..key_end];
    let mut rest = line[key_end..].trim_start();
    if let Some(stripped) = rest.strip_prefix(['=', ':']) {
        rest = stripped.trim_start();
    }
    (key, rest)
}

fn unescape(s: &str, line: usize) -> Result<String, AnnotationError> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{000C}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let ch = u32::from_str_radix(&hex, 16)
                    .ok()
                    .filter(|_| hex.len() == 4)
                    .and_then(char::from_u32)
                    .ok_or(AnnotationError::InvalidEscape { line })?;
                out.push(ch);
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    Ok(out)
}
