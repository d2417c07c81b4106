// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Desktop entry file handling.
//!
//! Desktop entry files are user and system artifacts that other tools parse,
//! so Deskmend treats them with care. A file is read into an [`EntryFile`]
//! that remembers every line exactly as it was written: comments, blank
//! lines, group order, key order, key casing, and line endings. Values are
//! raw strings, meaning field codes like `%f` or `%U` are never interpreted.
//!
//! Editing a value only touches the line holding that value. Everything else
//! is serialized back byte for byte.
//!
//! # See Also
//!
//! - [Desktop Entry Specification](https://specifications.freedesktop.org/desktop-entry-spec/latest/)

use std::{
    collections::HashSet,
    fmt::{Display, Formatter, Result as FmtResult},
};

/// Name of the group every desktop entry must have.
pub const DESKTOP_ENTRY: &str = "Desktop Entry";

/// Outcome of parsing a candidate desktop entry file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    /// Structurally sound, and has the desktop entry group with all required
    /// keys.
    Valid(EntryFile),

    /// Not a structured key-value file at all.
    Malformed(Malformed),

    /// Structurally sound, but lacks the desktop entry group or one of the
    /// required keys.
    NotDesktopEntry,
}

/// Desktop entry file editor.
///
/// # Invariant
///
/// - Serializing an unedited file reproduces its input exactly.
/// - No duplicate groups, and no duplicate keys within a group.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EntryFile {
    rows: Vec<Row>,
    changed: bool,
}

impl EntryFile {
    /// Parse desktop entry file content, requiring the desktop entry group to
    /// contain each key in `required`.
    pub fn parse(content: &str, required: &[&str]) -> Parsed {
        let file = match Self::parse_structure(content) {
            Ok(file) => file,
            Err(malformed) => return Parsed::Malformed(malformed),
        };

        let complete = file.has_group(DESKTOP_ENTRY)
            && required
                .iter()
                .all(|key| file.get(DESKTOP_ENTRY, key).is_some());

        if complete {
            Parsed::Valid(file)
        } else {
            Parsed::NotDesktopEntry
        }
    }

    /// Parse content into rows without checking for any particular group.
    ///
    /// # Errors
    ///
    /// - Return [`Malformed`] if content is not a group-based key-value file.
    pub fn parse_structure(content: &str) -> Result<Self, Malformed> {
        let mut rows = Vec::new();
        let mut groups = HashSet::new();
        let mut keys = HashSet::new();
        let mut current: Option<String> = None;

        for (index, raw) in content.split_inclusive('\n').enumerate() {
            let number = index + 1;
            let (text, eol) = split_eol(raw);
            let trimmed = text.trim();

            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
                rows.push(Row::new(Line::Verbatim { text: text.into() }, eol));
                continue;
            }

            if trimmed.starts_with('[') {
                if !trimmed.ends_with(']') || trimmed.len() < 2 {
                    return Err(Malformed::InvalidLine { number });
                }

                let name = trimmed[1..trimmed.len() - 1].to_string();
                if !groups.insert(name.clone()) {
                    return Err(Malformed::DuplicateGroup { name });
                }

                keys.clear();
                current = Some(name.clone());
                rows.push(Row::new(
                    Line::Header {
                        text: text.into(),
                        name,
                    },
                    eol,
                ));
                continue;
            }

            let Some(group) = &current else {
                return Err(Malformed::MissingGroupHeader { number });
            };

            let pair = Pair::parse(text).ok_or(Malformed::InvalidLine { number })?;
            if !keys.insert(pair.key.clone()) {
                return Err(Malformed::DuplicateKey {
                    group: group.clone(),
                    key: pair.key,
                });
            }

            rows.push(Row::new(Line::Pair(pair), eol));
        }

        Ok(Self {
            rows,
            changed: false,
        })
    }

    /// Check if group exists.
    pub fn has_group(&self, group: impl AsRef<str>) -> bool {
        self.rows.iter().any(|row| row.group_name() == Some(group.as_ref()))
    }

    /// Get raw value of key in group.
    pub fn get(&self, group: impl AsRef<str>, key: impl AsRef<str>) -> Option<&str> {
        let (start, end) = self.group_span(group.as_ref())?;
        self.rows[start..end].iter().find_map(|row| match &row.line {
            Line::Pair(pair) if pair.key == key.as_ref() => Some(pair.value.as_str()),
            _ => None,
        })
    }

    /// Set raw value of existing key in group.
    ///
    /// The key keeps its position, spelling, and separator. Return false if
    /// the group or key does not exist, leaving the file untouched.
    pub fn set(
        &mut self,
        group: impl AsRef<str>,
        key: impl AsRef<str>,
        value: impl Into<String>,
    ) -> bool {
        let Some((start, end)) = self.group_span(group.as_ref()) else {
            return false;
        };

        let Some(pair) = self.rows[start..end]
            .iter_mut()
            .find_map(|row| match &mut row.line {
                Line::Pair(pair) if pair.key == key.as_ref() => Some(pair),
                _ => None,
            })
        else {
            return false;
        };

        let value = value.into();
        if pair.value != value {
            pair.value = value;
            self.changed = true;
        }

        true
    }

    /// Check if any value was edited since parsing.
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Row range `[header, next header)` of a group.
    fn group_span(&self, group: &str) -> Option<(usize, usize)> {
        let start = self
            .rows
            .iter()
            .position(|row| row.group_name() == Some(group))?;
        let end = self.rows[start + 1..]
            .iter()
            .position(|row| row.group_name().is_some())
            .map(|offset| start + 1 + offset)
            .unwrap_or(self.rows.len());

        Some((start, end))
    }
}

impl Display for EntryFile {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        for row in &self.rows {
            match &row.line {
                Line::Verbatim { text } | Line::Header { text, .. } => fmt.write_str(text)?,
                Line::Pair(pair) => {
                    fmt.write_str(&pair.head)?;
                    fmt.write_str(&pair.value)?;
                    fmt.write_str(&pair.tail)?;
                }
            }
            fmt.write_str(row.eol)?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Row {
    line: Line,
    eol: &'static str,
}

impl Row {
    fn new(line: Line, eol: &'static str) -> Self {
        Self { line, eol }
    }

    fn group_name(&self) -> Option<&str> {
        match &self.line {
            Line::Header { name, .. } => Some(name.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    /// Blank line or comment.
    Verbatim { text: String },
    Header { text: String, name: String },
    Pair(Pair),
}

/// Key-value line split into `head` (key, separator, and leading space of
/// the value), the value itself, and trailing whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Pair {
    key: String,
    head: String,
    value: String,
    tail: String,
}

impl Pair {
    fn parse(text: &str) -> Option<Self> {
        let eq = text.find('=')?;
        let key = text[..eq].trim();
        if key.is_empty() {
            return None;
        }

        let after = &text[eq + 1..];
        let value_start = eq + 1 + (after.len() - after.trim_start().len());
        let rest = &text[value_start..];
        let value = rest.trim_end();

        Some(Self {
            key: key.to_string(),
            head: text[..value_start].to_string(),
            value: value.to_string(),
            tail: rest[value.len()..].to_string(),
        })
    }
}

fn split_eol(raw: &str) -> (&str, &'static str) {
    if let Some(text) = raw.strip_suffix("\r\n") {
        (text, "\r\n")
    } else if let Some(text) = raw.strip_suffix('\n') {
        (text, "\n")
    } else {
        (raw, "")
    }
}

/// Reasons content is not a group-based key-value file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Malformed {
    /// Key-value pair appears before any group header.
    #[error("line {number} is outside of any group")]
    MissingGroupHeader { number: usize },

    /// Line is neither a comment, a group header, nor a key-value pair.
    #[error("line {number} is not a comment, group header, or key-value pair")]
    InvalidLine { number: usize },

    /// Group header appears more than once.
    #[error("duplicate group [{name}]")]
    DuplicateGroup { name: String },

    /// Key appears more than once in the same group.
    #[error("duplicate key {key:?} in group [{group}]")]
    DuplicateKey { group: String, key: String },

    /// Content is not valid UTF-8.
    #[error("content is not valid UTF-8")]
    InvalidUtf8,
}
