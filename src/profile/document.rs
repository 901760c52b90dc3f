//! Order-preserving model of the AWS CLI config file
//!
//! Every line that is not explicitly changed is re-emitted exactly as read,
//! so comments, spacing and nested settings of untouched sections survive a
//! rewrite.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("line {line}: key/value pair outside of any [section]")]
    MissingSection { line: usize },

    #[error("line {line}: malformed section header: {content}")]
    MalformedHeader { line: usize, content: String },

    #[error("line {line}: expected `key = value`: {content}")]
    InvalidLine { line: usize, content: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Entry {
        key: String,
        value: String,
        raw: String,
    },
    /// Indented line nested under the previous entry (`s3 =` blocks)
    Continuation(String),
    /// Blank line or comment
    Other(String),
}

impl Line {
    fn raw(&self) -> &str {
        match self {
            Line::Entry { raw, .. } => raw,
            Line::Continuation(raw) | Line::Other(raw) => raw,
        }
    }

    fn is_blank(&self) -> bool {
        matches!(self, Line::Other(raw) if raw.trim().is_empty())
    }
}

#[derive(Debug, Clone)]
struct Section {
    name: String,
    header: String,
    /// Emit a blank line before the header; set for sections added here
    blank_before: bool,
    lines: Vec<Line>,
}

impl Section {
    fn entry_mut(&mut self, key: &str) -> Option<(&mut String, &mut String)> {
        self.lines.iter_mut().find_map(|line| match line {
            Line::Entry { key: k, value, raw } if k == key => Some((value, raw)),
            _ => None,
        })
    }

    /// Returns true if the section changed
    fn set(&mut self, key: &str, value: &str) -> bool {
        if let Some((current, raw)) = self.entry_mut(key) {
            if current == value {
                return false;
            }
            *current = value.to_string();
            *raw = format!("{} = {}", key, value);
            return true;
        }

        let insert_at = self
            .lines
            .iter()
            .rposition(|line| matches!(line, Line::Entry { .. } | Line::Continuation(_)))
            .map(|index| index + 1)
            .unwrap_or(0);
        self.lines.insert(
            insert_at,
            Line::Entry {
                key: key.to_string(),
                value: value.to_string(),
                raw: format!("{} = {}", key, value),
            },
        );
        true
    }

    fn last_line_is_blank(&self) -> bool {
        self.lines.last().is_some_and(Line::is_blank)
    }
}

/// Parsed AWS config file
#[derive(Debug, Clone)]
pub struct ConfigDocument {
    preamble: Vec<Line>,
    sections: Vec<Section>,
    trailing_newline: bool,
}

impl Default for ConfigDocument {
    fn default() -> Self {
        Self {
            preamble: Vec::new(),
            sections: Vec::new(),
            trailing_newline: true,
        }
    }
}

impl ConfigDocument {
    pub fn parse(content: &str) -> Result<Self, DocumentError> {
        let mut doc = Self {
            trailing_newline: content.is_empty() || content.ends_with('\n'),
            ..Self::default()
        };

        for (index, raw) in content.lines().enumerate() {
            let line = index + 1;
            let trimmed = raw.trim();

            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
                let other = Line::Other(raw.to_string());
                match doc.sections.last_mut() {
                    Some(section) => section.lines.push(other),
                    None => doc.preamble.push(other),
                }
                continue;
            }

            if trimmed.starts_with('[') {
                let name = parse_header(trimmed).ok_or_else(|| DocumentError::MalformedHeader {
                    line,
                    content: raw.to_string(),
                })?;
                doc.sections.push(Section {
                    name,
                    header: raw.to_string(),
                    blank_before: false,
                    lines: Vec::new(),
                });
                continue;
            }

            let Some(section) = doc.sections.last_mut() else {
                return Err(DocumentError::MissingSection { line });
            };

            let indented = raw.starts_with(char::is_whitespace);
            let follows_entry = section
                .lines
                .last()
                .is_some_and(|last| matches!(last, Line::Entry { .. } | Line::Continuation(_)));
            if indented && follows_entry {
                section.lines.push(Line::Continuation(raw.to_string()));
                continue;
            }

            match trimmed.split_once('=') {
                Some((key, value)) if !key.trim().is_empty() => {
                    section.lines.push(Line::Entry {
                        key: key.trim().to_string(),
                        value: value.trim().to_string(),
                        raw: raw.to_string(),
                    });
                }
                _ => {
                    return Err(DocumentError::InvalidLine {
                        line,
                        content: raw.to_string(),
                    });
                }
            }
        }

        Ok(doc)
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.preamble {
            out.push_str(line.raw());
            out.push('\n');
        }
        for section in &self.sections {
            if section.blank_before {
                out.push('\n');
            }
            out.push_str(&section.header);
            out.push('\n');
            for line in &section.lines {
                out.push_str(line.raw());
                out.push('\n');
            }
        }
        if !self.trailing_newline && out.ends_with('\n') {
            out.pop();
        }
        out
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.section(name).is_some()
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|section| section.name.as_str())
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.section(section)?.lines.iter().find_map(|line| match line {
            Line::Entry { key: k, value, .. } if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    /// Appends an empty section; returns false if it already exists
    pub fn add_section(&mut self, name: &str) -> bool {
        if self.has_section(name) {
            return false;
        }

        let previous_blank = match self.sections.last() {
            Some(section) => section.last_line_is_blank(),
            None => self.preamble.last().is_none_or(Line::is_blank),
        };
        self.sections.push(Section {
            name: name.to_string(),
            header: format!("[{}]", name),
            blank_before: !previous_blank,
            lines: Vec::new(),
        });
        self.trailing_newline = true;
        true
    }

    /// Sets `key` in `section`, creating the section if needed
    ///
    /// Returns true if the document changed. An existing entry with the same
    /// value is left untouched, including its original spacing.
    pub fn set(&mut self, section: &str, key: &str, value: &str) -> bool {
        let added = self.add_section(section);
        let changed = self
            .sections
            .iter_mut()
            .find(|s| s.name == section)
            .is_some_and(|s| s.set(key, value));
        added || changed
    }

    fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.name == name)
    }
}

/// Section name of a header line
///
/// Names may contain brackets themselves (`[profile Team [Prod]]`), so the
/// closing bracket is the first `]` followed only by whitespace or a comment.
fn parse_header(trimmed: &str) -> Option<String> {
    let end = trimmed.match_indices(']').map(|(index, _)| index).find(|&index| {
        let rest = trimmed[index + 1..].trim_start();
        rest.is_empty() || rest.starts_with('#') || rest.starts_with(';')
    })?;
    let name = trimmed[1..end].trim();
    if name.is_empty() {
        return None;
    }
    Some(name.to_string())
}
