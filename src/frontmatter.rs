//! Flat frontmatter parsing for library notes.
//!
//! Notes open with an optional block of `key: value` pairs between `---`
//! fence lines. Only the flat subset a book library needs is understood:
//!
//! - scalar values, optionally single- or double-quoted
//! - inline lists: `tags: [fiction, scifi]`
//! - block lists: a bare `key:` followed by `- item` lines
//! - `#` comment lines
//!
//! Nested mappings are not modeled; indented non-list lines are skipped.
//! All keys are kept verbatim (and in order) so display templates can
//! reach any field the note author wrote.

use std::collections::BTreeMap;

/// A note split into parsed frontmatter and the markdown body after it.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedNote {
    pub front: FrontMatter,
    pub body: String,
}

/// Parsed frontmatter fields in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    fields: Vec<(String, Value)>,
}

#[derive(Debug, Clone, PartialEq)]
enum Value {
    Scalar(String),
    List(Vec<String>),
}

impl FrontMatter {
    /// Scalar value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.iter().find_map(|(k, v)| match v {
            Value::Scalar(s) if k == key => Some(s.as_str()),
            _ => None,
        })
    }

    /// List value for `key`; a scalar is treated as comma-separated.
    pub fn get_list(&self, key: &str) -> Vec<String> {
        let value = self
            .fields
            .iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, v)| v);
        match value {
            Some(Value::List(items)) => items.clone(),
            Some(Value::Scalar(s)) => s
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(String::from)
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.iter().any(|(k, _)| k.as_str() == key)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Every field rendered to a display string (lists joined with ", ").
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.fields
            .iter()
            .map(|(k, v)| {
                let rendered = match v {
                    Value::Scalar(s) => s.clone(),
                    Value::List(items) => items.join(", "),
                };
                (k.clone(), rendered)
            })
            .collect()
    }
}

/// Split a note into frontmatter and body.
///
/// A note without an opening fence, or with an unclosed one, is all
/// body. The fence lines themselves belong to neither part.
pub fn parse_note(source: &str) -> ParsedNote {
    let all_body = || ParsedNote {
        front: FrontMatter::default(),
        body: source.to_string(),
    };

    let Some(rest) = source.strip_prefix("---") else {
        return all_body();
    };
    // The opening fence must sit alone on the first line.
    let Some(rest) = rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix("\n")) else {
        return all_body();
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let inner = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return ParsedNote {
                front: parse_fields(inner),
                body: body.to_string(),
            };
        }
        offset += line.len();
    }

    all_body()
}

fn parse_fields(block: &str) -> FrontMatter {
    let mut fields: Vec<(String, Value)> = Vec::new();
    // Index of the field currently collecting `- item` lines.
    let mut pending_list: Option<usize> = None;

    for raw in block.lines() {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        if let Some(idx) = pending_list
            && let Some(item) = trimmed.strip_prefix("- ")
        {
            if let Value::List(items) = &mut fields[idx].1 {
                items.push(unquote(item).to_string());
            }
            continue;
        }
        pending_list = None;

        // Indented lines that are not list items belong to nested
        // structures we do not model.
        if raw.starts_with(' ') || raw.starts_with('\t') {
            continue;
        }

        let Some((key, value)) = trimmed.split_once(':') else {
            continue;
        };
        let key = key.trim().to_string();
        let value = value.trim();

        if value.is_empty() {
            fields.push((key, Value::List(Vec::new())));
            pending_list = Some(fields.len() - 1);
        } else if let Some(inner) = value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
            let items = inner
                .split(',')
                .map(|item| unquote(item.trim()).to_string())
                .filter(|item| !item.is_empty())
                .collect();
            fields.push((key, Value::List(items)));
        } else {
            fields.push((key, Value::Scalar(unquote(value).to_string())));
        }
    }

    FrontMatter { fields }
}

fn unquote(value: &str) -> &str {
    let v = value.trim();
    if v.len() >= 2
        && ((v.starts_with('"') && v.ends_with('"'))
            || (v.starts_with('\'') && v.ends_with('\'')))
    {
        &v[1..v.len() - 1]
    } else {
        v
    }
}
