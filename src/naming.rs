//! Slug derivation for books, shelves, and cover files.
//!
//! Titles come straight from note frontmatter and end up in URLs and
//! processed-cover filenames, so they are sanitized hard: lowercased,
//! non-alphanumerics collapsed to dashes, length-capped at a word
//! boundary. Since two books can easily share a title, [`SlugSet`] hands
//! out unique slugs per manifest by suffixing repeats.

use std::collections::HashSet;

const MAX_SLUG_LEN: usize = 80;

/// Sanitize a title for use in URLs and filenames.
///
/// - Lowercases
/// - Replaces runs of non-alphanumeric characters with single dashes
/// - Strips leading and trailing dashes
/// - Truncates to `MAX_SLUG_LEN`, breaking at the last dash before the
///   limit
/// - Falls back to `untitled` when nothing survives
pub fn slugify(title: &str) -> String {
    let raw: String = title
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();

    let mut collapsed = String::with_capacity(raw.len());
    let mut prev_dash = false;
    for c in raw.chars() {
        if c == '-' {
            if !prev_dash {
                collapsed.push('-');
            }
            prev_dash = true;
        } else {
            collapsed.push(c);
            prev_dash = false;
        }
    }

    let trimmed = collapsed.trim_matches('-');

    let capped = if trimmed.len() <= MAX_SLUG_LEN {
        trimmed
    } else {
        let truncated = &trimmed[..MAX_SLUG_LEN];
        match truncated.rfind('-') {
            Some(pos) => &truncated[..pos],
            None => truncated,
        }
    };

    if capped.is_empty() {
        "untitled".to_string()
    } else {
        capped.to_string()
    }
}

/// Hands out unique slugs within one manifest, suffixing repeats with
/// `-2`, `-3`, ...
#[derive(Debug, Default)]
pub struct SlugSet {
    taken: HashSet<String>,
}

impl SlugSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim(&mut self, title: &str) -> String {
        let base = slugify(title);
        if self.taken.insert(base.clone()) {
            return base;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{base}-{n}");
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}
