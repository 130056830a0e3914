//! Display templates for spine labels.
//!
//! Shelf queries can override how each spine is labelled with a
//! `title-format` template, e.g. `{{title}} ({{pages}}p)`. Variables
//! resolve against the book record first and fall back to raw
//! frontmatter, with key matching that ignores case, spaces, dashes, and
//! underscores, so `{{Date Finished}}`, `{{date-finished}}`, and
//! `{{datefinished}}` all hit the same field.

use crate::types::Book;

/// Template applied when a query does not set `title-format`.
pub const DEFAULT_TITLE_FORMAT: &str = "{{title}}";

/// Render `template` for one book, substituting `{{variable}}`
/// placeholders. Unknown variables render as empty strings; an
/// unterminated `{{` is kept literally.
pub fn format_title(template: &str, book: &Book) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                out.push_str(&lookup(book, after[..end].trim()));
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                return out;
            }
        }
    }
    out.push_str(rest);
    out
}

fn lookup(book: &Book, name: &str) -> String {
    match normalize_key(name).as_str() {
        "title" => book.title.clone(),
        "filename" => book.filename.clone(),
        "path" => book.path.clone(),
        "author" => book.author.clone().unwrap_or_default(),
        "pages" => book.pages.to_string(),
        "status" => book.status.as_str().to_string(),
        "rating" => book.rating.map(|r| r.to_string()).unwrap_or_default(),
        "datefinished" => book.date_finished.clone().unwrap_or_default(),
        "tags" => book.tags.join(", "),
        normalized => {
            if let Some(value) = book.extra.get(name) {
                return value.clone();
            }
            book.extra
                .iter()
                .find(|(key, _)| normalize_key(key) == normalized)
                .map(|(_, value)| value.clone())
                .unwrap_or_default()
        }
    }
}

fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}
