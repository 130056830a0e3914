//! The shelf query language.
//!
//! A ```` ```bookstack ```` block holds `key: value` lines that select
//! and order books from the library:
//!
//! ```text
//! folder: reading/scifi
//! tag: #favorites
//! status: done, reading
//! sort: pages
//! order: desc
//! limit: 12
//! title-format: {{title}} ({{pages}}p)
//! ```
//!
//! Parsing never fails. Blank lines and `#` comments are skipped,
//! unknown keys are ignored, and malformed values fall back to the
//! defaults, so a typo in a note renders the whole stack rather than an
//! error.

use serde::{Deserialize, Serialize};

use crate::types::{Book, ReadingStatus};

/// Sort key for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortBy {
    #[default]
    Title,
    Pages,
    Rating,
    DateFinished,
}

/// Sort direction. Only the exact value `desc` selects descending;
/// everything else is ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// A parsed shelf query.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Query {
    pub folder: Option<String>,
    pub tag: Option<String>,
    pub status: Vec<ReadingStatus>,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    pub limit: Option<usize>,
    pub title_format: Option<String>,
}

/// Parse the body of a bookstack block into a [`Query`].
pub fn parse_query(source: &str) -> Query {
    let mut query = Query::default();
    for line in source.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_lowercase();
        let value = value.trim();
        match key.as_str() {
            "folder" => query.folder = Some(value.to_string()),
            "tag" => query.tag = Some(value.trim_start_matches('#').to_string()),
            "status" => {
                query.status = value
                    .split(',')
                    .filter_map(|s| ReadingStatus::parse_canonical(&s.trim().to_lowercase()))
                    .collect();
            }
            "sort" | "sortby" => query.sort_by = parse_sort_by(value),
            "order" | "sortorder" => {
                query.sort_order = if value == "desc" {
                    SortOrder::Desc
                } else {
                    SortOrder::Asc
                };
            }
            "limit" => query.limit = value.parse::<usize>().ok().filter(|n| *n > 0),
            "title-format" | "titleformat" | "title_format" => {
                query.title_format = Some(value.to_string());
            }
            _ => {}
        }
    }
    query
}

fn parse_sort_by(value: &str) -> SortBy {
    let normalized: String = value
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect();
    match normalized.as_str() {
        "pages" => SortBy::Pages,
        "rating" => SortBy::Rating,
        "datefinished" => SortBy::DateFinished,
        _ => SortBy::Title,
    }
}

/// Run a query against the library, returning matching books in display
/// order.
///
/// Filtering is folder prefix, tag match, and status membership; an
/// empty status list admits everything. Sorting is stable, so books that
/// compare equal keep their scan order.
pub fn evaluate<'a>(books: &'a [Book], query: &Query) -> Vec<&'a Book> {
    let mut matched: Vec<&Book> = books
        .iter()
        .filter(|book| {
            matches_folder(book, query.folder.as_deref())
                && matches_tag(book, query.tag.as_deref())
                && (query.status.is_empty() || query.status.contains(&book.status))
        })
        .collect();

    match query.sort_by {
        SortBy::Title => {
            matched.sort_by_key(|book| book.title.to_lowercase());
        }
        SortBy::Pages => {
            matched.sort_by_key(|book| book.pages);
        }
        SortBy::Rating => {
            matched.sort_by_key(|book| book.rating.unwrap_or(0));
        }
        SortBy::DateFinished => {
            matched.sort_by(|a, b| {
                a.date_finished
                    .as_deref()
                    .unwrap_or("")
                    .cmp(b.date_finished.as_deref().unwrap_or(""))
            });
        }
    }
    if query.sort_order == SortOrder::Desc {
        matched.reverse();
    }

    if let Some(limit) = query.limit {
        matched.truncate(limit);
    }
    matched
}

fn matches_folder(book: &Book, folder: Option<&str>) -> bool {
    let Some(folder) = folder else {
        return true;
    };
    let normalized = folder.trim_matches('/');
    if normalized.is_empty() {
        return true;
    }
    book.path.starts_with(&format!("{normalized}/"))
}

fn matches_tag(book: &Book, tag: Option<&str>) -> bool {
    let Some(tag) = tag else {
        return true;
    };
    let wanted = tag.to_lowercase();
    let prefix = format!("{wanted}/");
    book.tags.iter().any(|t| {
        let t = t.to_lowercase();
        t == wanted || t.starts_with(&prefix)
    })
}
