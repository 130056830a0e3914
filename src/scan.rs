//! Vault scanning and manifest generation.
//!
//! Stage 1 of the Spinerack build pipeline. Walks a notes vault to
//! discover books and shelves, producing a structured manifest that
//! subsequent stages consume.
//!
//! ## Vault Structure
//!
//! Spinerack reads a plain folder of markdown notes:
//!
//! ```text
//! library/                         # Vault root
//! ├── spinerack.toml               # Site configuration (optional)
//! ├── index.md                     # Shelf note (has a bookstack block)
//! ├── reading/
//! │   ├── dune.md                  # Book note (has pages in frontmatter)
//! │   ├── dune-cover.jpg           # Cover scan, referenced by the note
//! │   └── emma.md
//! ├── finished/
//! │   ├── 2024.md                  # Shelf note
//! │   └── hobbit.md
//! └── .obsidian/                   # Hidden directories are skipped
//! ```
//!
//! ## Note Classification
//!
//! - A note is a **book** when its frontmatter has a `pages` (or
//!   `page_count`) key. Unparsable page counts fall back to 200 rather
//!   than dropping the book.
//! - A note is a **shelf** when its body contains a fenced
//!   ```` ```bookstack ```` block. Shelves render as pages with book
//!   stacks spliced in.
//! - A note can be both. Everything else is ignored.
//!
//! ## Output
//!
//! Produces a [`Manifest`] containing:
//! - All books with their metadata, slugs, and resolved cover paths
//! - All shelf notes with their raw markdown bodies
//! - Site configuration

use std::fs;
use std::path::{Path, PathBuf};

use pulldown_cmark::{CodeBlockKind, Event, Parser, Tag};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use walkdir::WalkDir;

use crate::config::{self, SiteConfig};
use crate::frontmatter::{self, FrontMatter};
use crate::imaging::is_supported_cover;
use crate::naming::SlugSet;
use crate::types::{Book, ReadingStatus, Shelf};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Manifest output from the scan stage
#[derive(Debug, Serialize, Deserialize)]
pub struct Manifest {
    pub books: Vec<Book>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shelves: Vec<Shelf>,
    pub config: SiteConfig,
}

/// Fallback page count when a book note has a `pages` key the scanner
/// cannot parse as a number.
const DEFAULT_PAGES: u32 = 200;

pub fn scan(root: &Path) -> Result<Manifest, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }

    let config = config::load_config(root)?;

    let mut books = Vec::new();
    let mut shelves = Vec::new();
    let mut book_slugs = SlugSet::new();
    let mut shelf_slugs = SlugSet::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0 || !is_skipped_name(&entry.file_name().to_string_lossy())
        });

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() || !is_markdown(entry.path()) {
            continue;
        }

        let rel_path = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_path_buf();
        let source = fs::read_to_string(entry.path())?;
        let note = frontmatter::parse_note(&source);

        let stem = entry
            .path()
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let title = note_title(&note.front, &stem);

        if is_book_note(&note.front) {
            books.push(build_book(
                root,
                &rel_path,
                &stem,
                title.clone(),
                &note.front,
                &note.body,
                &mut book_slugs,
            ));
        }

        if contains_stack_block(&note.body) {
            shelves.push(Shelf {
                slug: shelf_slugs.claim(&title),
                title,
                path: rel_path.to_string_lossy().to_string(),
                body: note.body.clone(),
            });
        }
    }

    Ok(Manifest {
        books,
        shelves,
        config,
    })
}

/// Names pruned from the walk: hidden entries, build outputs, and the
/// config file.
fn is_skipped_name(name: &str) -> bool {
    name.starts_with('.')
        || name == "processed"
        || name == "dist"
        || name == "manifest.json"
        || name == config::CONFIG_FILENAME
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("md"))
        .unwrap_or(false)
}

/// A note is a book when it declares a page count, under either key.
fn is_book_note(front: &FrontMatter) -> bool {
    front.contains("pages") || front.contains("page_count")
}

/// Title resolution: `title`, then `book_title`, then `book-title`, then
/// the file stem.
fn note_title(front: &FrontMatter, stem: &str) -> String {
    front
        .get("title")
        .or_else(|| front.get("book_title"))
        .or_else(|| front.get("book-title"))
        .map(str::to_string)
        .unwrap_or_else(|| stem.to_string())
}

fn build_book(
    root: &Path,
    rel_path: &Path,
    stem: &str,
    title: String,
    front: &FrontMatter,
    body: &str,
    slugs: &mut SlugSet,
) -> Book {
    let pages = front
        .get("pages")
        .or_else(|| front.get("page_count"))
        .map(|v| v.trim().parse().unwrap_or(DEFAULT_PAGES))
        .unwrap_or(DEFAULT_PAGES);

    let status = front
        .get("status")
        .map(ReadingStatus::parse)
        .unwrap_or_default();

    let cover = front
        .get("cover")
        .or_else(|| front.get("cover_image"))
        .and_then(|value| resolve_cover(root, rel_path, value));

    Book {
        slug: slugs.claim(&title),
        title,
        filename: stem.to_string(),
        path: rel_path.to_string_lossy().to_string(),
        pages,
        color: front
            .get("color")
            .or_else(|| front.get("spine_color"))
            .map(str::to_string),
        status,
        author: front.get("author").map(str::to_string),
        rating: front.get("rating").and_then(|v| v.trim().parse().ok()),
        date_finished: front
            .get("date_finished")
            .or_else(|| front.get("finished"))
            .map(str::to_string),
        tags: front.get_list("tags"),
        cover,
        body: body.to_string(),
        extra: front.to_map(),
    }
}

/// Resolve a frontmatter cover reference to a vault-relative path.
///
/// The reference is tried relative to the note's directory first, then
/// relative to the vault root. Files that are missing or not a supported
/// raster format resolve to `None`; a book without a usable cover still
/// gets a spine.
fn resolve_cover(root: &Path, note_rel_path: &Path, value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    let note_dir = note_rel_path.parent().unwrap_or(Path::new(""));
    let candidates = [note_dir.join(trimmed), PathBuf::from(trimmed)];
    for rel in candidates {
        let abs = root.join(&rel);
        if abs.is_file() && is_supported_cover(&abs) {
            return Some(rel.to_string_lossy().to_string());
        }
    }
    None
}

/// Whether a note body contains a fenced `bookstack` code block.
///
/// Uses the same markdown parser the generate stage renders with, so a
/// note the scanner calls a shelf is exactly a note that will get a
/// stack spliced in.
pub fn contains_stack_block(body: &str) -> bool {
    Parser::new(body).any(|event| match event {
        Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
            info.split_whitespace().next() == Some("bookstack")
        }
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_note(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn book_note(title: &str, pages: &str) -> String {
        format!("---\ntitle: {title}\npages: {pages}\n---\n\nNotes about {title}.\n")
    }

    fn shelf_note(title: &str, query: &str) -> String {
        format!("---\ntitle: {title}\n---\n\n# {title}\n\n```bookstack\n{query}\n```\n")
    }

    fn find_book<'a>(manifest: &'a Manifest, title: &str) -> &'a Book {
        manifest
            .books
            .iter()
            .find(|b| b.title == title)
            .unwrap_or_else(|| {
                panic!(
                    "Book '{title}' not found. Available: {:?}",
                    manifest.books.iter().map(|b| &b.title).collect::<Vec<_>>()
                )
            })
    }

    // =========================================================================
    // Classification tests
    // =========================================================================

    #[test]
    fn scan_finds_books() {
        let tmp = TempDir::new().unwrap();
        write_note(tmp.path(), "dune.md", &book_note("Dune", "412"));
        write_note(tmp.path(), "emma.md", &book_note("Emma", "474"));
        write_note(tmp.path(), "journal.md", "---\ntitle: Journal\n---\n\nNot a book.\n");

        let manifest = scan(tmp.path()).unwrap();
        assert_eq!(manifest.books.len(), 2);
        assert!(manifest.shelves.is_empty());
    }

    #[test]
    fn page_count_key_also_marks_a_book() {
        let tmp = TempDir::new().unwrap();
        write_note(
            tmp.path(),
            "hobbit.md",
            "---\ntitle: The Hobbit\npage_count: 310\n---\n",
        );

        let manifest = scan(tmp.path()).unwrap();
        assert_eq!(find_book(&manifest, "The Hobbit").pages, 310);
    }

    #[test]
    fn shelf_detected_by_bookstack_block() {
        let tmp = TempDir::new().unwrap();
        write_note(tmp.path(), "dune.md", &book_note("Dune", "412"));
        write_note(tmp.path(), "shelf.md", &shelf_note("My Shelf", "sort: pages"));

        let manifest = scan(tmp.path()).unwrap();
        assert_eq!(manifest.shelves.len(), 1);
        assert_eq!(manifest.shelves[0].title, "My Shelf");
        assert_eq!(manifest.shelves[0].slug, "my-shelf");
        assert!(manifest.shelves[0].body.contains("```bookstack"));
    }

    #[test]
    fn note_can_be_both_book_and_shelf() {
        let tmp = TempDir::new().unwrap();
        write_note(
            tmp.path(),
            "dune.md",
            "---\ntitle: Dune\npages: 412\n---\n\n```bookstack\ntag: dune\n```\n",
        );

        let manifest = scan(tmp.path()).unwrap();
        assert_eq!(manifest.books.len(), 1);
        assert_eq!(manifest.shelves.len(), 1);
    }

    #[test]
    fn plain_code_blocks_are_not_shelves() {
        let tmp = TempDir::new().unwrap();
        write_note(
            tmp.path(),
            "snippets.md",
            "---\ntitle: Snippets\n---\n\n```rust\nfn main() {}\n```\n",
        );

        let manifest = scan(tmp.path()).unwrap();
        assert!(manifest.shelves.is_empty());
    }

    #[test]
    fn indented_fence_still_counts() {
        assert!(contains_stack_block("text\n\n```bookstack\ntag: x\n```\n"));
        // Fences may be indented up to three spaces.
        assert!(contains_stack_block("   ```bookstack\n   ```\n"));
        assert!(!contains_stack_block("inline ```bookstack``` mention"));
        assert!(!contains_stack_block("no blocks here"));
    }

    // =========================================================================
    // Field extraction tests
    // =========================================================================

    #[test]
    fn title_falls_back_through_synonyms_to_stem() {
        let tmp = TempDir::new().unwrap();
        write_note(tmp.path(), "a.md", "---\ntitle: Named\npages: 100\n---\n");
        write_note(tmp.path(), "b.md", "---\nbook_title: Underscored\npages: 100\n---\n");
        write_note(tmp.path(), "c.md", "---\nbook-title: Dashed\npages: 100\n---\n");
        write_note(tmp.path(), "stem-title.md", "---\npages: 100\n---\n");

        let manifest = scan(tmp.path()).unwrap();
        let titles: Vec<&str> = manifest.books.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["Named", "Underscored", "Dashed", "stem-title"]);
    }

    #[test]
    fn unparsable_pages_default() {
        let tmp = TempDir::new().unwrap();
        write_note(tmp.path(), "vague.md", &book_note("Vague", "a lot"));

        let manifest = scan(tmp.path()).unwrap();
        assert_eq!(find_book(&manifest, "Vague").pages, 200);
    }

    #[test]
    fn color_synonym_spine_color() {
        let tmp = TempDir::new().unwrap();
        write_note(
            tmp.path(),
            "dune.md",
            "---\ntitle: Dune\npages: 412\nspine_color: \"#c9a227\"\n---\n",
        );

        let manifest = scan(tmp.path()).unwrap();
        assert_eq!(find_book(&manifest, "Dune").color.as_deref(), Some("#c9a227"));
    }

    #[test]
    fn status_synonyms_normalize() {
        let tmp = TempDir::new().unwrap();
        write_note(
            tmp.path(),
            "dune.md",
            "---\ntitle: Dune\npages: 412\nstatus: finished\n---\n",
        );
        write_note(tmp.path(), "emma.md", &book_note("Emma", "474"));

        let manifest = scan(tmp.path()).unwrap();
        assert_eq!(find_book(&manifest, "Dune").status, ReadingStatus::Done);
        // No status key defaults to to-read.
        assert_eq!(find_book(&manifest, "Emma").status, ReadingStatus::ToRead);
    }

    #[test]
    fn date_finished_synonym() {
        let tmp = TempDir::new().unwrap();
        write_note(
            tmp.path(),
            "dune.md",
            "---\ntitle: Dune\npages: 412\nfinished: 2024-01-15\n---\n",
        );

        let manifest = scan(tmp.path()).unwrap();
        assert_eq!(
            find_book(&manifest, "Dune").date_finished.as_deref(),
            Some("2024-01-15")
        );
    }

    #[test]
    fn tags_parse_from_list_and_scalar() {
        let tmp = TempDir::new().unwrap();
        write_note(
            tmp.path(),
            "a.md",
            "---\ntitle: A\npages: 10\ntags:\n  - scifi\n  - favorites\n---\n",
        );
        write_note(
            tmp.path(),
            "b.md",
            "---\ntitle: B\npages: 10\ntags: scifi, classics\n---\n",
        );

        let manifest = scan(tmp.path()).unwrap();
        assert_eq!(find_book(&manifest, "A").tags, vec!["scifi", "favorites"]);
        assert_eq!(find_book(&manifest, "B").tags, vec!["scifi", "classics"]);
    }

    #[test]
    fn rating_parses_or_is_absent() {
        let tmp = TempDir::new().unwrap();
        write_note(
            tmp.path(),
            "a.md",
            "---\ntitle: A\npages: 10\nrating: 4\n---\n",
        );
        write_note(
            tmp.path(),
            "b.md",
            "---\ntitle: B\npages: 10\nrating: great\n---\n",
        );

        let manifest = scan(tmp.path()).unwrap();
        assert_eq!(find_book(&manifest, "A").rating, Some(4));
        assert_eq!(find_book(&manifest, "B").rating, None);
    }

    #[test]
    fn extra_keeps_raw_frontmatter() {
        let tmp = TempDir::new().unwrap();
        write_note(
            tmp.path(),
            "a.md",
            "---\ntitle: A\npages: 10\nseries: Dune Chronicles\n---\n",
        );

        let manifest = scan(tmp.path()).unwrap();
        let book = find_book(&manifest, "A");
        assert_eq!(book.extra.get("series").map(String::as_str), Some("Dune Chronicles"));
        assert_eq!(book.extra.get("pages").map(String::as_str), Some("10"));
    }

    // =========================================================================
    // Slug tests
    // =========================================================================

    #[test]
    fn duplicate_titles_get_suffixed_slugs() {
        let tmp = TempDir::new().unwrap();
        write_note(tmp.path(), "a/dune.md", &book_note("Dune", "412"));
        write_note(tmp.path(), "b/dune.md", &book_note("Dune", "412"));

        let manifest = scan(tmp.path()).unwrap();
        let mut slugs: Vec<&str> = manifest.books.iter().map(|b| b.slug.as_str()).collect();
        slugs.sort();
        assert_eq!(slugs, vec!["dune", "dune-2"]);
    }

    #[test]
    fn book_paths_are_relative() {
        let tmp = TempDir::new().unwrap();
        write_note(tmp.path(), "reading/dune.md", &book_note("Dune", "412"));

        let manifest = scan(tmp.path()).unwrap();
        let book = find_book(&manifest, "Dune");
        assert_eq!(book.path, "reading/dune.md");
        assert_eq!(book.filename, "dune");
        assert!(!book.path.starts_with('/'));
    }

    // =========================================================================
    // Cover resolution tests
    // =========================================================================

    #[test]
    fn cover_resolves_next_to_note() {
        let tmp = TempDir::new().unwrap();
        write_note(
            tmp.path(),
            "reading/dune.md",
            "---\ntitle: Dune\npages: 412\ncover: dune.jpg\n---\n",
        );
        fs::write(tmp.path().join("reading/dune.jpg"), "fake image").unwrap();

        let manifest = scan(tmp.path()).unwrap();
        assert_eq!(
            find_book(&manifest, "Dune").cover.as_deref(),
            Some("reading/dune.jpg")
        );
    }

    #[test]
    fn cover_falls_back_to_vault_root() {
        let tmp = TempDir::new().unwrap();
        write_note(
            tmp.path(),
            "reading/dune.md",
            "---\ntitle: Dune\npages: 412\ncover: covers/dune.png\n---\n",
        );
        fs::create_dir_all(tmp.path().join("covers")).unwrap();
        fs::write(tmp.path().join("covers/dune.png"), "fake image").unwrap();

        let manifest = scan(tmp.path()).unwrap();
        assert_eq!(
            find_book(&manifest, "Dune").cover.as_deref(),
            Some("covers/dune.png")
        );
    }

    #[test]
    fn cover_image_synonym_accepted() {
        let tmp = TempDir::new().unwrap();
        write_note(
            tmp.path(),
            "dune.md",
            "---\ntitle: Dune\npages: 412\ncover_image: dune.webp\n---\n",
        );
        fs::write(tmp.path().join("dune.webp"), "fake image").unwrap();

        let manifest = scan(tmp.path()).unwrap();
        assert_eq!(find_book(&manifest, "Dune").cover.as_deref(), Some("dune.webp"));
    }

    #[test]
    fn missing_or_unsupported_cover_is_none() {
        let tmp = TempDir::new().unwrap();
        write_note(
            tmp.path(),
            "a.md",
            "---\ntitle: A\npages: 10\ncover: gone.jpg\n---\n",
        );
        write_note(
            tmp.path(),
            "b.md",
            "---\ntitle: B\npages: 10\ncover: art.bmp\n---\n",
        );
        fs::write(tmp.path().join("art.bmp"), "fake image").unwrap();

        let manifest = scan(tmp.path()).unwrap();
        assert_eq!(find_book(&manifest, "A").cover, None);
        assert_eq!(find_book(&manifest, "B").cover, None);
    }

    // =========================================================================
    // Walk filtering tests
    // =========================================================================

    #[test]
    fn hidden_and_output_directories_skipped() {
        let tmp = TempDir::new().unwrap();
        write_note(tmp.path(), "dune.md", &book_note("Dune", "412"));
        write_note(tmp.path(), ".obsidian/workspace.md", &book_note("Ghost", "1"));
        write_note(tmp.path(), "dist/book.md", &book_note("Built", "1"));
        write_note(tmp.path(), "processed/tmp.md", &book_note("Temp", "1"));

        let manifest = scan(tmp.path()).unwrap();
        assert_eq!(manifest.books.len(), 1);
        assert_eq!(manifest.books[0].title, "Dune");
    }

    #[test]
    fn non_markdown_files_ignored() {
        let tmp = TempDir::new().unwrap();
        write_note(tmp.path(), "dune.md", &book_note("Dune", "412"));
        fs::write(tmp.path().join("cover.jpg"), "fake image").unwrap();
        fs::write(tmp.path().join("notes.txt"), "plain text").unwrap();

        let manifest = scan(tmp.path()).unwrap();
        assert_eq!(manifest.books.len(), 1);
    }

    #[test]
    fn scan_missing_directory_is_error() {
        let tmp = TempDir::new().unwrap();
        let result = scan(&tmp.path().join("does-not-exist"));
        assert!(matches!(result, Err(ScanError::NotADirectory(_))));
    }

    // =========================================================================
    // Config integration tests
    // =========================================================================

    #[test]
    fn config_loaded_from_vault() {
        let tmp = TempDir::new().unwrap();
        write_note(tmp.path(), "dune.md", &book_note("Dune", "412"));
        fs::write(
            tmp.path().join(config::CONFIG_FILENAME),
            "[stack]\nwidth = 240\n",
        )
        .unwrap();

        let manifest = scan(tmp.path()).unwrap();
        assert_eq!(manifest.config.stack.width, 240);
    }

    #[test]
    fn default_config_when_no_toml() {
        let tmp = TempDir::new().unwrap();
        write_note(tmp.path(), "dune.md", &book_note("Dune", "412"));

        let manifest = scan(tmp.path()).unwrap();
        assert_eq!(manifest.config.stack.width, 200);
        assert!(manifest.config.covers.trim);
    }

    #[test]
    fn scan_order_is_deterministic() {
        let tmp = TempDir::new().unwrap();
        write_note(tmp.path(), "zeta.md", &book_note("Zeta", "100"));
        write_note(tmp.path(), "alpha.md", &book_note("Alpha", "100"));
        write_note(tmp.path(), "mid/beta.md", &book_note("Beta", "100"));

        let manifest = scan(tmp.path()).unwrap();
        let titles: Vec<&str> = manifest.books.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["Alpha", "Beta", "Zeta"]);
    }
}
