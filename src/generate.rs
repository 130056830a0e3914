//! HTML site generation.
//!
//! Stage 3 of the spinerack build pipeline. Takes the processed manifest
//! and generates the final static site.
//!
//! ## Generated Pages
//!
//! - **Index page** (`/index.html`): the whole library as one spine stack
//! - **Shelf pages** (`/shelf/{slug}/index.html`): the shelf note's
//!   markdown with every `bookstack` query block replaced by an evaluated
//!   spine stack
//! - **Book pages** (`/book/{slug}/index.html`): cover, metadata, and the
//!   note body
//!
//! ## Spine Stacks
//!
//! A stack is a pile of books viewed side-on. Each book renders either as
//! its processed cover image (real pixel dimensions from the manifest) or
//! as a colored spine whose height encodes the page count. Spines are
//! emitted in reverse list order so the first book in a query result sits
//! at the bottom of the pile, directly on the surface element.
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── index.html
//! ├── covers/                    # processed cover PNGs (copied)
//! │   └── dune.png
//! ├── shelf/
//! │   └── favorites/index.html
//! └── book/
//!     ├── dune/index.html
//!     └── the-hobbit/index.html
//! ```
//!
//! ## HTML Generation
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML
//! templating, with automatic XSS escaping. Styles are embedded inline:
//! `static/style.css` plus CSS custom properties generated from the
//! config. The published site needs no JavaScript.

use crate::color;
use crate::config::{self, SiteConfig};
use crate::process::{CoverAsset, ProcessedManifest};
use crate::query;
use crate::stack;
use crate::template;
use crate::types::{Book, Shelf};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{CodeBlockKind, Event, Parser, Tag, TagEnd, html as md_html};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

const CSS_STATIC: &str = include_str!("../static/style.css");

pub fn generate(
    manifest_path: &Path,
    processed_dir: &Path,
    output_dir: &Path,
) -> Result<(), GenerateError> {
    let manifest_content = fs::read_to_string(manifest_path)?;
    let manifest: ProcessedManifest = serde_json::from_str(&manifest_content)?;

    // Theme variables from config, then the static rules that use them
    let theme_css = config::generate_theme_css(&manifest.config);
    let css = format!("{}\n\n{}", theme_css, CSS_STATIC);

    fs::create_dir_all(output_dir)?;

    // Copy processed covers to output
    copy_dir_recursive(processed_dir, output_dir)?;

    let index_html = render_index(&manifest, &css);
    fs::write(output_dir.join("index.html"), index_html.into_string())?;
    println!("Generated index.html");

    for shelf in &manifest.shelves {
        let shelf_dir = output_dir.join("shelf").join(&shelf.slug);
        fs::create_dir_all(&shelf_dir)?;
        let shelf_html = render_shelf_page(shelf, &manifest, &css);
        fs::write(shelf_dir.join("index.html"), shelf_html.into_string())?;
        println!("Generated shelf/{}/index.html", shelf.slug);
    }

    for book in &manifest.books {
        let book_dir = output_dir.join("book").join(&book.slug);
        fs::create_dir_all(&book_dir)?;
        let book_html = render_book_page(book, &manifest, &css);
        fs::write(book_dir.join("index.html"), book_html.into_string())?;
    }
    println!("Generated {} book pages", manifest.books.len());

    println!("Site generated at {}", output_dir.display());
    Ok(())
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else if src_path.extension().map(|e| e != "json").unwrap_or(true) {
            // Skip the stage manifests, copy everything else
            fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document structure
fn base_document(title: &str, css: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (css) }
            }
            body {
                (content)
            }
        }
    }
}

/// Renders the site header with breadcrumb and shelf navigation
fn site_header(breadcrumb: Markup, nav: Markup) -> Markup {
    html! {
        header.site-header {
            nav.breadcrumb {
                (breadcrumb)
            }
            nav.site-nav {
                (nav)
            }
        }
    }
}

/// Renders the shelf navigation. `current_slug` is empty on the index and
/// book pages.
pub fn render_nav(shelves: &[Shelf], current_slug: &str) -> Markup {
    html! {
        ul {
            li class=[current_slug.is_empty().then_some("current")] {
                a href="/" { "All Books" }
            }
            @for shelf in shelves {
                li class=[(current_slug == shelf.slug).then_some("current")] {
                    a href={ "/shelf/" (shelf.slug) "/" } { (shelf.title) }
                }
            }
        }
    }
}

// ============================================================================
// Spine Stacks
// ============================================================================

/// Renders a pile of books. The first book in `books` lands at the bottom
/// of the pile; the surface element closes the stack.
pub fn render_stack(
    books: &[&Book],
    covers: &BTreeMap<String, CoverAsset>,
    config: &SiteConfig,
    title_format: Option<&str>,
) -> Markup {
    if books.is_empty() {
        return html! {
            div.stack.stack-empty {
                p { "No books found" }
                p.stack-hint { "Add 'pages' to your book note's frontmatter." }
            }
        };
    }

    html! {
        div.stack {
            @for (index, book) in books.iter().enumerate().rev() {
                (render_spine(book, index, covers.get(&book.slug), config, title_format))
            }
            div.stack-surface {}
        }
    }
}

/// Renders one book in a stack: the processed cover when one exists,
/// otherwise a colored spine sized from the page count.
fn render_spine(
    book: &Book,
    index: usize,
    asset: Option<&CoverAsset>,
    config: &SiteConfig,
    title_format: Option<&str>,
) -> Markup {
    let url = format!("/book/{}/", book.slug);
    let tooltip = spine_tooltip(book);
    let aria = format!("{} - {} pages", book.title, book.pages);

    if let Some(asset) = asset {
        return html! {
            a.stack-cover href=(url) aria-label=(aria) title=(tooltip) {
                img src={ "/" (asset.file) }
                    width=(asset.width)
                    height=(asset.height)
                    alt=(book.title)
                    loading="lazy";
            }
        };
    }

    let height = stack::spine_height(
        book.pages,
        config.stack.pages_per_pixel,
        config.stack.min_spine_height,
        config.stack.max_spine_height,
    );
    let background = stack::spine_color(book.color.as_deref(), index);
    let display_title = match title_format {
        Some(format) => template::format_title(format, book),
        None => book.title.clone(),
    };
    let label = stack::truncate_title(&display_title, config.stack.width, config.theme.font_size);
    let style = format!(
        "height: {}px; background-color: {}; color: {}; border-top-color: {}; border-bottom-color: {};",
        height,
        background,
        color::contrast_text_color(&background),
        color::adjust_brightness(&background, 20.0),
        color::adjust_brightness(&background, -20.0),
    );

    html! {
        a.spine href=(url) style=(style) aria-label=(aria) title=(tooltip) {
            span.spine-title { (label) }
            @if stack::shows_page_count(config.stack.show_page_count, height) {
                span.spine-pages { (book.pages) "p" }
            }
        }
    }
}

/// Hover text: title, author when known, page count.
fn spine_tooltip(book: &Book) -> String {
    let mut lines = vec![book.title.clone()];
    if let Some(author) = &book.author {
        lines.push(format!("By: {}", author));
    }
    lines.push(format!("Pages: {}", book.pages));
    lines.join("\n")
}

// ============================================================================
// Markdown with stack splicing
// ============================================================================

/// Renders markdown, replacing every fenced `bookstack` block with the
/// evaluated spine stack for the query it contains.
pub fn render_markdown_with_stacks(
    body: &str,
    books: &[Book],
    covers: &BTreeMap<String, CoverAsset>,
    config: &SiteConfig,
) -> Markup {
    let mut out = String::new();
    let mut buffered: Vec<Event> = Vec::new();
    let mut in_stack_block = false;
    let mut query_text = String::new();

    for event in Parser::new(body) {
        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info)))
                if is_stack_fence(&info) =>
            {
                md_html::push_html(&mut out, buffered.drain(..));
                in_stack_block = true;
                query_text.clear();
            }
            Event::End(TagEnd::CodeBlock) if in_stack_block => {
                in_stack_block = false;
                let query = query::parse_query(&query_text);
                let selected = query::evaluate(books, &query);
                let stack = render_stack(&selected, covers, config, query.title_format.as_deref());
                out.push_str(&stack.into_string());
            }
            Event::Text(text) if in_stack_block => query_text.push_str(&text),
            other => buffered.push(other),
        }
    }
    md_html::push_html(&mut out, buffered.drain(..));

    PreEscaped(out)
}

fn is_stack_fence(info: &str) -> bool {
    info.split_whitespace().next() == Some("bookstack")
}

// ============================================================================
// Page Renderers
// ============================================================================

/// Renders the index page: the whole library as one stack
fn render_index(manifest: &ProcessedManifest, css: &str) -> Markup {
    let nav = render_nav(&manifest.shelves, "");
    let breadcrumb = html! {
        a href="/" { "Library" }
    };
    let all_books: Vec<&Book> = manifest.books.iter().collect();

    let content = html! {
        (site_header(breadcrumb, nav))
        main.index-page {
            div.stack-area {
                (render_stack(&all_books, &manifest.covers, &manifest.config, None))
            }
        }
    };

    base_document("Library", css, content)
}

/// Renders a shelf page from its note body
fn render_shelf_page(shelf: &Shelf, manifest: &ProcessedManifest, css: &str) -> Markup {
    let nav = render_nav(&manifest.shelves, &shelf.slug);
    let breadcrumb = html! {
        a href="/" { "Library" }
        " › "
        (shelf.title)
    };
    let body = render_markdown_with_stacks(
        &shelf.body,
        &manifest.books,
        &manifest.covers,
        &manifest.config,
    );

    let content = html! {
        (site_header(breadcrumb, nav))
        main.shelf-page {
            article.shelf-content {
                (body)
            }
        }
    };

    base_document(&shelf.title, css, content)
}

/// Renders a book page: cover, metadata, note body
fn render_book_page(book: &Book, manifest: &ProcessedManifest, css: &str) -> Markup {
    let nav = render_nav(&manifest.shelves, "");
    let breadcrumb = html! {
        a href="/" { "Library" }
        " › "
        (book.title)
    };
    let asset = manifest.covers.get(&book.slug);

    let content = html! {
        (site_header(breadcrumb, nav))
        main.book-page {
            header.book-header {
                @if let Some(asset) = asset {
                    img.book-cover src={ "/" (asset.file) }
                        width=(asset.width)
                        height=(asset.height)
                        alt=(book.title);
                }
                div.book-meta {
                    h1 { (book.title) }
                    @if let Some(author) = &book.author {
                        p.book-author { "By " (author) }
                    }
                    dl.book-facts {
                        dt { "Pages" }
                        dd { (book.pages) }
                        dt { "Status" }
                        dd { (book.status.as_str()) }
                        @if let Some(rating) = book.rating {
                            dt { "Rating" }
                            dd { (rating) "/5" }
                        }
                        @if let Some(date) = &book.date_finished {
                            dt { "Finished" }
                            dd { (date) }
                        }
                        @if !book.tags.is_empty() {
                            dt { "Tags" }
                            dd { (book.tags.join(", ")) }
                        }
                    }
                }
            }
            @if !book.body.trim().is_empty() {
                article.book-notes {
                    (render_markdown_with_stacks(&book.body, &manifest.books, &manifest.covers, &manifest.config))
                }
            }
        }
    };

    base_document(&book.title, css, content)
}

// ============================================================================
// Tests
// ============================================================================
