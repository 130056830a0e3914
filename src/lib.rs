//! # Spinerack
//!
//! A static site generator for personal book libraries. Your markdown vault is
//! the data source: notes with a `pages:` frontmatter key become books, notes
//! embedding fenced `bookstack` query blocks become shelves, and the output is
//! a plain HTML site where every book is a CSS spine lying on a pile.
//!
//! # Architecture: Three-Stage Pipeline
//!
//! Spinerack processes a vault through three independent stages, each producing
//! a JSON manifest that the next stage consumes:
//!
//! ```text
//! 1. Scan      library/  →  manifest.json    (vault → structured data)
//! 2. Process   manifest  →  processed/       (trimmed + resized cover variants)
//! 3. Generate  manifest  →  dist/            (final HTML site)
//! ```
//!
//! The separation exists for three reasons:
//!
//! - **Debuggability**: every stage boundary is human-readable JSON you can
//!   open in an editor.
//! - **Incremental builds**: cover rendering is the slow stage, and its cache
//!   means a retitled book costs a file copy rather than a re-encode.
//! - **Testability**: the interesting logic is a pure function from manifest
//!   to manifest, so unit tests rarely need to decode an image.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Stage 1 — walks the vault, classifies notes, produces the scan manifest |
//! | [`process`] | Stage 2 — renders trimmed and resized cover variants with hash-keyed caching |
//! | [`generate`] | Stage 3 — renders the HTML site from the processed manifest using Maud |
//! | [`config`] | `spinerack.toml` loading, validation, and theme CSS generation |
//! | [`types`] | Shared types serialized between stages (`Book`, `Shelf`, `ReadingStatus`) |
//! | [`frontmatter`] | Minimal frontmatter block parser for book notes |
//! | [`naming`] | Title slugification and collision handling for page URLs |
//! | [`query`] | Filter and sort expressions inside `bookstack` blocks |
//! | [`stack`] | Spine geometry — heights, palette colors, title truncation |
//! | [`template`] | `{title}`-style spine label formatting |
//! | [`color`] | Hex color math: brightness shifts and contrast text selection |
//! | [`imaging`] | Pure-Rust cover operations: content-bounds trim, constrained resize |
//! | [`cache`] | Cover cache manifest keyed by source and parameter hashes |
//! | [`output`] | CLI output formatting — indexed display of pipeline results |
//!
//! # Design Decisions
//!
//! ## The Vault Is the Database
//!
//! Books live as plain markdown notes. A note with a `pages:` key in its
//! frontmatter is a book; everything else about it (author, status, rating,
//! cover) is optional. Shelves are ordinary notes that embed fenced
//! `bookstack` blocks, so a reading list doubles as prose. There is no
//! database and no separate catalog file — the vault stays fully usable in
//! any markdown editor whether or not spinerack ever runs again.
//!
//! ## Trim Before Resize
//!
//! Scanned and photographed covers usually carry a flat border around the
//! artwork. [`imaging::detect`] votes a background color from the image
//! corners and scans inward from each edge for the first row or column that
//! disagrees with it, so the rendered variant is cropped to the artwork
//! before it is sized. Without the trim step, covers with scanner margins
//! read as wider than their neighbors on a stack.
//!
//! ## Maud Over Template Engines
//!
//! HTML is generated with [Maud](https://maud.lambda.xyz/), a compile-time
//! HTML macro, rather than a runtime template engine:
//!
//! - malformed markup is a build error, not a runtime surprise;
//! - template variables are Rust expressions, so a renamed field breaks the
//!   build instead of a page;
//! - interpolation is escaped by default, which matters when spine labels
//!   come straight from note titles.
//!
//! ## Pure-Rust Imaging
//!
//! Cover rendering uses the `image` crate end to end (Lanczos3 resampling,
//! PNG output). No ImageMagick, no system libraries: the binary is fully
//! self-contained, so a vault rebuilds on any machine with the single
//! executable.
//!
//! # No JavaScript
//!
//! The generated site is plain HTML and CSS. Spines are anchors with inline
//! heights and colors, stacks are flex columns, and the whole tree can be
//! dropped on any static file server. With CSS disabled the site degrades to
//! nested lists of links.

pub mod cache;
pub mod color;
pub mod config;
pub mod frontmatter;
pub mod generate;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod process;
pub mod query;
pub mod scan;
pub mod stack;
pub mod template;
pub mod types;
