//! CLI output formatting for all pipeline stages.
//!
//! Output is information-centric, not file-centric. The primary display
//! for every entity (book, shelf, cover) is its semantic identity, a
//! positional index plus title, with filesystem paths shown as secondary
//! context on indented `Source:` lines. The output reads as a library
//! inventory while still letting users trace data back to specific
//! notes.
//!
//! Formatting functions are pure (`&T -> Vec<String>`) so tests assert
//! on exact lines; the `print_*` wrappers write them to stdout. Process
//! progress arrives as [`ProcessEvent`]s over a channel and is formatted
//! one event at a time, each event yielding a complete block of lines.

use crate::config::SiteConfig;
use crate::process::{CoverStatus, ProcessEvent, ProcessedManifest};
use crate::scan::Manifest;
use std::path::Path;

/// Zero-padded positional index: 1 becomes "001".
fn format_index(position: usize) -> String {
    format!("{:0>3}", position)
}

/// Four spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

// ============================================================================
// Scan stage
// ============================================================================

pub fn format_scan_output(manifest: &Manifest, source_root: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(format!("Scanned {}", source_root.display()));
    lines.push(String::new());

    lines.push(format!("Books ({})", manifest.books.len()));
    for (pos, book) in manifest.books.iter().enumerate() {
        lines.push(format!(
            "{}{} {} ({} pages)",
            indent(1),
            format_index(pos + 1),
            book.title,
            book.pages
        ));
        lines.push(format!("{}Source: {}", indent(2), book.path));
        if let Some(cover) = &book.cover {
            lines.push(format!("{}Cover: {}", indent(2), cover));
        }
    }

    if !manifest.shelves.is_empty() {
        lines.push(String::new());
        lines.push(format!("Shelves ({})", manifest.shelves.len()));
        for (pos, shelf) in manifest.shelves.iter().enumerate() {
            lines.push(format!(
                "{}{} {}",
                indent(1),
                format_index(pos + 1),
                shelf.title
            ));
            lines.push(format!("{}Source: {}", indent(2), shelf.path));
        }
    }

    lines.push(String::new());
    lines.push("Config".to_string());
    lines.push(format!(
        "{}Stack width: {}px",
        indent(1),
        manifest.config.stack.width
    ));
    lines.push(format!(
        "{}Spine height: {}-{}px",
        indent(1),
        manifest.config.stack.min_spine_height,
        manifest.config.stack.max_spine_height
    ));
    lines.push(format!("{}{}", indent(1), trim_summary(&manifest.config)));

    lines
}

pub fn print_scan_output(manifest: &Manifest, source_root: &Path) {
    for line in format_scan_output(manifest, source_root) {
        println!("{}", line);
    }
}

fn trim_summary(config: &SiteConfig) -> String {
    if config.covers.trim {
        format!("Trim: tolerance {}", config.covers.tolerance)
    } else {
        "Trim: off".to_string()
    }
}

// ============================================================================
// Process stage
// ============================================================================

pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::Started { cover_count } => {
            vec![format!("Covers ({})", cover_count)]
        }
        ProcessEvent::CoverFinished {
            index,
            title,
            source_path,
            status,
        } => vec![
            format!("{}{} {}", indent(1), format_index(*index), title),
            format!("{}Source: {}", indent(2), source_path),
            format!("{}Cover: {}", indent(2), status_line(status)),
        ],
    }
}

fn status_line(status: &CoverStatus) -> String {
    match status {
        CoverStatus::Cached { width, height } => format!("cached {}x{}", width, height),
        CoverStatus::Copied { width, height } => format!("copied {}x{}", width, height),
        CoverStatus::Processed {
            width,
            height,
            trimmed,
        } => {
            if *trimmed {
                format!("processed {}x{} (trimmed)", width, height)
            } else {
                format!("processed {}x{}", width, height)
            }
        }
        CoverStatus::Failed { reason } => format!("failed ({})", reason),
    }
}

// ============================================================================
// Generate stage
// ============================================================================

pub fn format_generate_output(manifest: &ProcessedManifest) -> Vec<String> {
    vec![
        "Site".to_string(),
        format!("{}Books: {}", indent(1), manifest.books.len()),
        format!("{}Shelves: {}", indent(1), manifest.shelves.len()),
        format!("{}Covers: {}", indent(1), manifest.covers.len()),
    ]
}

pub fn print_generate_output(manifest: &ProcessedManifest) {
    for line in format_generate_output(manifest) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::CoverAsset;
    use crate::types::{Book, ReadingStatus, Shelf};
    use std::collections::BTreeMap;

    fn book(title: &str, path: &str, pages: u32, cover: Option<&str>) -> Book {
        Book {
            title: title.to_string(),
            filename: title.to_lowercase(),
            slug: title.to_lowercase().replace(' ', "-"),
            path: path.to_string(),
            pages,
            status: ReadingStatus::Done,
            cover: cover.map(str::to_string),
            ..Default::default()
        }
    }

    fn scan_manifest() -> Manifest {
        Manifest {
            books: vec![
                book("Dune", "reading/dune.md", 412, Some("reading/dune.jpg")),
                book("Emma", "classics/emma.md", 474, None),
            ],
            shelves: vec![Shelf {
                title: "Favorites".to_string(),
                slug: "favorites".to_string(),
                path: "favorites.md".to_string(),
                body: String::new(),
            }],
            config: SiteConfig::default(),
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    #[test]
    fn index_pads_to_three_digits() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1000), "1000");
    }

    // =========================================================================
    // Scan output
    // =========================================================================

    #[test]
    fn scan_output_lists_books_with_sources() {
        let manifest = scan_manifest();
        let lines = format_scan_output(&manifest, Path::new("library"));

        assert_eq!(lines[0], "Scanned library");
        assert!(lines.contains(&"Books (2)".to_string()));
        assert!(lines.contains(&"    001 Dune (412 pages)".to_string()));
        assert!(lines.contains(&"        Source: reading/dune.md".to_string()));
        assert!(lines.contains(&"        Cover: reading/dune.jpg".to_string()));
        assert!(lines.contains(&"    002 Emma (474 pages)".to_string()));
    }

    #[test]
    fn scan_output_omits_cover_line_when_absent() {
        let manifest = scan_manifest();
        let lines = format_scan_output(&manifest, Path::new("library"));

        let emma_pos = lines
            .iter()
            .position(|l| l.contains("002 Emma"))
            .unwrap();
        // The line after Emma's source belongs to the next section, not a
        // cover.
        assert_eq!(lines[emma_pos + 1], "        Source: classics/emma.md");
        assert!(!lines[emma_pos + 2].contains("Cover:"));
    }

    #[test]
    fn scan_output_lists_shelves() {
        let manifest = scan_manifest();
        let lines = format_scan_output(&manifest, Path::new("library"));

        assert!(lines.contains(&"Shelves (1)".to_string()));
        assert!(lines.contains(&"    001 Favorites".to_string()));
        assert!(lines.contains(&"        Source: favorites.md".to_string()));
    }

    #[test]
    fn scan_output_skips_shelf_section_when_empty() {
        let mut manifest = scan_manifest();
        manifest.shelves.clear();
        let lines = format_scan_output(&manifest, Path::new("library"));

        assert!(!lines.iter().any(|l| l.starts_with("Shelves")));
    }

    #[test]
    fn scan_output_summarizes_config() {
        let manifest = scan_manifest();
        let lines = format_scan_output(&manifest, Path::new("library"));

        assert!(lines.contains(&"Config".to_string()));
        assert!(lines.contains(&"    Stack width: 200px".to_string()));
        assert!(lines.contains(&"    Spine height: 30-150px".to_string()));
        assert!(lines.contains(&"    Trim: tolerance 10".to_string()));
    }

    #[test]
    fn scan_output_reports_trim_disabled() {
        let mut manifest = scan_manifest();
        manifest.config.covers.trim = false;
        let lines = format_scan_output(&manifest, Path::new("library"));

        assert!(lines.contains(&"    Trim: off".to_string()));
    }

    // =========================================================================
    // Process events
    // =========================================================================

    #[test]
    fn process_started_formats_header() {
        let lines = format_process_event(&ProcessEvent::Started { cover_count: 3 });
        assert_eq!(lines, vec!["Covers (3)"]);
    }

    #[test]
    fn process_event_formats_processed_cover() {
        let event = ProcessEvent::CoverFinished {
            index: 2,
            title: "Dune".to_string(),
            source_path: "reading/dune.jpg".to_string(),
            status: CoverStatus::Processed {
                width: 150,
                height: 150,
                trimmed: true,
            },
        };
        assert_eq!(
            format_process_event(&event),
            vec![
                "    002 Dune",
                "        Source: reading/dune.jpg",
                "        Cover: processed 150x150 (trimmed)",
            ]
        );
    }

    #[test]
    fn process_event_untrimmed_has_no_suffix() {
        let event = ProcessEvent::CoverFinished {
            index: 1,
            title: "Emma".to_string(),
            source_path: "emma.png".to_string(),
            status: CoverStatus::Processed {
                width: 200,
                height: 100,
                trimmed: false,
            },
        };
        let lines = format_process_event(&event);
        assert_eq!(lines[2], "        Cover: processed 200x100");
    }

    #[test]
    fn process_event_formats_cached_and_copied() {
        let cached = ProcessEvent::CoverFinished {
            index: 1,
            title: "Dune".to_string(),
            source_path: "dune.jpg".to_string(),
            status: CoverStatus::Cached {
                width: 200,
                height: 100,
            },
        };
        assert_eq!(
            format_process_event(&cached)[2],
            "        Cover: cached 200x100"
        );

        let copied = ProcessEvent::CoverFinished {
            index: 1,
            title: "Dune".to_string(),
            source_path: "dune.jpg".to_string(),
            status: CoverStatus::Copied {
                width: 200,
                height: 100,
            },
        };
        assert_eq!(
            format_process_event(&copied)[2],
            "        Cover: copied 200x100"
        );
    }

    #[test]
    fn process_event_formats_failure() {
        let event = ProcessEvent::CoverFinished {
            index: 4,
            title: "Broken".to_string(),
            source_path: "broken.png".to_string(),
            status: CoverStatus::Failed {
                reason: "Decode failed: bad header".to_string(),
            },
        };
        let lines = format_process_event(&event);
        assert_eq!(lines[2], "        Cover: failed (Decode failed: bad header)");
    }

    // =========================================================================
    // Generate output
    // =========================================================================

    #[test]
    fn generate_output_counts_entities() {
        let scan = scan_manifest();
        let mut covers = BTreeMap::new();
        covers.insert(
            "dune".to_string(),
            CoverAsset {
                file: "covers/dune.png".to_string(),
                width: 200,
                height: 100,
                trimmed: false,
            },
        );
        let manifest = ProcessedManifest {
            books: scan.books,
            shelves: scan.shelves,
            covers,
            config: scan.config,
        };

        let lines = format_generate_output(&manifest);
        assert_eq!(
            lines,
            vec!["Site", "    Books: 2", "    Shelves: 1", "    Covers: 1"]
        );
    }
}
