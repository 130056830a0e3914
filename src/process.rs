//! Cover processing.
//!
//! Stage 2 of the spinerack build pipeline. Reads the scan manifest,
//! renders each book's cover into a spine-sized PNG variant, and returns
//! the processed manifest for the generate stage.
//!
//! ## What happens per cover
//!
//! 1. Hash the source file and the processing parameters
//! 2. On a cache hit, reuse the finished PNG (copying it if the slug moved)
//! 3. On a miss, run the full pipeline: decode, trim the background margin,
//!    orient for the configured fit, resize, encode
//!
//! Covers are independent, so they are processed in parallel on the rayon
//! thread pool. Progress is reported through an optional mpsc channel; the
//! caller drains it from a printer thread.
//!
//! A cover that cannot be processed (unreadable file, decode failure) is
//! reported and skipped. Its book stays in the manifest and renders as a
//! plain spine.
//!
//! ## Output Structure
//!
//! ```text
//! processed/
//! ├── manifest.json            # processed manifest, written by the caller
//! ├── .cache-manifest.json     # content hashes from previous runs
//! └── covers/
//!     ├── dune.png
//!     └── the-hobbit.png
//! ```

use crate::cache::{self, CacheEntry, CacheManifest, CacheStats};
use crate::config::SiteConfig;
use crate::imaging::{CoverBackend, RustBackend, create_cover_variant};
use crate::scan::Manifest;
use crate::types::{Book, Shelf};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::mpsc::Sender;
use thiserror::Error;

/// Subdirectory of the processed dir (and of the final site) holding
/// cover PNGs.
pub const COVERS_DIR: &str = "covers";

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Manifest produced by the process stage and consumed by generate.
///
/// Books and shelves pass through from the scan manifest unchanged; the
/// stage adds one [`CoverAsset`] per successfully processed cover, keyed
/// by book slug.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProcessedManifest {
    pub books: Vec<Book>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shelves: Vec<Shelf>,
    #[serde(default)]
    pub covers: BTreeMap<String, CoverAsset>,
    pub config: SiteConfig,
}

/// A finished cover file as referenced from the generated site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverAsset {
    /// Path relative to the processed dir, `covers/<slug>.png`. The same
    /// relative path is valid under the site output dir after generate
    /// copies the tree.
    pub file: String,
    pub width: u32,
    pub height: u32,
    pub trimmed: bool,
}

/// Progress events emitted while covers are processed.
///
/// Workers send these from the rayon pool; the caller prints them from a
/// dedicated thread so parallel progress comes out line-atomic.
#[derive(Debug, Clone)]
pub enum ProcessEvent {
    Started {
        cover_count: usize,
    },
    CoverFinished {
        /// 1-based position in the cover list.
        index: usize,
        title: String,
        source_path: String,
        status: CoverStatus,
    },
}

/// How a single cover reached (or failed to reach) its output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverStatus {
    /// Output already on disk from a previous run with identical inputs.
    Cached { width: u32, height: u32 },
    /// Identical content existed under another slug; the finished file
    /// was copied instead of re-rendered.
    Copied { width: u32, height: u32 },
    /// Rendered from source through the full trim and resize path.
    Processed { width: u32, height: u32, trimmed: bool },
    /// Left without a processed cover; the book falls back to a plain
    /// spine.
    Failed { reason: String },
}

pub struct ProcessResult {
    pub manifest: ProcessedManifest,
    pub cache_stats: CacheStats,
    /// Number of covers that could not be processed.
    pub failed: u32,
}

/// One book's cover waiting to be processed.
struct CoverJob<'a> {
    index: usize,
    book: &'a Book,
    cover: &'a str,
}

/// What came out of one cover job. Cache writes are deferred to the end
/// of the run so workers never contend on the manifest.
struct CoverOutcome {
    slug: String,
    status: CoverStatus,
    asset: Option<CoverAsset>,
    entry: Option<(String, CacheEntry)>,
}

/// Process all covers named by the scan manifest at `manifest_path`.
///
/// Cover source paths in the manifest are relative to `source_root`.
/// Outputs land under `processed_dir`. With `use_cache` false the run
/// starts from a cold cache but still records entries for the next one.
pub fn process(
    manifest_path: &Path,
    source_root: &Path,
    processed_dir: &Path,
    use_cache: bool,
    events: Option<Sender<ProcessEvent>>,
) -> Result<ProcessResult, ProcessError> {
    process_with_backend(
        &RustBackend,
        manifest_path,
        source_root,
        processed_dir,
        use_cache,
        events,
    )
}

/// [`process`] with an explicit backend. Tests inject a mock here.
pub fn process_with_backend(
    backend: &impl CoverBackend,
    manifest_path: &Path,
    source_root: &Path,
    processed_dir: &Path,
    use_cache: bool,
    events: Option<Sender<ProcessEvent>>,
) -> Result<ProcessResult, ProcessError> {
    let manifest_content = fs::read_to_string(manifest_path)?;
    let manifest: Manifest = serde_json::from_str(&manifest_content)?;

    fs::create_dir_all(processed_dir.join(COVERS_DIR))?;

    let mut cache_manifest = if use_cache {
        CacheManifest::load(processed_dir)
    } else {
        CacheManifest::empty()
    };

    let jobs: Vec<CoverJob> = manifest
        .books
        .iter()
        .filter_map(|book| book.cover.as_deref().map(|cover| (book, cover)))
        .enumerate()
        .map(|(i, (book, cover))| CoverJob {
            index: i + 1,
            book,
            cover,
        })
        .collect();

    if let Some(sender) = &events {
        let _ = sender.send(ProcessEvent::Started {
            cover_count: jobs.len(),
        });
    }

    let outcomes: Vec<CoverOutcome> = jobs
        .par_iter()
        .map(|job| {
            let outcome = process_cover(
                backend,
                job,
                source_root,
                processed_dir,
                &manifest.config,
                &cache_manifest,
            );
            if let Some(sender) = &events {
                let _ = sender.send(ProcessEvent::CoverFinished {
                    index: job.index,
                    title: job.book.title.clone(),
                    source_path: job.cover.to_string(),
                    status: outcome.status.clone(),
                });
            }
            outcome
        })
        .collect();

    let mut stats = CacheStats::default();
    let mut covers = BTreeMap::new();
    let mut failed = 0u32;
    for outcome in outcomes {
        match &outcome.status {
            CoverStatus::Cached { .. } => stats.hit(),
            CoverStatus::Copied { .. } => stats.copy(),
            CoverStatus::Processed { .. } => stats.miss(),
            CoverStatus::Failed { .. } => failed += 1,
        }
        if let Some((path, entry)) = outcome.entry {
            cache_manifest.insert(path, entry);
        }
        if let Some(asset) = outcome.asset {
            covers.insert(outcome.slug, asset);
        }
    }

    cache_manifest.save(processed_dir)?;

    Ok(ProcessResult {
        manifest: ProcessedManifest {
            books: manifest.books,
            shelves: manifest.shelves,
            covers,
            config: manifest.config,
        },
        cache_stats: stats,
        failed,
    })
}

/// Process one cover: cache lookup first, full render on a miss.
fn process_cover(
    backend: &impl CoverBackend,
    job: &CoverJob,
    source_root: &Path,
    processed_dir: &Path,
    config: &SiteConfig,
    cache_manifest: &CacheManifest,
) -> CoverOutcome {
    let source_path = source_root.join(job.cover);
    let output_rel = format!("{}/{}.png", COVERS_DIR, job.book.slug);
    let output_path = processed_dir.join(&output_rel);

    let source_hash = match cache::hash_file(&source_path) {
        Ok(hash) => hash,
        Err(err) => {
            return CoverOutcome {
                slug: job.book.slug.clone(),
                status: CoverStatus::Failed {
                    reason: format!("cannot read cover source: {err}"),
                },
                asset: None,
                entry: None,
            };
        }
    };

    let params = config.cover_params(source_path, output_path.clone());
    let params_hash = cache::hash_cover_params(&params);

    if let Some(stored) = cache_manifest.find_cached(&source_hash, &params_hash, processed_dir)
        && let Some(cached) = cache_manifest.entries.get(&stored)
    {
        let asset = CoverAsset {
            file: output_rel.clone(),
            width: cached.width,
            height: cached.height,
            trimmed: cached.trimmed,
        };
        let entry = CacheEntry {
            source_hash: source_hash.clone(),
            params_hash: params_hash.clone(),
            width: cached.width,
            height: cached.height,
            trimmed: cached.trimmed,
        };

        if stored == output_rel {
            return CoverOutcome {
                slug: job.book.slug.clone(),
                status: CoverStatus::Cached {
                    width: cached.width,
                    height: cached.height,
                },
                asset: Some(asset),
                entry: Some((output_rel, entry)),
            };
        }

        // Same content under a previous slug: reuse the finished file.
        if fs::copy(processed_dir.join(&stored), &output_path).is_ok() {
            return CoverOutcome {
                slug: job.book.slug.clone(),
                status: CoverStatus::Copied {
                    width: cached.width,
                    height: cached.height,
                },
                asset: Some(asset),
                entry: Some((output_rel, entry)),
            };
        }
        // Copy failed; the index entry was stale. Render from source.
    }

    match create_cover_variant(backend, &params) {
        Ok(variant) => CoverOutcome {
            slug: job.book.slug.clone(),
            status: CoverStatus::Processed {
                width: variant.width,
                height: variant.height,
                trimmed: variant.trimmed,
            },
            asset: Some(CoverAsset {
                file: output_rel.clone(),
                width: variant.width,
                height: variant.height,
                trimmed: variant.trimmed,
            }),
            entry: Some((
                output_rel,
                CacheEntry {
                    source_hash,
                    params_hash,
                    width: variant.width,
                    height: variant.height,
                    trimmed: variant.trimmed,
                },
            )),
        },
        Err(err) => CoverOutcome {
            slug: job.book.slug.clone(),
            status: CoverStatus::Failed {
                reason: err.to_string(),
            },
            asset: None,
            entry: None,
        },
    }
}
