use clap::{Parser, Subcommand};
use spinerack::{config, generate, output, process, scan};
use std::path::PathBuf;

/// Shared flags for commands that process covers.
#[derive(clap::Args, Clone)]
struct CacheArgs {
    /// Disable the processing cache and re-render every cover
    #[arg(long)]
    no_cache: bool,
}

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup — trivial, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "spinerack")]
#[command(about = "Static site generator for book libraries kept as markdown notes")]
#[command(long_about = "\
Static site generator for book libraries kept as markdown notes

Your note vault is the data source. A note whose frontmatter carries a
page count becomes a book; a note containing a fenced `bookstack` query
block becomes a shelf. The site shows books as piles of spines — each
spine's height encodes its page count, and cover scans are trimmed and
sized to the stack before joining the pile.

Vault structure:

  library/
  ├── spinerack.toml               # Site config (optional)
  ├── reading/
  │   ├── dune.md                  # Book note (has `pages:` frontmatter)
  │   └── dune.jpg                 # Cover scan, referenced as `cover: dune.jpg`
  ├── classics/
  │   └── emma.md
  └── favorites.md                 # Shelf note (has a ```bookstack block)

Book frontmatter (all optional except pages):
  title, author, pages, status, rating, date_finished, tags,
  cover, color — unknown keys are kept for title templates

Shelf query blocks:
  ```bookstack
  folder: reading
  tag: scifi
  sort: pages
  order: desc
  limit: 10
  ```

Run 'spinerack gen-config' to generate a documented spinerack.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Vault directory containing book notes
    #[arg(long, default_value = "library", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Directory for intermediate files (manifest, processed covers)
    #[arg(long, default_value = ".spinerack-temp", global = true)]
    temp_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan the vault into a manifest
    Scan,
    /// Render spine-sized cover variants
    Process(CacheArgs),
    /// Produce the final HTML site from processed covers
    Generate,
    /// Run the full pipeline: scan → process → generate
    Build(CacheArgs),
    /// Validate the vault without building
    Check,
    /// Print a stock spinerack.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Scan => {
            let manifest = scan::scan(&cli.source)?;
            std::fs::create_dir_all(&cli.temp_dir)?;
            let manifest_path = cli.temp_dir.join("manifest.json");
            let json = serde_json::to_string_pretty(&manifest)?;
            std::fs::write(&manifest_path, json)?;
            output::print_scan_output(&manifest, &cli.source);
        }
        Command::Process(cache_args) => {
            let scan_manifest_path = cli.temp_dir.join("manifest.json");
            let manifest_content = std::fs::read_to_string(&scan_manifest_path)?;
            let input_manifest: serde_json::Value = serde_json::from_str(&manifest_content)?;
            let site_config: config::SiteConfig =
                serde_json::from_value(input_manifest.get("config").cloned().unwrap_or_default())?;
            init_thread_pool(&site_config.processing);
            let processed_dir = cli.temp_dir.join("processed");
            let result = run_process(
                &scan_manifest_path,
                &cli.source,
                &processed_dir,
                !cache_args.no_cache,
            )?;
            let output_manifest = processed_dir.join("manifest.json");
            let json = serde_json::to_string_pretty(&result.manifest)?;
            std::fs::write(&output_manifest, &json)?;
            print_process_summary(&result);
        }
        Command::Generate => {
            let processed_dir = cli.temp_dir.join("processed");
            let processed_manifest_path = processed_dir.join("manifest.json");
            generate::generate(&processed_manifest_path, &processed_dir, &cli.output)?;
            let manifest_content = std::fs::read_to_string(&processed_manifest_path)?;
            let manifest: process::ProcessedManifest = serde_json::from_str(&manifest_content)?;
            output::print_generate_output(&manifest);
        }
        Command::Build(cache_args) => {
            std::fs::create_dir_all(&cli.temp_dir)?;

            println!("==> Stage 1: Scanning {}", cli.source.display());
            let manifest = scan::scan(&cli.source)?;
            let scan_manifest_path = cli.temp_dir.join("manifest.json");
            let json = serde_json::to_string_pretty(&manifest)?;
            std::fs::write(&scan_manifest_path, json)?;
            output::print_scan_output(&manifest, &cli.source);

            println!("==> Stage 2: Processing covers");
            init_thread_pool(&manifest.config.processing);
            let processed_dir = cli.temp_dir.join("processed");
            let result = run_process(
                &scan_manifest_path,
                &cli.source,
                &processed_dir,
                !cache_args.no_cache,
            )?;
            let processed_manifest_path = processed_dir.join("manifest.json");
            let json = serde_json::to_string_pretty(&result.manifest)?;
            std::fs::write(&processed_manifest_path, &json)?;
            print_process_summary(&result);

            println!("==> Stage 3: Generating HTML → {}", cli.output.display());
            generate::generate(&processed_manifest_path, &processed_dir, &cli.output)?;
            output::print_generate_output(&result.manifest);

            println!("==> Build complete: {}", cli.output.display());
        }
        Command::Check => {
            println!("==> Checking {}", cli.source.display());
            let manifest = scan::scan(&cli.source)?;
            output::print_scan_output(&manifest, &cli.source);
            println!("==> Vault is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Run the process stage with a printer thread draining progress events.
fn run_process(
    scan_manifest_path: &std::path::Path,
    source: &std::path::Path,
    processed_dir: &std::path::Path,
    use_cache: bool,
) -> Result<process::ProcessResult, Box<dyn std::error::Error>> {
    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_process_event(&event) {
                println!("{}", line);
            }
        }
    });
    let result = process::process(
        scan_manifest_path,
        source,
        processed_dir,
        use_cache,
        Some(tx),
    )?;
    printer.join().unwrap();
    Ok(result)
}

fn print_process_summary(result: &process::ProcessResult) {
    println!("Cache: {}", result.cache_stats);
    if result.failed > 0 {
        println!("Warning: {} covers failed; their books render as plain spines", result.failed);
    }
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores — user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
