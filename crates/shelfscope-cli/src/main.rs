use std::io::BufRead;
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shelfscope_core::{
    AppConfig, Book, CatalogConfig, CatalogStore, ExitCode, JsonDirStore, RegisterOutcome,
    VolumeKey, VolumeSlot,
};
use shelfscope_search::{
    CoverFinder, GoogleBooksSource, Intake, IntakeService, ScannedCode, SearchError,
    VolumeEstimator, accept_scan,
};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "shelfscope",
    about = "Track owned volumes of book series and find the ones you're missing",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format. Also enabled by setting SHELFSCOPE_JSON=1.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a book from a title ("Series 5巻") or an ISBN.
    Add {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
        /// Replace an existing entry with the same series and volume.
        #[arg(long)]
        overwrite: bool,
    },

    /// Read decoded barcodes from stdin (one per line, optionally
    /// prefixed `ean_13:`, `ean_8:` or `code_128:`) and register the first ISBN.
    Scan {
        #[arg(long)]
        overwrite: bool,
    },

    /// Register a volume that is missing from a series.
    Fill {
        series: String,
        volume: u32,
        #[arg(long)]
        overwrite: bool,
    },

    /// List series on the shelf with owned/max counts.
    Shelf,

    /// Show the volume grid of one series.
    Series { name: String },

    /// Set the last volume number of a series by hand.
    SetMax { series: String, count: String },

    /// Estimate the last volume number of a series from search results.
    Estimate { series: String },

    /// Cover management.
    Cover {
        #[command(subcommand)]
        action: CoverAction,
    },

    /// Delete a book.
    Delete {
        series: String,
        #[arg(long)]
        volume: Option<u32>,
        #[arg(long)]
        confirm: bool,
    },

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

// ─── Cover Actions ──────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum CoverAction {
    /// List ranked cover candidates.
    List {
        series: String,
        #[arg(long)]
        volume: Option<u32>,
        /// Number of result pages to merge.
        #[arg(long, default_value = "1")]
        pages: u32,
    },
    /// Use a specific image URL as the cover.
    Set {
        series: String,
        url: String,
        #[arg(long)]
        volume: Option<u32>,
    },
    /// Fetch a new cover (ISBN first, then search).
    Refetch {
        series: String,
        #[arg(long)]
        volume: Option<u32>,
    },
}

// ─── Config Actions ─────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective config.
    Show,
    /// Print the config file path.
    Path,
}

// ─── Main ───────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shelfscope=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let start = Instant::now();
    let cli = Cli::parse();
    let json_output = cli.json || std::env::var("SHELFSCOPE_JSON").as_deref() == Ok("1");

    let out = Output { json: json_output, start };

    if let Err(e) = run(cli.command, &out).await {
        out.fail(exit_code_for(&e), "error", &format!("{e:#}"));
    }
}

async fn run(command: Commands, out: &Output) -> Result<()> {
    let mut config = AppConfig::load()?;
    if let Ok(dir) = std::env::var("SHELFSCOPE_DATA_DIR") {
        config.set_data_dir(dir.into());
    }

    match command {
        Commands::Add { text, overwrite } => {
            let raw = text.join(" ");
            let mut store = open_store(&config)?;
            let source = GoogleBooksSource::from_config(&config.search)?;
            let finder = CoverFinder::from_config(&config.covers, &config.search);
            let intake = IntakeService::new(&finder, &source, &source);

            match intake.resolve_input(&raw).await {
                Intake::Empty => out.fail(ExitCode::InvalidArgs, "empty_input", "Nothing to add."),
                Intake::IsbnNotFound(isbn) => out.fail(
                    ExitCode::NotFound,
                    "isbn_not_found",
                    &format!("No book found for ISBN {isbn}. Check the digits."),
                ),
                Intake::Draft(book) => register(&mut store, book, overwrite, &config.catalog, out)?,
            }
        }

        Commands::Scan { overwrite } => {
            let mut accepted = None;
            for line in std::io::stdin().lock().lines() {
                let line = line?;
                let codes: Vec<ScannedCode> = ScannedCode::parse_line(&line).into_iter().collect();
                if let Some(isbn) = accept_scan(&codes) {
                    if !out.json {
                        eprintln!("Detected: {isbn}");
                    }
                    accepted = Some(isbn);
                    break;
                }
            }
            let Some(isbn) = accepted else {
                out.fail(ExitCode::NotFound, "no_barcode", "No ISBN barcode detected.");
            };

            let mut store = open_store(&config)?;
            let source = GoogleBooksSource::from_config(&config.search)?;
            let finder = CoverFinder::from_config(&config.covers, &config.search);
            let intake = IntakeService::new(&finder, &source, &source);

            match intake.resolve_isbn(isbn).await {
                Intake::Draft(book) => register(&mut store, book, overwrite, &config.catalog, out)?,
                Intake::IsbnNotFound(isbn) => out.fail(
                    ExitCode::NotFound,
                    "isbn_not_found",
                    &format!("No book found for ISBN {isbn}."),
                ),
                Intake::Empty => out.fail(ExitCode::InvalidArgs, "empty_input", "Nothing to add."),
            }
        }

        Commands::Fill { series, volume, overwrite } => {
            let volume = require_volume(&config.catalog, volume, out);
            let mut store = open_store(&config)?;
            let key = VolumeKey::new(&series, Some(volume));
            if !overwrite && store.catalog().contains(&key) {
                already_registered(&key, out);
            }
            let source = GoogleBooksSource::from_config(&config.search)?;
            let finder = CoverFinder::from_config(&config.covers, &config.search);
            let intake = IntakeService::new(&finder, &source, &source);

            let book = intake.missing_volume(&series, volume).await;
            register(&mut store, book, overwrite, &config.catalog, out)?;
        }

        Commands::Shelf => {
            let store = open_store(&config)?;
            let summaries = store.catalog().summaries();

            if out.json {
                out.ok(serde_json::json!({ "items": summaries, "total": summaries.len() }))?;
            } else if summaries.is_empty() {
                println!("Shelf is empty. Use `shelfscope add` to register books.");
            } else {
                for s in &summaries {
                    println!("{badge:>8}  {series}", badge = s.badge(), series = s.series);
                }
            }
        }

        Commands::Series { name } => {
            let store = open_store(&config)?;
            let view = store.build_series_view(&name);
            if view.slots.is_empty() {
                out.fail(ExitCode::NotFound, "not_found", &format!("No books in series: {name}"));
            }

            if out.json {
                out.ok(serde_json::json!({
                    "view": view,
                    "owned": view.owned_count(),
                    "missing": view.missing_volumes(),
                }))?;
            } else {
                println!("{}  [{}]", view.series, view.status_line());
                for slot in &view.slots {
                    match slot {
                        VolumeSlot::Owned { volume, book } => println!(
                            "  {volume:>4}巻  owned    {}",
                            book.cover.as_deref().unwrap_or("-")
                        ),
                        VolumeSlot::Missing { volume } => println!("  {volume:>4}巻  missing"),
                        VolumeSlot::Unnumbered { book } => println!(
                            "     本  {}  {}",
                            book.title,
                            book.cover.as_deref().unwrap_or("-")
                        ),
                    }
                }
            }
        }

        Commands::SetMax { series, count } => {
            let n = require_volume(&config.catalog, parse_count(&count), out);

            let mut store = open_store(&config)?;
            store.set_series_max(&series, n)?;
            let effective = store.catalog().effective_max(&series);
            if out.json {
                out.ok(serde_json::json!({ "series": series, "declared": n, "effective_max": effective }))?;
            } else {
                println!("{series}: last volume set to {n} (effective {effective})");
            }
        }

        Commands::Estimate { series } => {
            let mut store = open_store(&config)?;
            let source = GoogleBooksSource::from_config(&config.search)?;
            let estimator = VolumeEstimator::from_config(&config.estimate, &config.search)
                .with_max_volume(config.catalog.max_volume);

            let guess = estimator.estimate(&series, &source).await;
            if guess == 0 {
                out.fail(
                    ExitCode::NotFound,
                    "no_estimate",
                    "Could not estimate. Set it by hand with `shelfscope set-max`.",
                );
            }
            let merged = store.apply_estimate(&series, guess)?;
            if out.json {
                out.ok(serde_json::json!({ "series": series, "estimate": guess, "declared": merged }))?;
            } else {
                println!("{series}: last volume set to {merged} (estimated)");
            }
        }

        Commands::Cover { action } => match action {
            CoverAction::List { series, volume, pages } => {
                let source = GoogleBooksSource::from_config(&config.search)?;
                let finder = CoverFinder::from_config(&config.covers, &config.search);

                let Some(mut picker) = finder.open_picker(&series, volume, &source).await else {
                    out.fail(
                        ExitCode::NotFound,
                        "no_candidates",
                        "No cover candidates found. Registering by ISBN improves accuracy.",
                    );
                };
                for _ in 1..pages {
                    if picker.load_more(&finder, &source).await == 0 {
                        break;
                    }
                }

                if out.json {
                    out.ok(serde_json::json!({ "items": picker.urls, "page": picker.page }))?;
                } else {
                    for url in &picker.urls {
                        println!("{url}");
                    }
                }
            }

            CoverAction::Set { series, url, volume } => {
                let Some(url) = cover_url(&url) else {
                    out.fail(ExitCode::InvalidArgs, "invalid_url", "Cover URL must not be empty.");
                };
                let mut store = open_store(&config)?;
                let key = VolumeKey::new(series, volume);
                if !store.set_cover(&key, url)? {
                    out.fail(ExitCode::NotFound, "not_found", &format!("Book not found: {key}"));
                }
                out.done(&format!("Cover updated: {key}"), serde_json::json!({ "key": key, "cover": url }))?;
            }

            CoverAction::Refetch { series, volume } => {
                let mut store = open_store(&config)?;
                let key = VolumeKey::new(series, volume);
                let Some(book) = store.find(&key).cloned() else {
                    out.fail(ExitCode::NotFound, "not_found", &format!("Book not found: {key}"));
                };

                let source = GoogleBooksSource::from_config(&config.search)?;
                let finder = CoverFinder::from_config(&config.covers, &config.search);
                let Some(cover) = finder.refetch(&book, &source, &source).await else {
                    out.fail(
                        ExitCode::NotFound,
                        "no_cover",
                        "No cover found. Registering by ISBN improves accuracy.",
                    );
                };
                store.set_cover(&key, cover.as_str())?;
                out.done(&format!("Cover updated: {key}"), serde_json::json!({ "key": key, "cover": cover }))?;
            }
        },

        Commands::Delete { series, volume, confirm } => {
            let key = VolumeKey::new(series, volume);
            if !confirm {
                out.fail(
                    ExitCode::ConfirmRequired,
                    "confirm_required",
                    &format!("Add --confirm to delete \"{key}\"."),
                );
            }
            let mut store = open_store(&config)?;
            if store.delete_book(&key)?.is_none() {
                out.fail(ExitCode::NotFound, "not_found", &format!("Book not found: {key}"));
            }
            out.done(&format!("Deleted: {key}"), serde_json::json!({ "deleted": key }))?;
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                if out.json {
                    out.ok(serde_json::to_value(&config)?)?;
                } else {
                    print!("{}", toml::to_string_pretty(&config)?);
                }
            }
            ConfigAction::Path => {
                let path = AppConfig::config_path();
                if out.json {
                    out.ok(serde_json::json!({ "path": path }))?;
                } else {
                    println!("{}", path.display());
                }
            }
        },
    }

    Ok(())
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn open_store(config: &AppConfig) -> Result<CatalogStore<JsonDirStore>> {
    let store = CatalogStore::open(JsonDirStore::new(config.data_dir()))?;
    let report = store.load_report();
    if report.migrated_legacy > 0 {
        tracing::info!(books = report.migrated_legacy, "migrated legacy records");
    }
    Ok(store)
}

fn exit_code_for(error: &anyhow::Error) -> ExitCode {
    if error.downcast_ref::<SearchError>().is_some() {
        ExitCode::NetworkError
    } else {
        ExitCode::GeneralError
    }
}

/// Digits of a typed count, ignoring anything else; 0 when there are none.
fn parse_count(raw: &str) -> u32 {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

fn cover_url(raw: &str) -> Option<&str> {
    Some(raw.trim()).filter(|url| !url.is_empty())
}

fn require_volume(catalog: &CatalogConfig, volume: u32, out: &Output) -> u32 {
    catalog.accept_volume(volume).unwrap_or_else(|| {
        out.fail(
            ExitCode::InvalidArgs,
            "invalid_volume",
            &format!("Volume must be between 1 and {}.", catalog.max_volume),
        )
    })
}

fn already_registered(key: &VolumeKey, out: &Output) -> ! {
    out.fail(
        ExitCode::ConfirmRequired,
        "already_registered",
        &format!("\"{key}\" is already registered. Re-run with --overwrite to replace it."),
    )
}

fn register(
    store: &mut CatalogStore<JsonDirStore>,
    book: Book,
    overwrite: bool,
    catalog: &CatalogConfig,
    out: &Output,
) -> Result<()> {
    if let Some(volume) = book.volume {
        require_volume(catalog, volume, out);
    }
    let key = book.key();
    match store.register(book, |_| overwrite)? {
        RegisterOutcome::Declined => already_registered(&key, out),
        outcome => {
            let verb = if outcome == RegisterOutcome::Replaced { "Replaced" } else { "Added" };
            let book = store.find(&key).cloned();
            out.done(
                &format!("{verb}: {key}"),
                serde_json::json!({ "outcome": verb.to_lowercase(), "book": book }),
            )
        }
    }
}

struct Output {
    json: bool,
    start: Instant,
}

impl Output {
    fn ok(&self, data: serde_json::Value) -> Result<()> {
        print_json(&serde_json::json!({
            "status": "ok",
            "data": data,
            "meta": { "duration_ms": self.start.elapsed().as_millis() as u64 }
        }))
    }

    /// Human message or JSON payload for a completed mutation.
    fn done(&self, message: &str, data: serde_json::Value) -> Result<()> {
        if self.json {
            self.ok(data)
        } else {
            println!("{message}");
            Ok(())
        }
    }

    fn fail(&self, code: ExitCode, kind: &str, message: &str) -> ! {
        if self.json {
            let body = serde_json::json!({
                "status": "error",
                "error": kind,
                "message": message,
                "meta": { "duration_ms": self.start.elapsed().as_millis() as u64 }
            });
            println!("{body}");
        } else {
            eprintln!("{message}");
        }
        std::process::exit(code.code());
    }
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_count_keeps_digits_only() {
        assert_eq!(parse_count("12巻"), 12);
        assert_eq!(parse_count(" 1,000 "), 1000);
        assert_eq!(parse_count("abc"), 0);
        assert_eq!(parse_count("99999999999"), 0);
    }

    #[test]
    fn test_blank_cover_url_is_rejected() {
        assert_eq!(cover_url(""), None);
        assert_eq!(cover_url("   "), None);
        assert_eq!(cover_url(" https://c/1 "), Some("https://c/1"));
    }

    #[test]
    fn test_search_errors_map_to_network_exit() {
        let network = anyhow::Error::new(SearchError::ApiError("google_books".into(), "HTTP 503".into()));
        assert_eq!(exit_code_for(&network), ExitCode::NetworkError);

        let storage = anyhow::Error::new(shelfscope_core::ShelfError::Storage("disk".into()));
        assert_eq!(exit_code_for(&storage), ExitCode::GeneralError);
    }
}
