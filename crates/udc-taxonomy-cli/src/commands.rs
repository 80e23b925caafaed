use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::time::Duration;
use udc_taxonomy_config::{Config, CrawlSettings};
use udc_taxonomy_engine::codec::{Codec, Entry};
use udc_taxonomy_engine::crawl::{CrawlOptions, CrawlState, Crawler, RetryPolicy};
use udc_taxonomy_engine::extensions::ExtensionStore;
use udc_taxonomy_engine::hierarchy::{self, Hierarchy};
use udc_taxonomy_engine::io;
use udc_taxonomy_engine::models::Node;
use udc_taxonomy_engine::parsing::parse_records;

use crate::fetch::HttpPageFetcher;

/// Store over the configured data directory, which must already exist.
pub fn extension_store(config: &Config) -> Result<ExtensionStore> {
    io::validate_data_dir(&config.data_dir)
        .context("Set data_dir in the config file, DATA_DIR or --data-dir")?;
    Ok(ExtensionStore::new(&config.data_dir, &config.canonical_file))
}

/// Loads the canonical file plus every addendum.
pub fn open_codec(config: &Config) -> Result<Codec> {
    let store = extension_store(config)?;
    Codec::load(store.canonical_path(), &store).with_context(|| {
        format!(
            "Failed to load classification from {}",
            config.data_dir.display()
        )
    })
}

fn format_entry(entry: &Entry<'_>) -> String {
    format!("{}\t{}", entry.code(), entry.title())
}

fn print_entries(entries: &[Entry<'_>]) {
    for entry in entries {
        println!("{}", format_entry(entry));
    }
}

pub fn lookup(config: &Config, code: &str) -> Result<()> {
    let codec = open_codec(config)?;
    match codec.lookup(code) {
        Some(title) => println!("{title}"),
        None => bail!("Unknown code: {code}"),
    }
    Ok(())
}

pub fn children(config: &Config, code: &str) -> Result<()> {
    let codec = open_codec(config)?;
    let Some(children) = codec.children(code) else {
        bail!("Unknown code: {code}");
    };
    print_entries(&children);
    Ok(())
}

pub fn ancestry(config: &Config, code: &str) -> Result<()> {
    let codec = open_codec(config)?;
    let Some(path) = codec.ancestry(code) else {
        bail!("Unknown code: {code}");
    };
    for (depth, entry) in path.iter().enumerate() {
        println!("{}{}", "  ".repeat(depth), format_entry(entry));
    }
    Ok(())
}

pub fn search(config: &Config, term: &str) -> Result<()> {
    let codec = open_codec(config)?;
    let hits = codec.search(term);
    if hits.is_empty() {
        log::info!("No titles match '{term}'");
    }
    print_entries(&hits);
    Ok(())
}

pub fn validate(config: &Config, expr: &str) -> Result<()> {
    let codec = open_codec(config)?;
    let parts = codec.parse_composite(expr)?;
    print_entries(&parts);
    Ok(())
}

pub fn build(config: &Config, html_path: &Path, output: Option<PathBuf>) -> Result<()> {
    let html = std::fs::read_to_string(html_path)
        .with_context(|| format!("Failed to read {}", html_path.display()))?;
    let records = parse_records(&html, config.verbose);
    if records.is_empty() {
        bail!("No classification records found in {}", html_path.display());
    }

    let hierarchy = hierarchy::build(records);
    write_tree(config, &hierarchy, output)
}

pub fn scrape(config: &Config, output: Option<PathBuf>, fresh: bool) -> Result<()> {
    let journal_path = config.journal_path();
    if fresh {
        discard_journal(&journal_path)?;
    }
    let state = CrawlState::load(&journal_path);
    if !state.is_empty() {
        log::info!(
            "Resuming crawl: {} nodes already expanded (pass --fresh to start over)",
            state.len()
        );
    }

    let fetcher = HttpPageFetcher::new(&config.crawl.base_url)?;
    let crawler = Crawler::new(fetcher, state, crawl_options(&config.crawl, config.verbose));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let records = runtime.block_on(crawler.run())?;

    let hierarchy = hierarchy::build(records);
    write_tree(config, &hierarchy, output)
}

fn discard_journal(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            log::info!("Removed crawl journal {}", path.display());
            Ok(())
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => {
            Err(err).with_context(|| format!("Failed to remove crawl journal {}", path.display()))
        }
    }
}

fn crawl_options(settings: &CrawlSettings, verbose: bool) -> CrawlOptions {
    CrawlOptions {
        max_depth: settings.max_depth,
        retry: RetryPolicy {
            attempts: settings.retry_attempts,
            step: Duration::from_millis(settings.retry_step_ms),
        },
        polite_delay_min: Duration::from_millis(settings.polite_delay_min_ms),
        polite_delay_max: Duration::from_millis(settings.polite_delay_max_ms),
        timeout: Duration::from_secs(settings.timeout_secs),
        verbose,
    }
}

fn write_tree(config: &Config, hierarchy: &Hierarchy, output: Option<PathBuf>) -> Result<()> {
    let output = output.unwrap_or_else(|| config.canonical_path());
    io::save_nodes(&output, &hierarchy.roots)?;

    let fallback = hierarchy.fallback_edges().count();
    println!(
        "Wrote {} roots to {} ({} edges, {fallback} from page parent ids)",
        hierarchy.roots.len(),
        output.display(),
        hierarchy.edges.len()
    );
    Ok(())
}

pub fn addendum_list(config: &Config) -> Result<()> {
    for name in extension_store(config)?.list()? {
        println!("{name}");
    }
    Ok(())
}

pub fn addendum_add(
    config: &Config,
    name: &str,
    from: Option<PathBuf>,
    single: Option<(String, String)>,
) -> Result<()> {
    let nodes = match (from, single) {
        (Some(path), _) => io::load_nodes(&path)?,
        (None, Some((code, title))) => vec![Node::new(code, title)],
        (None, None) => bail!("Nothing to add: pass --from <file> or --code and --title"),
    };
    if nodes.is_empty() {
        bail!("Nothing to add: no entries given");
    }

    let file = extension_store(config)?.add(name, &nodes)?;
    println!("Added {} entries to {file}", nodes.len());
    Ok(())
}

pub fn addendum_delete(config: &Config, name: &str) -> Result<()> {
    let file = extension_store(config)?.delete(name)?;
    println!("Deleted {file}");
    Ok(())
}
