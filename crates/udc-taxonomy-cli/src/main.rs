use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use udc_taxonomy_config::Config;

mod browse;
mod commands;
mod fetch;

#[derive(Debug, Parser)]
#[command(name = "udc", version, about = "Query, extend and rebuild a UDC classification")]
struct Cli {
    /// Log every parsing and crawl step
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Data directory holding the canonical file and addenda
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the title of an exact code
    Lookup { code: String },
    /// List the direct children of a code
    Children { code: String },
    /// Print the path from the root down to a code
    Ancestry { code: String },
    /// Case-insensitive search over titles
    Search { term: String },
    /// Check that every part of a composite expression is known
    Validate { expr: String },
    /// Rebuild the tree from a saved classification page
    Build {
        html: PathBuf,
        /// Where to write the tree (defaults to the canonical file)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Crawl the online classification and write the rebuilt tree
    Scrape {
        /// Where to write the tree (defaults to the canonical file)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Forget the crawl journal and fetch every page again
        #[arg(long)]
        fresh: bool,
    },
    /// Manage local addendum files
    Addendum {
        #[command(subcommand)]
        action: AddendumAction,
    },
    /// Browse the classification tree interactively
    Browse,
}

#[derive(Debug, Subcommand)]
enum AddendumAction {
    /// List addendum files in the data directory
    List,
    /// Append entries to an addendum, creating it if needed
    Add {
        /// Addendum name, e.g. `tools` for udc_addendum_tools.yaml
        #[arg(default_value = "")]
        name: String,
        /// YAML file with the entries to append
        #[arg(long, conflicts_with_all = ["code", "title"])]
        from: Option<PathBuf>,
        /// Code of a single entry to append
        #[arg(long, requires = "title")]
        code: Option<String>,
        /// Title of the single entry
        #[arg(long, requires = "code")]
        title: Option<String>,
    },
    /// Delete an addendum file
    Delete { name: String },
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::resolve()?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    config.verbose |= cli.verbose;

    init_logging(config.verbose);
    log::debug!("Config path: {}", Config::config_path().display());
    log::debug!("Data directory: {}", config.data_dir.display());

    match cli.command {
        Command::Lookup { code } => commands::lookup(&config, &code),
        Command::Children { code } => commands::children(&config, &code),
        Command::Ancestry { code } => commands::ancestry(&config, &code),
        Command::Search { term } => commands::search(&config, &term),
        Command::Validate { expr } => commands::validate(&config, &expr),
        Command::Build { html, output } => commands::build(&config, &html, output),
        Command::Scrape { output, fresh } => commands::scrape(&config, output, fresh),
        Command::Addendum { action } => match action {
            AddendumAction::List => commands::addendum_list(&config),
            AddendumAction::Add {
                name,
                from,
                code,
                title,
            } => commands::addendum_add(&config, &name, from, code.zip(title)),
            AddendumAction::Delete { name } => commands::addendum_delete(&config, &name),
        },
        Command::Browse => browse::run(&config),
    }
}
