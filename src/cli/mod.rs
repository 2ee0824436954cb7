//! Command-line interface for bookshelf.
//!
//! Provides commands for adding, listing and searching books, inspecting
//! the backing file, and the interactive menu (the default when no
//! subcommand is given).

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::config::{self, ResolvedConfig, YearRange};
use crate::domain::Record;
use crate::library::{AddOutcome, Catalog, FileStore, LoadEnd};

pub mod menu;

pub use menu::Menu;

const TITLE_WIDTH: usize = 25;
const AUTHOR_WIDTH: usize = 25;
const YEAR_WIDTH: usize = 5;
const RULE_WIDTH: usize = 59;

/// bookshelf - Console book catalog
#[derive(Parser, Debug)]
#[command(name = "bookshelf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Backing file (overrides config file and BOOKSHELF_FILE)
    #[arg(short, long, global = true)]
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a book
    Add {
        /// Book title
        title: String,

        /// Author name
        author: String,

        /// Year published (digits only, within the configured range)
        year: String,
    },

    /// List all books
    List {
        /// Re-read the backing file instead of the loaded catalog
        #[arg(long)]
        from_disk: bool,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Search for a book by exact title (case-insensitive)
    Search {
        /// Title to look for
        title: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show the book at a zero-based position
    Show {
        /// Position in insertion order
        index: usize,
    },

    /// Show how many books are loaded
    Count,

    /// Check the backing file for unreadable or malformed data
    Check,

    /// Show resolved configuration (debug)
    Config,

    /// Interactive menu
    Menu,
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        let cfg = config::config()?;
        let data_file = self.file.unwrap_or_else(|| cfg.data_file.clone());
        let command = self.command.unwrap_or(Commands::Menu);

        let open = || open_catalog(&data_file, cfg.capacity);

        match command {
            Commands::Add {
                title,
                author,
                year,
            } => add_book(&mut open()?, title, author, &year, cfg.years),
            Commands::List { from_disk, json } => list_books(&open()?, from_disk, json),
            Commands::Search { title, json } => search_book(&open()?, &title, json),
            Commands::Show { index } => show_book(&open()?, index),
            Commands::Count => {
                let catalog = open()?;
                println!("{} of {} books", catalog.count(), catalog.capacity());
                Ok(())
            }
            Commands::Check => {
                check_store(&open()?, &data_file);
                Ok(())
            }
            Commands::Config => {
                show_config(cfg, &data_file);
                Ok(())
            }
            Commands::Menu => {
                let mut catalog = open()?;
                let stdin = io::stdin();
                let stdout = io::stdout();
                Menu::new(stdin.lock(), stdout.lock(), cfg.years)
                    .run(&mut catalog)
                    .context("Interactive menu failed")
            }
        }
    }
}

/// Open the catalog at `path`, creating its directory if needed
fn open_catalog(path: &Path, capacity: usize) -> Result<Catalog<FileStore>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let (catalog, summary) = Catalog::open(FileStore::new(path), capacity);
    tracing::debug!(loaded = summary.loaded, end = ?summary.end, "Catalog ready");

    Ok(catalog)
}

/// Accept a year made only of ASCII digits that falls inside `years`
pub fn parse_year(input: &str, years: YearRange) -> Option<i32> {
    if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let year = input.parse::<i32>().ok()?;
    years.contains(year).then_some(year)
}

/// Render books as the fixed-width Title / Author / Year table
pub fn render_table(records: &[Record]) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{:<tw$}{:<aw$}{:<yw$}\n",
        "Title",
        "Author",
        "Year",
        tw = TITLE_WIDTH,
        aw = AUTHOR_WIDTH,
        yw = YEAR_WIDTH
    ));
    out.push_str(&"-".repeat(RULE_WIDTH));
    out.push('\n');

    for record in records {
        out.push_str(&format!(
            "{:<tw$}{:<aw$}{:<yw$}\n",
            record.title,
            record.author,
            record.year_published,
            tw = TITLE_WIDTH,
            aw = AUTHOR_WIDTH,
            yw = YEAR_WIDTH
        ));
    }

    out
}

/// Warning text for a book that stayed in memory only
pub fn unpersisted_warning(outcome: &AddOutcome) -> Option<String> {
    match outcome {
        AddOutcome::Persisted(_) => None,
        AddOutcome::Unpersisted { reason, .. } => Some(format!(
            "Warning: the book was added for this session but could not be saved: {}",
            reason
        )),
    }
}

fn add_book(
    catalog: &mut Catalog<FileStore>,
    title: String,
    author: String,
    year: &str,
    years: YearRange,
) -> Result<()> {
    let Some(year) = parse_year(year, years) else {
        anyhow::bail!(
            "Invalid year '{}'. Please enter a year between {} and {}",
            year,
            years.min,
            years.max
        );
    };

    let outcome = catalog.add(title, author, year)?;
    println!("Book added successfully!");
    if let Some(warning) = unpersisted_warning(&outcome) {
        eprintln!("{}", warning);
    }

    Ok(())
}

fn list_books(catalog: &Catalog<FileStore>, from_disk: bool, json: bool) -> Result<()> {
    let snapshot;
    let records = if from_disk {
        snapshot = catalog.disk_snapshot();
        if let LoadEnd::Unreadable(e) = &snapshot.end {
            eprintln!("Unable to open the file: {}", e);
        }
        &snapshot.records[..]
    } else {
        catalog.list_all()
    };

    if json {
        println!("{}", serde_json::to_string_pretty(records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No books in the library.");
        return Ok(());
    }

    println!();
    print!("{}", render_table(records));
    println!("\nTotal: {} books", records.len());

    Ok(())
}

fn search_book(catalog: &Catalog<FileStore>, title: &str, json: bool) -> Result<()> {
    let found = catalog.search(title);

    if json {
        println!("{}", serde_json::to_string_pretty(&found)?);
        return Ok(());
    }

    match found {
        Some(record) => {
            println!("Book found!");
            println!("{}", record);
        }
        None => println!("Book not found!"),
    }

    Ok(())
}

fn show_book(catalog: &Catalog<FileStore>, index: usize) -> Result<()> {
    let record = catalog.get(index)?;
    println!("Book #{}", index);
    println!("{}", record);
    Ok(())
}

fn check_store(catalog: &Catalog<FileStore>, data_file: &Path) {
    let snapshot = catalog.disk_snapshot();

    println!("File:      {}", data_file.display());
    println!(
        "Loaded:    {} of {} books",
        catalog.count(),
        catalog.capacity()
    );
    println!("On disk:   {} complete books", snapshot.records.len());

    match &snapshot.end {
        LoadEnd::EndOfInput => println!("Status:    ok"),
        LoadEnd::CapacityReached => println!("Status:    stopped at capacity"),
        LoadEnd::Malformed { line, error } => {
            println!(
                "Status:    data from line {} on is ignored ({})",
                line, error
            );
        }
        LoadEnd::Unreadable(e) => println!("Status:    unreadable ({})", e),
    }

    let beyond = snapshot.records.len().saturating_sub(catalog.capacity());
    if beyond > 0 {
        println!(
            "Note:      {} books beyond capacity are not loaded",
            beyond
        );
    }
}

fn show_config(cfg: &ResolvedConfig, data_file: &Path) {
    println!("Bookshelf Configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Home:       {}", cfg.home.display());
    println!("  Data file:  {}", data_file.display());
    println!();
    println!("Catalog:");
    println!("  Capacity:   {} books", cfg.capacity);
    println!("  Years:      {}-{}", cfg.years.min, cfg.years.max);
}
