use std::fs;
use std::path::PathBuf;
use std::process::exit;

use clap::{Parser, Subcommand};
use dotenvy::dotenv;

use scriptura_backend::{get_app_data, init_app_data};
use scriptura_backend::page_load::PageSource;
use scriptura_backend::types::IngestOptions;
use scriptura_backend::validation;
use scriptura_backend::workflow::run_ingest_workflow;

#[derive(Parser, Debug)]
#[command(author, version, about = "Scriptura CLI", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Optional path to the Scriptura data directory.
    /// If not provided, the SCRIPTURA_DIR environment variable will be used.
    #[arg(long, global = true, value_name = "DIRECTORY_PATH", env = "SCRIPTURA_DIR")]
    scriptura_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load, clean and ingest a page source into the archive
    #[command(arg_required_else_help = true)]
    Ingest {
        /// Path to the source: a PDF file, or a directory of page-NNNN.txt files
        #[arg(value_name = "SOURCE_PATH")]
        source: PathBuf,

        /// Start from this page number, ignoring the resume checkpoint
        #[arg(long)]
        from_page: Option<i32>,

        /// Process at most this many pages
        #[arg(long)]
        limit: Option<usize>,

        /// Discard checkpoints and start the workflow over
        #[arg(long, default_value_t = false)]
        fresh: bool,
    },

    /// Audit the reconstructed archive and print a report
    Validate {
        /// Render the report as HTML instead of plain text
        #[arg(long, default_value_t = false)]
        html: bool,

        /// Write the report to a file instead of stdout
        #[arg(long, value_name = "FILE_PATH")]
        out: Option<PathBuf>,
    },

    /// Show page counts, entity counts and workflow checkpoints
    Status,
}

fn cmd_ingest(
    source: &PathBuf,
    from_page: Option<i32>,
    limit: Option<usize>,
    fresh: bool,
) -> Result<(), String> {
    let source = PageSource::detect(source).map_err(|e| e.to_string())?;

    let options = IngestOptions {
        from_page,
        limit,
        fresh,
    };

    let app_data = get_app_data();
    let stats = run_ingest_workflow(
        &app_data.dbm,
        &source,
        &options,
        &app_data.app_settings_cache,
    ).map_err(|e| e.to_string())?;

    println!(
        "Ingest finished: {} pages processed, {} skipped, {} failed",
        stats.pages_processed, stats.pages_skipped, stats.pages_failed
    );
    if stats.pages_failed > 0 {
        println!("Failed pages are recorded in the archive, see 'scriptura status'.");
    }

    Ok(())
}

fn cmd_validate(html: bool, out: Option<PathBuf>) -> Result<(), String> {
    let app_data = get_app_data();
    let mut conn = app_data.dbm.archive.get_conn().map_err(|e| e.to_string())?;

    let report = validation::validate_archive(&mut conn).map_err(|e| e.to_string())?;

    let rendered = if html {
        validation::render_html(&report)
    } else {
        validation::render_text(&report).map_err(|e| e.to_string())?
    };

    match out {
        Some(path) => {
            fs::write(&path, rendered)
                .map_err(|e| format!("Failed to write report to {:?}: {}", path, e))?;
            println!("Report written to {:?}", path);
        }
        None => {
            println!("{}", rendered);
        }
    }

    Ok(())
}

fn cmd_status() -> Result<(), String> {
    let app_data = get_app_data();
    let summary = app_data.status_summary().map_err(|e| e.to_string())?;

    println!("Pages loaded:  {}", summary.pages);
    println!("Books:         {}", summary.books);
    println!("Chapters:      {}", summary.chapters);
    println!("Verses:        {}", summary.verses);
    println!("Notes:         {}", summary.notes);
    println!("Images:        {}", summary.images);
    println!("Page errors:   {}", summary.page_errors);

    if summary.checkpoints.is_empty() {
        println!("No workflow checkpoints.");
    } else {
        println!("Checkpoints:");
        for (phase, last_page) in &summary.checkpoints {
            println!("  {}: page {}", phase, last_page);
        }
    }

    Ok(())
}

fn main() {
    if dotenv().is_err() {
        println!("Info: No .env file found or failed to load.");
    }

    let cli = Cli::parse();

    // Determine the base Scriptura directory before touching the database.
    // Precedence:
    // - given with --scriptura-dir
    // - set with env var SCRIPTURA_DIR
    // - platform data directory
    if let Some(path) = &cli.scriptura_dir {
        if !path.is_dir() {
            eprintln!("Error: Directory does not exist or is not a directory: {:?}", path);
            exit(1);
        }
        // Clap already read it from the flag or env; make it visible to
        // the backend's own env lookup.
        unsafe { std::env::set_var("SCRIPTURA_DIR", path); }
    }

    init_app_data();

    let command_result = match cli.command {
        Commands::Ingest { source, from_page, limit, fresh } => {
            cmd_ingest(&source, from_page, limit, fresh)
        }

        Commands::Validate { html, out } => {
            cmd_validate(html, out)
        }

        Commands::Status => {
            cmd_status()
        }
    };

    if let Err(e) = command_result {
        eprintln!("Error executing command: {}", e);
        exit(1);
    }
}
