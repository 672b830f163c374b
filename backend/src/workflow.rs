//! Ingest workflow orchestration.
//!
//! Sequences the load, cleanup and ingest phases over the shared archive
//! and keeps per-phase checkpoints so an interrupted run resumes instead
//! of starting over. Each page's ingestion runs in its own transaction:
//! a failing page rolls back alone, gets recorded in `page_errors`, and
//! the run continues. Pages are processed strictly in page order on one
//! connection; the ingestion session depends on sequential folding.

use std::env;

use anyhow::Result;
use diesel::prelude::*;

use crate::app_settings::AppSettings;
use crate::db::{archive, DbManager};
use crate::db::archive_models::Page;
use crate::ingest::{parse_page, IngestSession};
use crate::logger::{error, info, warn};
use crate::page_classify::PageCategory;
use crate::page_load::{self, PageSource};
use crate::types::{IngestOptions, IngestStats, WorkflowPhase};

/// Run the full load -> cleanup -> ingest workflow against a page source.
pub fn run_ingest_workflow(
    dbm: &DbManager,
    source: &PageSource,
    options: &IngestOptions,
    settings: &AppSettings,
) -> Result<IngestStats> {
    let _lock = dbm.archive.write_lock.lock();
    let mut conn = dbm.archive.get_conn()?;

    if options.fresh {
        archive::clear_checkpoints(&mut conn)?;
        info("Workflow checkpoints cleared, starting fresh");
    }

    run_load_phase(&mut conn, source)?;
    run_cleanup_phase(&mut conn)?;
    let stats = run_ingest_phase(&mut conn, options, settings)?;

    if let PageSource::Pdf(pdf_path) = source {
        if settings.keep_image_payloads {
            if let Err(e) = page_load::backfill_image_payloads(&mut conn, pdf_path) {
                // Payloads are a best-effort enrichment; the structural
                // graph is already complete at this point.
                warn(&format!("Image payload backfill failed: {}", e));
            }
        }
    }

    Ok(stats)
}

fn max_loaded_page(conn: &mut SqliteConnection) -> Result<i32> {
    use crate::db::archive_schema::pages::dsl::*;
    let max: Option<i32> = pages
        .select(diesel::dsl::max(page_number))
        .first(conn)?;
    Ok(max.unwrap_or(0))
}

fn run_load_phase(conn: &mut SqliteConnection, source: &PageSource) -> Result<()> {
    let already_loaded = max_loaded_page(conn)?;
    let checkpoint = archive::get_checkpoint(conn, WorkflowPhase::Load.as_str())?;

    if checkpoint.is_some() && already_loaded > 0 {
        info(&format!("Load phase already complete ({} pages), skipping", already_loaded));
        return Ok(());
    }

    let inserted = page_load::load_pages(conn, source)?;
    let last_page = max_loaded_page(conn)?;
    archive::save_checkpoint(conn, WorkflowPhase::Load.as_str(), last_page)?;

    info(&format!("Load phase complete: {} new pages, last page {}", inserted, last_page));
    Ok(())
}

fn run_cleanup_phase(conn: &mut SqliteConnection) -> Result<()> {
    // cleanup_pages() only touches pages not yet cleaned, so re-running
    // after an interruption picks up where it stopped.
    let processed = page_load::cleanup_pages(conn)?;
    let last_page = max_loaded_page(conn)?;
    archive::save_checkpoint(conn, WorkflowPhase::Cleanup.as_str(), last_page)?;

    info(&format!("Cleanup phase complete: {} pages processed", processed));
    Ok(())
}

fn run_ingest_phase(
    conn: &mut SqliteConnection,
    options: &IngestOptions,
    settings: &AppSettings,
) -> Result<IngestStats> {
    use crate::db::archive_schema::pages::dsl::*;

    // Resume point: an explicit --from-page wins over the checkpoint.
    let resume_after: i32 = match options.from_page {
        Some(p) => p - 1,
        None => archive::get_checkpoint(conn, WorkflowPhase::Ingest.as_str())?
            .map(|cp| cp.last_page)
            .unwrap_or(0),
    };

    let env_limit: Option<usize> = match env::var("INGEST_PAGE_LIMIT") {
        Ok(s) if !s.is_empty() => s.parse().ok(),
        _ => None,
    };
    let page_limit = options.limit.or(env_limit);

    let candidates: Vec<Page> = pages
        .filter(cleaned.eq(true))
        .filter(page_number.gt(resume_after))
        .order(page_number.asc())
        .select(Page::as_select())
        .load(conn)?;

    let mut stats = IngestStats::default();
    let mut session = IngestSession::new();

    for page in &candidates {
        if let Some(limit) = page_limit {
            if stats.pages_processed + stats.pages_failed >= limit {
                break;
            }
        }

        let parseable = page.category.as_deref()
            .and_then(PageCategory::from_str)
            .map(|cat| {
                cat.is_parseable()
                    || (cat == PageCategory::FrontMatter && settings.ingest_front_matter)
            })
            .unwrap_or(false);

        if !parseable {
            stats.pages_skipped += 1;
            archive::save_checkpoint(conn, WorkflowPhase::Ingest.as_str(), page.page_number)?;
            continue;
        }

        let lines: Vec<&str> = page.content.lines().collect();
        let events = parse_page(&lines, page.page_number);

        let result = conn.transaction::<_, anyhow::Error, _>(|tx_conn| {
            session.ingest_events(tx_conn, &events, page.page_number)
        });

        match result {
            Ok(()) => {
                stats.pages_processed += 1;
            }
            Err(e) => {
                stats.pages_failed += 1;
                let message = format!("{:#}", e);
                error(&format!("Page {} failed: {}", page.page_number, message));
                archive::record_page_error(conn, page.page_number, &message)?;
            }
        }

        // The checkpoint advances past failed pages too: they stay
        // recorded in page_errors for re-processing rather than blocking
        // the run on every resume.
        archive::save_checkpoint(conn, WorkflowPhase::Ingest.as_str(), page.page_number)?;
    }

    session.finish_ingestion(conn)?;

    info(&format!(
        "Ingest phase complete: {} processed, {} skipped, {} failed",
        stats.pages_processed, stats.pages_skipped, stats.pages_failed
    ));

    Ok(stats)
}
