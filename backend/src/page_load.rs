//! Page source loading.
//!
//! The structure parser only ever sees `(lines, page_number)`; this module
//! produces those pages from the outside world and persists them to the
//! `pages` table. Two sources are supported: a scanned-book PDF (text
//! layer via pdf-extract, split on the form feeds it inserts between
//! pages) and a directory of per-page text files.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use diesel::prelude::*;
use regex::Regex;
use lazy_static::lazy_static;
use thiserror::Error;
use walkdir::WalkDir;

use crate::db::archive_models::{NewPage, Page};
use crate::helpers::clean_page_text;
use crate::page_classify::classify_page;

#[derive(Debug, Error)]
pub enum PageSourceError {
    #[error("Source path does not exist: {0}")]
    Missing(PathBuf),
    #[error("Source produced no pages: {0}")]
    Empty(PathBuf),
    #[error("Unrecognized page filename: {0}")]
    BadFilename(PathBuf),
}

/// Where the pages come from.
#[derive(Debug, Clone)]
pub enum PageSource {
    Pdf(PathBuf),
    TextDir(PathBuf),
}

impl PageSource {
    /// A `.pdf` file is a PDF source; a directory is a text-file source.
    pub fn detect(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PageSourceError::Missing(path.to_path_buf()).into());
        }
        if path.is_dir() {
            return Ok(PageSource::TextDir(path.to_path_buf()));
        }
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("pdf") => Ok(PageSource::Pdf(path.to_path_buf())),
            _ => Err(PageSourceError::BadFilename(path.to_path_buf()).into()),
        }
    }
}

/// Load pages from the source into the `pages` table. Already-loaded page
/// numbers are left untouched, so a re-run resumes where it stopped.
/// Returns the number of pages inserted.
pub fn load_pages(conn: &mut SqliteConnection, source: &PageSource) -> Result<usize> {
    match source {
        PageSource::Pdf(path) => load_pdf_pages(conn, path),
        PageSource::TextDir(path) => load_text_pages(conn, path),
    }
}

/// Extract the text layer of a PDF and store one row per page.
pub fn load_pdf_pages(conn: &mut SqliteConnection, pdf_path: &Path) -> Result<usize> {
    tracing::info!("Loading PDF pages from {:?}", pdf_path);

    let text = pdf_extract::extract_text(pdf_path)
        .map_err(|e| anyhow!("Failed to extract text from PDF: {}", e))?;

    // pdf-extract separates pages with form feeds. Fall back to treating
    // the whole text as a single page when none are present.
    let page_texts: Vec<&str> = if text.contains('\x0C') {
        text.split('\x0C').collect()
    } else {
        vec![text.as_str()]
    };

    if page_texts.iter().all(|p| p.trim().is_empty()) {
        return Err(PageSourceError::Empty(pdf_path.to_path_buf()).into());
    }

    let mut inserted = 0;
    for (idx, page_text) in page_texts.iter().enumerate() {
        let page_number = (idx + 1) as i32;
        if insert_page_if_absent(conn, page_number, page_text)? {
            inserted += 1;
        }
    }

    tracing::info!("Loaded {} new pages ({} total in source)", inserted, page_texts.len());
    Ok(inserted)
}

lazy_static! {
    // "page-0001.txt" or "0001.txt"
    static ref RE_PAGE_FILENAME: Regex = Regex::new(r"^(?:page[-_])?(\d+)\.txt$").unwrap();
}

/// Load pages from a directory of per-page text files named
/// `page-NNNN.txt` (or plain `NNNN.txt`).
pub fn load_text_pages(conn: &mut SqliteConnection, dir: &Path) -> Result<usize> {
    tracing::info!("Loading page text files from {:?}", dir);

    let mut page_files: Vec<(i32, PathBuf)> = Vec::new();

    for entry in WalkDir::new(dir).max_depth(1).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some(caps) = RE_PAGE_FILENAME.captures(&name) {
            let page_number: i32 = caps[1].parse()
                .map_err(|_| PageSourceError::BadFilename(entry.path().to_path_buf()))?;
            page_files.push((page_number, entry.path().to_path_buf()));
        }
    }

    if page_files.is_empty() {
        return Err(PageSourceError::Empty(dir.to_path_buf()).into());
    }

    page_files.sort_by_key(|(n, _)| *n);

    let mut inserted = 0;
    for (page_number, path) in &page_files {
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read {:?}: {}", path, e))?;
        if insert_page_if_absent(conn, *page_number, &content)? {
            inserted += 1;
        }
    }

    tracing::info!("Loaded {} new pages ({} files found)", inserted, page_files.len());
    Ok(inserted)
}

fn insert_page_if_absent(conn: &mut SqliteConnection, for_page: i32, content_text: &str) -> Result<bool> {
    use crate::db::archive_schema::pages::dsl::*;

    let existing: Option<i32> = pages
        .filter(page_number.eq(for_page))
        .select(id)
        .first(conn)
        .optional()?;

    if existing.is_some() {
        return Ok(false);
    }

    let new_page = NewPage {
        page_number: for_page,
        content: content_text,
        category: None,
        cleaned: false,
    };

    diesel::insert_into(pages)
        .values(&new_page)
        .execute(conn)?;

    Ok(true)
}

/// Normalize and classify every page not yet cleaned. Returns the number
/// of pages processed. Idempotent: cleaned pages are skipped, and cleaning
/// already-clean text changes nothing.
pub fn cleanup_pages(conn: &mut SqliteConnection) -> Result<usize> {
    use crate::db::archive_schema::pages::dsl::*;

    let pending: Vec<Page> = pages
        .filter(cleaned.eq(false))
        .order(page_number.asc())
        .select(Page::as_select())
        .load(conn)?;

    let total = pending.len();

    for page in pending {
        let cleaned_text = clean_page_text(&page.content);
        let lines: Vec<&str> = cleaned_text.lines().collect();
        let page_category = classify_page(&lines);

        diesel::update(pages.find(page.id))
            .set((
                content.eq(&cleaned_text),
                category.eq(Some(page_category.as_str())),
                cleaned.eq(true),
            ))
            .execute(conn)?;
    }

    if total > 0 {
        tracing::info!("Cleaned and classified {} pages", total);
    }
    Ok(total)
}

/// Best-effort backfill of raw image payloads from the source PDF.
///
/// The plate markers in the text give each image its key; the PDF gives
/// the bytes. For each page, image rows created by ingestion (in plate
/// order, by id) are zipped with the page's embedded image streams (in
/// object order). When the counts disagree the page is skipped with a
/// warning rather than guessed at.
pub fn backfill_image_payloads(conn: &mut SqliteConnection, pdf_path: &Path) -> Result<usize> {
    use crate::db::archive_schema::images::dsl::*;
    use crate::db::archive_models::Image;

    let doc = lopdf::Document::load(pdf_path)
        .map_err(|e| anyhow!("Failed to load PDF: {}", e))?;

    let mut filled = 0;

    for (page_no, page_id) in doc.get_pages() {
        let page_number = page_no as i32;

        let rows: Vec<Image> = images
            .filter(source_page.eq(page_number))
            .filter(content_data.is_null())
            .order(id.asc())
            .select(Image::as_select())
            .load(conn)?;

        if rows.is_empty() {
            continue;
        }

        let embedded = match doc.get_page_images(page_id) {
            Ok(imgs) => imgs,
            Err(e) => {
                tracing::warn!("Page {}: failed to read embedded images: {}", page_number, e);
                continue;
            }
        };

        if embedded.len() != rows.len() {
            tracing::warn!(
                "Page {}: {} plate markers but {} embedded images, skipping payloads",
                page_number, rows.len(), embedded.len()
            );
            continue;
        }

        for (row, img) in rows.iter().zip(embedded.iter()) {
            diesel::update(images.find(row.id))
                .set(content_data.eq(Some(img.content.to_vec())))
                .execute(conn)?;
            filled += 1;
        }
    }

    if filled > 0 {
        tracing::info!("Backfilled {} image payloads", filled);
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_filename_pattern() {
        assert!(RE_PAGE_FILENAME.is_match("page-0001.txt"));
        assert!(RE_PAGE_FILENAME.is_match("page_12.txt"));
        assert!(RE_PAGE_FILENAME.is_match("0042.txt"));
        assert!(!RE_PAGE_FILENAME.is_match("notes.txt"));
        assert!(!RE_PAGE_FILENAME.is_match("page-0001.md"));
    }

    #[test]
    fn test_detect_source_rejects_missing_path() {
        let result = PageSource::detect(Path::new("/no/such/path"));
        assert!(result.is_err());
    }
}
