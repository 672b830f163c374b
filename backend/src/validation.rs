//! Post-hoc archive audit.
//!
//! Runs after ingestion and reports on the shape of the reconstructed
//! graph: structures that are legal but suspicious (empty books, orphan
//! chapters, floating notes) and structures that indicate parsing
//! problems (malformed verse keys, out-of-order chapter numbers).

use std::collections::HashMap;

use anyhow::Result;
use diesel::prelude::*;
use regex::Regex;
use lazy_static::lazy_static;
use serde::{Serialize, Deserialize};
use tinytemplate::TinyTemplate;

use crate::db::archive_models::{Book, Chapter, Image, Note, NoteImage, Verse};
use crate::helpers::chapter_number_from_title;

lazy_static! {
    static ref RE_VERSE_KEY: Regex = Regex::new(r"^\d+/\d+\.\d+$").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    #[serde(rename = "info")]
    Info,
    #[serde(rename = "warning")]
    Warning,
    #[serde(rename = "error")]
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub code: String,
    pub message: String,
    pub page: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub generated_at: String,
    pub books: usize,
    pub chapters: usize,
    pub verses: usize,
    pub notes: usize,
    pub images: usize,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn count_of(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }
}

fn issue(severity: Severity, code: &str, message: String, page: Option<i32>) -> ValidationIssue {
    ValidationIssue {
        severity,
        code: code.to_string(),
        message,
        page,
    }
}

/// Audit the archive and collect issues, most severe first.
pub fn validate_archive(conn: &mut SqliteConnection) -> Result<ValidationReport> {
    use crate::db::archive_schema::{books, chapters, images, note_images, notes, verses};

    let all_books: Vec<Book> = books::table
        .order(books::id.asc())
        .select(Book::as_select())
        .load(conn)?;
    let all_chapters: Vec<Chapter> = chapters::table
        .order(chapters::id.asc())
        .select(Chapter::as_select())
        .load(conn)?;
    let all_verses: Vec<Verse> = verses::table
        .order(verses::id.asc())
        .select(Verse::as_select())
        .load(conn)?;
    let all_notes: Vec<Note> = notes::table
        .order(notes::id.asc())
        .select(Note::as_select())
        .load(conn)?;
    let all_images: Vec<Image> = images::table
        .order(images::id.asc())
        .select(Image::as_select())
        .load(conn)?;
    let all_links: Vec<NoteImage> = note_images::table
        .select(NoteImage::as_select())
        .load(conn)?;

    let mut issues: Vec<ValidationIssue> = Vec::new();

    // Malformed verse keys point at recognizer or OCR trouble.
    for verse in &all_verses {
        if !RE_VERSE_KEY.is_match(&verse.verse_key) {
            issues.push(issue(
                Severity::Error,
                "bad-verse-key",
                format!("Verse id {} has malformed key '{}'", verse.id, verse.verse_key),
                Some(verse.source_page),
            ));
        }
    }

    // Duplicate verse keys within one chapter.
    let mut keys_per_chapter: HashMap<(i32, &str), usize> = HashMap::new();
    for verse in &all_verses {
        *keys_per_chapter.entry((verse.chapter_id, verse.verse_key.as_str())).or_default() += 1;
    }
    for ((chapter_id, verse_key), count) in &keys_per_chapter {
        if *count > 1 {
            issues.push(issue(
                Severity::Warning,
                "duplicate-verse-key",
                format!("Chapter id {} contains verse key '{}' {} times", chapter_id, verse_key, count),
                None,
            ));
        }
    }

    // Books with no chapters.
    for book in &all_books {
        let has_chapters = all_chapters.iter().any(|c| c.book_id == Some(book.id));
        if !has_chapters {
            issues.push(issue(
                Severity::Warning,
                "empty-book",
                format!("Book '{}' (id {}) has no chapters", book.title, book.id),
                Some(book.source_page),
            ));
        }
    }

    // Chapters that never attached to a book.
    for chapter in &all_chapters {
        if chapter.book_id.is_none() {
            issues.push(issue(
                Severity::Warning,
                "orphan-chapter",
                format!("Chapter '{}' (id {}) belongs to no book", chapter.title, chapter.id),
                Some(chapter.source_page),
            ));
        }
    }

    // Chapter numbers should not decrease within a book. A drop usually
    // means a chapter header attached to the wrong book.
    for book in &all_books {
        let mut last_number: Option<u32> = None;
        for chapter in all_chapters.iter().filter(|c| c.book_id == Some(book.id)) {
            if let Some(number) = chapter_number_from_title(&chapter.title) {
                if let Some(prev) = last_number {
                    if number < prev {
                        issues.push(issue(
                            Severity::Warning,
                            "chapter-order",
                            format!(
                                "Book '{}': chapter number {} follows {} ('{}')",
                                book.title, number, prev, chapter.title
                            ),
                            Some(chapter.source_page),
                        ));
                    }
                }
                last_number = Some(number);
            }
        }
    }

    // Notes without a verse are legal but worth surfacing.
    for note in &all_notes {
        if note.verse_id.is_none() {
            issues.push(issue(
                Severity::Info,
                "floating-note",
                format!("Note ({}) (id {}) annotates no verse", note.note_key, note.id),
                Some(note.source_page),
            ));
        }
    }

    // Images that never linked to a note.
    for image in &all_images {
        let linked = all_links.iter().any(|l| l.image_id == image.id);
        if !linked {
            issues.push(issue(
                Severity::Info,
                "unlinked-image",
                format!("Image {} ('{}') is linked to no note", image.image_key, image.title),
                Some(image.source_page),
            ));
        }
    }

    issues.sort_by_key(|i| match i.severity {
        Severity::Error => 0,
        Severity::Warning => 1,
        Severity::Info => 2,
    });

    Ok(ValidationReport {
        generated_at: chrono::Utc::now().to_rfc3339(),
        books: all_books.len(),
        chapters: all_chapters.len(),
        verses: all_verses.len(),
        notes: all_notes.len(),
        images: all_images.len(),
        issues,
    })
}

static TEXT_REPORT_TEMPLATE: &str = "\
Archive validation report
Generated: {generated_at}

Books: {books}  Chapters: {chapters}  Verses: {verses}  Notes: {notes}  Images: {images}

Issues:
{{ for issue in issues }}\
[{issue.severity}] {issue.code}: {issue.message}
{{ endfor }}\
";

/// Render the report as plain text.
pub fn render_text(report: &ValidationReport) -> Result<String> {
    let mut tt = TinyTemplate::new();
    // Plain text output, no HTML escaping of quotes in titles.
    tt.set_default_formatter(&tinytemplate::format_unescaped);
    tt.add_template("report", TEXT_REPORT_TEMPLATE)?;
    Ok(tt.render("report", report)?)
}

/// Render the report as a standalone HTML page.
pub fn render_html(report: &ValidationReport) -> String {
    let mut res = String::from(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Archive validation</title></head>\n<body>\n"
    );

    res.push_str(&format!(
        "<h1>Archive validation report</h1>\n<p>Generated: {}</p>\n",
        html_escape::encode_text(&report.generated_at)
    ));

    res.push_str(&format!(
        "<p>Books: {} &middot; Chapters: {} &middot; Verses: {} &middot; Notes: {} &middot; Images: {}</p>\n",
        report.books, report.chapters, report.verses, report.notes, report.images
    ));

    res.push_str("<table border='1'>\n<tr><th>Severity</th><th>Code</th><th>Message</th><th>Page</th></tr>\n");

    for item in &report.issues {
        let page = item.page.map_or("".to_string(), |p| p.to_string());
        res.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            item.severity.as_str(),
            html_escape::encode_text(&item.code),
            html_escape::encode_text(&item.message),
            page,
        ));
    }

    res.push_str("</table>\n</body>\n</html>\n");
    res
}
