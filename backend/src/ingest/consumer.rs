//! Stateful ingestion consumer.
//!
//! Folds a page's event stream into archive rows. The session keeps
//! single-slot context pointers (current book, chapter, verse, note) that
//! new events resolve their parent links against. Writes happen
//! immediately, never batched: a verse created mid-page must be durably
//! referenceable by the note event two lines later.
//!
//! The session performs no transaction management of its own. Callers
//! wrap each page's `ingest_events` in one transaction, so a failing page
//! rolls back alone; the recovery step at the start of the next page
//! re-resolves the context pointers against whatever actually committed.

use anyhow::{anyhow, Result};
use diesel::prelude::*;

use crate::db::archive;
use crate::db::archive_models::{NewBook, NewChapter, NewNote, NewVerse};
use crate::ingest::event::PageEvent;
use crate::ingest::linker::{link_image_to_note, upsert_image};
use crate::logger::{debug, info, warn};

/// Title of the book synthesized for content that appears before any book
/// header, and of its single chapter.
pub const INTRODUCTION_BOOK_TITLE: &str = "Introduction";
pub const PREFACE_CHAPTER_TITLE: &str = "Preface";

#[derive(Debug, Default)]
pub struct IngestSession {
    current_book_id: Option<i32>,
    current_chapter_id: Option<i32>,
    current_verse_id: Option<i32>,
    current_note_id: Option<i32>,
    // Synthesized at most once per session, then reused for every later
    // orphan verse.
    introduction_book_id: Option<i32>,
    introduction_chapter_id: Option<i32>,
    page_number: i32,
}

impl IngestSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one page's events into the archive.
    ///
    /// Runs the context recovery step first, then dispatches each event.
    /// Errors propagate to the caller, which owns the transaction boundary
    /// and decides whether to roll back and record the page as failed.
    pub fn ingest_events(
        &mut self,
        conn: &mut SqliteConnection,
        events: &[PageEvent],
        page_number: i32,
    ) -> Result<()> {
        self.page_number = page_number;
        self.recover_context(conn)?;

        for event in events {
            self.apply_event(conn, event)?;
        }

        Ok(())
    }

    /// End the ingestion session: persist the current book and clear every
    /// context pointer.
    ///
    /// Hard contract: callers must invoke this between logically distinct
    /// documents, otherwise the next document's first pages attach to this
    /// one's residual context.
    pub fn finish_ingestion(&mut self, conn: &mut SqliteConnection) -> Result<()> {
        self.save_current_book(conn)?;

        self.current_book_id = None;
        self.current_chapter_id = None;
        self.current_verse_id = None;
        self.current_note_id = None;
        self.introduction_book_id = None;
        self.introduction_chapter_id = None;

        info("Ingestion session finished, context cleared");
        Ok(())
    }

    /// Explicit flush of the current book without resetting context.
    pub fn save_current_book(&mut self, conn: &mut SqliteConnection) -> Result<()> {
        if let Some(book_id) = self.current_book_id {
            if !archive::resave_book(conn, book_id)? {
                warn(&format!("save_current_book(): book id {} no longer exists", book_id));
            }
        }
        Ok(())
    }

    pub fn current_book_id(&self) -> Option<i32> {
        self.current_book_id
    }

    pub fn current_chapter_id(&self) -> Option<i32> {
        self.current_chapter_id
    }

    /// Re-resolve the book and chapter pointers from the store.
    ///
    /// The previous page may have run in a transaction that rolled back
    /// after this session recorded its ids, so the pointers cannot be
    /// trusted across a page boundary. A vanished book drops both
    /// pointers; a chapter that no longer belongs to the current book is
    /// dropped rather than trusted. When the chapter pointer is lost but
    /// the book has persisted chapters, the most recently created one is
    /// adopted. That adoption is a best-effort guess: after a mid-book
    /// rollback the content that follows may attach to the wrong chapter.
    fn recover_context(&mut self, conn: &mut SqliteConnection) -> Result<()> {
        if let Some(book_id) = self.current_book_id {
            if archive::get_book(conn, book_id)?.is_none() {
                debug(&format!("Recovery: book id {} not found, dropping context", book_id));
                self.current_book_id = None;
            }
        }

        if let Some(chapter_id) = self.current_chapter_id {
            match archive::get_chapter(conn, chapter_id)? {
                Some(chapter) => {
                    if chapter.book_id != self.current_book_id {
                        debug(&format!(
                            "Recovery: chapter id {} belongs to book {:?}, not {:?}; dropping",
                            chapter_id, chapter.book_id, self.current_book_id
                        ));
                        self.current_chapter_id = None;
                    }
                }
                None => {
                    debug(&format!("Recovery: chapter id {} not found, dropping", chapter_id));
                    self.current_chapter_id = None;
                }
            }
        }

        if self.current_chapter_id.is_none() {
            if let Some(book_id) = self.current_book_id {
                if let Some(chapter) = archive::last_chapter_of_book(conn, book_id)? {
                    debug(&format!(
                        "Recovery: adopting last chapter id {} of book id {}",
                        chapter.id, book_id
                    ));
                    self.current_chapter_id = Some(chapter.id);
                }
            }
        }

        Ok(())
    }

    // One arm per event variant. No wildcard: a new variant must be
    // handled here before the crate compiles again.
    fn apply_event(&mut self, conn: &mut SqliteConnection, event: &PageEvent) -> Result<()> {
        match event {
            PageEvent::BookStart { title } => {
                let new_book = NewBook {
                    title,
                    description: None,
                    source_page: self.page_number,
                };
                let book_id = archive::insert_book(conn, &new_book)?;
                debug(&format!("Page {}: new book id {}: {}", self.page_number, book_id, title));

                // No inheritance across books.
                self.current_book_id = Some(book_id);
                self.current_chapter_id = None;
                self.current_verse_id = None;
                self.current_note_id = None;
            }

            PageEvent::ChapterStart { title } => {
                // current_book_id may be None: an orphan chapter is legal.
                let new_chapter = NewChapter {
                    book_id: self.current_book_id,
                    title,
                    description: None,
                    source_page: self.page_number,
                };
                let chapter_id = archive::insert_chapter(conn, &new_chapter)?;
                debug(&format!("Page {}: new chapter id {}: {}", self.page_number, chapter_id, title));

                self.current_chapter_id = Some(chapter_id);
                self.current_verse_id = None;
                self.current_note_id = None;
            }

            PageEvent::Verse { key: Some(verse_key), text } => {
                if self.current_chapter_id.is_none() {
                    self.ensure_introduction(conn)?;
                }
                let chapter_id = self.current_chapter_id
                    .ok_or_else(|| anyhow!("No chapter context for verse {}", verse_key))?;

                let new_verse = NewVerse {
                    chapter_id,
                    verse_key,
                    content: text,
                    source_page: self.page_number,
                };
                let verse_id = archive::insert_verse(conn, &new_verse)?;

                self.current_verse_id = Some(verse_id);
                self.current_note_id = None;
            }

            PageEvent::Verse { key: None, text } => {
                match self.current_verse_id {
                    Some(verse_id) => {
                        if !archive::append_verse_content(conn, verse_id, text)? {
                            warn(&format!(
                                "Page {}: verse id {} vanished, continuation dropped",
                                self.page_number, verse_id
                            ));
                        }
                    }
                    None => {
                        debug(&format!(
                            "Page {}: verse continuation with no open verse, dropped",
                            self.page_number
                        ));
                    }
                }
            }

            PageEvent::Note { key: Some(note_key), text } => {
                // verse_id may be None: a note can stand on its own.
                let new_note = NewNote {
                    verse_id: self.current_verse_id,
                    note_key,
                    content: text,
                    source_page: self.page_number,
                };
                let note_id = archive::insert_note(conn, &new_note)?;

                self.current_note_id = Some(note_id);
            }

            PageEvent::Note { key: None, text } => {
                match self.current_note_id {
                    Some(note_id) => {
                        if !archive::append_note_content(conn, note_id, text)? {
                            warn(&format!(
                                "Page {}: note id {} vanished, continuation dropped",
                                self.page_number, note_id
                            ));
                        }
                    }
                    None => {
                        debug(&format!(
                            "Page {}: note continuation with no open note, dropped",
                            self.page_number
                        ));
                    }
                }
            }

            PageEvent::ImageRef { key, caption } => {
                match self.current_note_id {
                    Some(note_id) => {
                        link_image_to_note(conn, note_id, key, caption, self.page_number)?;
                    }
                    None => {
                        // No active note: persist the image unlinked. A
                        // later reconciliation pass may pick it up.
                        upsert_image(conn, key, caption, self.page_number)?;
                    }
                }
            }

            PageEvent::PageBreak { page_number } => {
                debug(&format!("Page break: {}", page_number));
            }
        }

        Ok(())
    }

    /// Create the synthetic Introduction book and Preface chapter, at most
    /// once per session, and point the chapter context at the Preface.
    ///
    /// The book pointer is left alone: when a declared book exists but has
    /// no chapter yet, later chapter headers should still attach to it.
    fn ensure_introduction(&mut self, conn: &mut SqliteConnection) -> Result<()> {
        if let Some(chapter_id) = self.introduction_chapter_id {
            // Reuse, unless the creating page's transaction rolled back.
            if archive::get_chapter(conn, chapter_id)?.is_some() {
                if self.current_book_id.is_none() {
                    self.current_book_id = self.introduction_book_id;
                }
                self.current_chapter_id = Some(chapter_id);
                return Ok(());
            }
            debug(&format!("Introduction chapter id {} vanished, recreating", chapter_id));
        }

        let new_book = NewBook {
            title: INTRODUCTION_BOOK_TITLE,
            description: Some("Synthesized for content found before any book header"),
            source_page: self.page_number,
        };
        let book_id = archive::insert_book(conn, &new_book)?;

        let new_chapter = NewChapter {
            book_id: Some(book_id),
            title: PREFACE_CHAPTER_TITLE,
            description: None,
            source_page: self.page_number,
        };
        let chapter_id = archive::insert_chapter(conn, &new_chapter)?;

        info(&format!(
            "Page {}: synthesized {} / {} for orphaned content",
            self.page_number, INTRODUCTION_BOOK_TITLE, PREFACE_CHAPTER_TITLE
        ));

        self.introduction_book_id = Some(book_id);
        self.introduction_chapter_id = Some(chapter_id);
        if self.current_book_id.is_none() {
            self.current_book_id = Some(book_id);
        }
        self.current_chapter_id = Some(chapter_id);

        Ok(())
    }
}
