use diesel::prelude::*;
use anyhow::Result;

use crate::db::archive_models::*;
use crate::db::DatabaseHandle;
use crate::app_settings::AppSettings;
use crate::logger::error;

pub type ArchiveDbHandle = DatabaseHandle;

impl ArchiveDbHandle {
    pub fn get_app_settings(&self) -> AppSettings {
        use crate::db::archive_schema::app_settings::dsl::*;

        let json = self.do_read(|db_conn| {
            app_settings
                .filter(key.eq("app_settings"))
                .select(AppSetting::as_select())
                .first(db_conn)
                .optional()
        });

        match json {
            Ok(None) => AppSettings::default(),
            Ok(Some(setting)) => {
                setting.value
                       .and_then(|val| serde_json::from_str(&val).ok())
                       .unwrap_or_default()
            },
            Err(e) => {
                error(&format!("{}", e));
                AppSettings::default()
            }
        }
    }

    pub fn save_app_settings(&self, settings: &AppSettings) -> Result<usize> {
        use crate::db::archive_schema::app_settings::dsl::*;

        let settings_json = serde_json::to_string(settings)?;

        self.do_write(|db_conn| {
            let existing_setting = app_settings
                .filter(key.eq("app_settings"))
                .first::<AppSetting>(db_conn)
                .optional()?;

            match existing_setting {
                Some(setting) => {
                    diesel::update(app_settings.find(setting.id))
                        .set(value.eq(Some(settings_json.as_str())))
                        .execute(db_conn)
                }
                None => {
                    let new_setting = NewAppSetting {
                        key: "app_settings",
                        value: Some(&settings_json),
                    };

                    diesel::insert_into(app_settings)
                        .values(&new_setting)
                        .execute(db_conn)
                }
            }
        })
    }

    /// Entity counts for the status summary: (books, chapters, verses, notes, images).
    pub fn entity_counts(&self) -> Result<(i64, i64, i64, i64, i64)> {
        use crate::db::archive_schema;

        self.do_read(|db_conn| {
            let books: i64 = archive_schema::books::table.count().get_result(db_conn)?;
            let chapters: i64 = archive_schema::chapters::table.count().get_result(db_conn)?;
            let verses: i64 = archive_schema::verses::table.count().get_result(db_conn)?;
            let notes: i64 = archive_schema::notes::table.count().get_result(db_conn)?;
            let images: i64 = archive_schema::images::table.count().get_result(db_conn)?;
            Ok((books, chapters, verses, notes, images))
        })
    }

    pub fn page_count(&self) -> Result<i64> {
        use crate::db::archive_schema::pages::dsl::*;
        self.do_read(|db_conn| pages.count().get_result(db_conn))
    }

    pub fn page_error_count(&self) -> Result<i64> {
        use crate::db::archive_schema::page_errors::dsl::*;
        self.do_read(|db_conn| page_errors.count().get_result(db_conn))
    }

    pub fn get_checkpoints(&self) -> Result<Vec<WorkflowCheckpoint>> {
        use crate::db::archive_schema::workflow_checkpoints::dsl::*;
        self.do_read(|db_conn| {
            workflow_checkpoints
                .select(WorkflowCheckpoint::as_select())
                .order(id.asc())
                .load(db_conn)
        })
    }
}

// Connection-level accessors used inside a caller-managed transaction. The
// ingestion consumer needs entities to be durably referenceable by the very
// next event, so these execute immediately on the given connection.

pub fn get_book(conn: &mut SqliteConnection, book_id: i32) -> QueryResult<Option<Book>> {
    use crate::db::archive_schema::books::dsl::*;
    books
        .find(book_id)
        .select(Book::as_select())
        .first(conn)
        .optional()
}

pub fn get_chapter(conn: &mut SqliteConnection, chapter_id: i32) -> QueryResult<Option<Chapter>> {
    use crate::db::archive_schema::chapters::dsl::*;
    chapters
        .find(chapter_id)
        .select(Chapter::as_select())
        .first(conn)
        .optional()
}

/// The most recently created chapter of a book, if any.
pub fn last_chapter_of_book(conn: &mut SqliteConnection, for_book_id: i32) -> QueryResult<Option<Chapter>> {
    use crate::db::archive_schema::chapters::dsl::*;
    chapters
        .filter(book_id.eq(Some(for_book_id)))
        .order(id.desc())
        .select(Chapter::as_select())
        .first(conn)
        .optional()
}

pub fn get_verse(conn: &mut SqliteConnection, verse_id: i32) -> QueryResult<Option<Verse>> {
    use crate::db::archive_schema::verses::dsl::*;
    verses
        .find(verse_id)
        .select(Verse::as_select())
        .first(conn)
        .optional()
}

pub fn get_note(conn: &mut SqliteConnection, note_id: i32) -> QueryResult<Option<Note>> {
    use crate::db::archive_schema::notes::dsl::*;
    notes
        .find(note_id)
        .select(Note::as_select())
        .first(conn)
        .optional()
}

pub fn get_image_by_key(conn: &mut SqliteConnection, key: &str) -> QueryResult<Option<Image>> {
    use crate::db::archive_schema::images::dsl::*;
    images
        .filter(image_key.eq(key))
        .select(Image::as_select())
        .first(conn)
        .optional()
}

pub fn insert_book(conn: &mut SqliteConnection, new_book: &NewBook) -> QueryResult<i32> {
    use crate::db::archive_schema::books;
    diesel::insert_into(books::table)
        .values(new_book)
        .returning(books::id)
        .get_result(conn)
}

pub fn insert_chapter(conn: &mut SqliteConnection, new_chapter: &NewChapter) -> QueryResult<i32> {
    use crate::db::archive_schema::chapters;
    diesel::insert_into(chapters::table)
        .values(new_chapter)
        .returning(chapters::id)
        .get_result(conn)
}

pub fn insert_verse(conn: &mut SqliteConnection, new_verse: &NewVerse) -> QueryResult<i32> {
    use crate::db::archive_schema::verses;
    diesel::insert_into(verses::table)
        .values(new_verse)
        .returning(verses::id)
        .get_result(conn)
}

pub fn insert_note(conn: &mut SqliteConnection, new_note: &NewNote) -> QueryResult<i32> {
    use crate::db::archive_schema::notes;
    diesel::insert_into(notes::table)
        .values(new_note)
        .returning(notes::id)
        .get_result(conn)
}

pub fn insert_image(conn: &mut SqliteConnection, new_image: &NewImage) -> QueryResult<i32> {
    use crate::db::archive_schema::images;
    diesel::insert_into(images::table)
        .values(new_image)
        .returning(images::id)
        .get_result(conn)
}

/// Append a continuation fragment to a verse's content with a single-space
/// separator. Returns false if the verse row does not exist.
pub fn append_verse_content(conn: &mut SqliteConnection, verse_id: i32, fragment: &str) -> QueryResult<bool> {
    use crate::db::archive_schema::verses::dsl::*;

    let existing = get_verse(conn, verse_id)?;
    match existing {
        Some(verse) => {
            let new_content = format!("{} {}", verse.content, fragment);
            diesel::update(verses.find(verse_id))
                .set(content.eq(new_content))
                .execute(conn)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Same continuation-append rule for notes.
pub fn append_note_content(conn: &mut SqliteConnection, note_id: i32, fragment: &str) -> QueryResult<bool> {
    use crate::db::archive_schema::notes::dsl::*;

    let existing = get_note(conn, note_id)?;
    match existing {
        Some(note) => {
            let new_content = format!("{} {}", note.content, fragment);
            diesel::update(notes.find(note_id))
                .set(content.eq(new_content))
                .execute(conn)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Write the book row through again. Entities persist as their events are
/// folded, so this re-persists the current values rather than flushing a
/// pending buffer. Returns false if the row does not exist.
pub fn resave_book(conn: &mut SqliteConnection, book_id: i32) -> QueryResult<bool> {
    use crate::db::archive_schema::books::dsl::*;

    let existing = get_book(conn, book_id)?;
    match existing {
        Some(book) => {
            diesel::update(books.find(book_id))
                .set((title.eq(&book.title), description.eq(book.description.as_deref())))
                .execute(conn)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

pub fn record_page_error(conn: &mut SqliteConnection, for_page: i32, error_message: &str) -> QueryResult<usize> {
    use crate::db::archive_schema::page_errors;

    let created = chrono::Utc::now().to_rfc3339();
    let new_error = NewPageError {
        page_number: for_page,
        message: error_message,
        created_at: &created,
    };

    diesel::insert_into(page_errors::table)
        .values(&new_error)
        .execute(conn)
}

pub fn get_checkpoint(conn: &mut SqliteConnection, phase_name: &str) -> QueryResult<Option<WorkflowCheckpoint>> {
    use crate::db::archive_schema::workflow_checkpoints::dsl::*;
    workflow_checkpoints
        .filter(phase.eq(phase_name))
        .select(WorkflowCheckpoint::as_select())
        .first(conn)
        .optional()
}

pub fn save_checkpoint(conn: &mut SqliteConnection, phase_name: &str, page: i32) -> QueryResult<usize> {
    use crate::db::archive_schema::workflow_checkpoints::dsl::*;

    let now = chrono::Utc::now().to_rfc3339();
    let existing = get_checkpoint(conn, phase_name)?;

    match existing {
        Some(cp) => {
            diesel::update(workflow_checkpoints.find(cp.id))
                .set((last_page.eq(page), updated_at.eq(&now)))
                .execute(conn)
        }
        None => {
            let new_cp = NewWorkflowCheckpoint {
                phase: phase_name,
                last_page: page,
                updated_at: &now,
            };
            diesel::insert_into(workflow_checkpoints)
                .values(&new_cp)
                .execute(conn)
        }
    }
}

pub fn clear_checkpoints(conn: &mut SqliteConnection) -> QueryResult<usize> {
    use crate::db::archive_schema::workflow_checkpoints::dsl::*;
    diesel::delete(workflow_checkpoints).execute(conn)
}
