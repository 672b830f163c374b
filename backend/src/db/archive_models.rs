use diesel::prelude::*;
use crate::db::archive_schema::*;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, PartialEq)]
#[diesel(table_name = app_settings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AppSetting {
    pub id: i32,
    #[diesel(column_name = "key")]
    pub key: String,
    pub value: Option<String>,
}

#[derive(Insertable)]
#[diesel(table_name = app_settings)]
pub struct NewAppSetting<'a> {
    #[diesel(column_name = "key")]
    pub key: &'a str,
    pub value: Option<&'a str>,
}

// Queryable struct for reading records
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, PartialEq)]
#[diesel(table_name = books)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub source_page: i32,
}

// Insertable struct for creating new records
#[derive(Insertable)]
#[diesel(table_name = books)]
pub struct NewBook<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub source_page: i32,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, PartialEq, Associations)]
#[diesel(belongs_to(Book, foreign_key = book_id))]
#[diesel(table_name = chapters)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Chapter {
    pub id: i32,
    pub book_id: Option<i32>,
    pub title: String,
    pub description: Option<String>,
    pub source_page: i32,
}

#[derive(Insertable)]
#[diesel(table_name = chapters)]
pub struct NewChapter<'a> {
    pub book_id: Option<i32>,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub source_page: i32,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, PartialEq, Associations)]
#[diesel(belongs_to(Chapter, foreign_key = chapter_id))]
#[diesel(table_name = verses)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Verse {
    pub id: i32,
    pub chapter_id: i32,
    pub verse_key: String,
    pub content: String,
    pub source_page: i32,
}

#[derive(Insertable)]
#[diesel(table_name = verses)]
pub struct NewVerse<'a> {
    pub chapter_id: i32,
    pub verse_key: &'a str,
    pub content: &'a str,
    pub source_page: i32,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, PartialEq, Associations)]
#[diesel(belongs_to(Verse, foreign_key = verse_id))]
#[diesel(table_name = notes)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Note {
    pub id: i32,
    pub verse_id: Option<i32>,
    pub note_key: String,
    pub content: String,
    pub source_page: i32,
}

#[derive(Insertable)]
#[diesel(table_name = notes)]
pub struct NewNote<'a> {
    pub verse_id: Option<i32>,
    pub note_key: &'a str,
    pub content: &'a str,
    pub source_page: i32,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, PartialEq)]
#[diesel(table_name = images)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Image {
    pub id: i32,
    pub image_key: String,
    pub title: String,
    pub source_page: i32,
    pub content_data: Option<Vec<u8>>,
}

#[derive(Insertable)]
#[diesel(table_name = images)]
pub struct NewImage<'a> {
    pub image_key: &'a str,
    pub title: &'a str,
    pub source_page: i32,
    pub content_data: Option<&'a [u8]>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, PartialEq, Associations)]
#[diesel(belongs_to(Note, foreign_key = note_id))]
#[diesel(table_name = note_images)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct NoteImage {
    pub id: i32,
    pub note_id: i32,
    pub image_id: i32,
}

#[derive(Insertable)]
#[diesel(table_name = note_images)]
pub struct NewNoteImage {
    pub note_id: i32,
    pub image_id: i32,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, PartialEq)]
#[diesel(table_name = pages)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Page {
    pub id: i32,
    pub page_number: i32,
    pub content: String,
    pub category: Option<String>,
    pub cleaned: bool,
}

#[derive(Insertable)]
#[diesel(table_name = pages)]
pub struct NewPage<'a> {
    pub page_number: i32,
    pub content: &'a str,
    pub category: Option<&'a str>,
    pub cleaned: bool,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, PartialEq)]
#[diesel(table_name = page_errors)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PageError {
    pub id: i32,
    pub page_number: i32,
    pub message: String,
    pub created_at: String,
}

#[derive(Insertable)]
#[diesel(table_name = page_errors)]
pub struct NewPageError<'a> {
    pub page_number: i32,
    pub message: &'a str,
    pub created_at: &'a str,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, PartialEq)]
#[diesel(table_name = workflow_checkpoints)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct WorkflowCheckpoint {
    pub id: i32,
    pub phase: String,
    pub last_page: i32,
    pub updated_at: String,
}

#[derive(Insertable)]
#[diesel(table_name = workflow_checkpoints)]
pub struct NewWorkflowCheckpoint<'a> {
    pub phase: &'a str,
    pub last_page: i32,
    pub updated_at: &'a str,
}
