use diesel::prelude::*;
use serial_test::serial;

mod helpers;
use helpers as h;

use scriptura_backend::get_app_data;
use scriptura_backend::db::archive_models::{Book, Chapter, Verse};
use scriptura_backend::db::archive_schema::{books, chapters, verses};
use scriptura_backend::ingest::consumer::{INTRODUCTION_BOOK_TITLE, PREFACE_CHAPTER_TITLE};
use scriptura_backend::ingest::{parse_page, IngestSession};

#[test]
#[serial]
fn test_orphan_verses_synthesize_introduction_once() {
    h::app_data_setup();
    h::reset_archive();
    let app_data = get_app_data();
    let _lock = app_data.dbm.archive.write_lock.lock();
    let mut conn = app_data.dbm.archive.get_conn().expect("No archive conn");

    // Three orphan verses across two pages, no book or chapter declared.
    let mut session = IngestSession::new();

    let events = parse_page(&["1/1.1 alpha", "1/1.2 beta"], 1);
    session.ingest_events(&mut conn, &events, 1).unwrap();

    let events = parse_page(&["1/1.3 gamma"], 2);
    session.ingest_events(&mut conn, &events, 2).unwrap();
    session.finish_ingestion(&mut conn).unwrap();

    // Exactly one synthetic book and one synthetic chapter.
    let all_books: Vec<Book> = books::table.select(Book::as_select()).load(&mut conn).unwrap();
    assert_eq!(all_books.len(), 1);
    assert_eq!(all_books[0].title, INTRODUCTION_BOOK_TITLE);

    let all_chapters: Vec<Chapter> = chapters::table.select(Chapter::as_select()).load(&mut conn).unwrap();
    assert_eq!(all_chapters.len(), 1);
    assert_eq!(all_chapters[0].title, PREFACE_CHAPTER_TITLE);
    assert_eq!(all_chapters[0].book_id, Some(all_books[0].id));

    // All three verses share the Preface chapter.
    let all_verses: Vec<Verse> = verses::table.select(Verse::as_select()).load(&mut conn).unwrap();
    assert_eq!(all_verses.len(), 3);
    assert!(all_verses.iter().all(|v| v.chapter_id == all_chapters[0].id));
}

#[test]
#[serial]
fn test_synthesis_does_not_steal_later_books() {
    h::app_data_setup();
    h::reset_archive();
    let app_data = get_app_data();
    let _lock = app_data.dbm.archive.write_lock.lock();
    let mut conn = app_data.dbm.archive.get_conn().expect("No archive conn");

    let mut session = IngestSession::new();

    // Orphan preface content, then the real book begins.
    let events = parse_page(&["1/1.1 preface text", "Book of Apollo", "Chapter 1", "2/1.1 body"], 1);
    session.ingest_events(&mut conn, &events, 1).unwrap();
    session.finish_ingestion(&mut conn).unwrap();

    let all_books: Vec<Book> = books::table
        .order(books::id.asc())
        .select(Book::as_select())
        .load(&mut conn).unwrap();
    assert_eq!(all_books.len(), 2);
    assert_eq!(all_books[0].title, INTRODUCTION_BOOK_TITLE);
    assert_eq!(all_books[1].title, "Book of Apollo");

    // The body verse belongs to the declared book's chapter, not the Preface.
    let body_verse: Verse = verses::table
        .filter(verses::verse_key.eq("2/1.1"))
        .select(Verse::as_select())
        .first(&mut conn).unwrap();
    let body_chapter: Chapter = chapters::table
        .filter(chapters::title.eq("Chapter 1"))
        .select(Chapter::as_select())
        .first(&mut conn).unwrap();
    assert_eq!(body_verse.chapter_id, body_chapter.id);
}

#[test]
#[serial]
fn test_new_session_synthesizes_again() {
    h::app_data_setup();
    h::reset_archive();
    let app_data = get_app_data();
    let _lock = app_data.dbm.archive.write_lock.lock();
    let mut conn = app_data.dbm.archive.get_conn().expect("No archive conn");

    let mut session = IngestSession::new();
    let events = parse_page(&["1/1.1 alpha"], 1);
    session.ingest_events(&mut conn, &events, 1).unwrap();
    session.finish_ingestion(&mut conn).unwrap();

    // The synthesis guard is per session, not global.
    let mut session = IngestSession::new();
    let events = parse_page(&["9/9.9 omega"], 50);
    session.ingest_events(&mut conn, &events, 50).unwrap();
    session.finish_ingestion(&mut conn).unwrap();

    let intro_count: i64 = books::table
        .filter(books::title.eq(INTRODUCTION_BOOK_TITLE))
        .count()
        .get_result(&mut conn).unwrap();
    assert_eq!(intro_count, 2);
}
