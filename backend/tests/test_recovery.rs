use anyhow::anyhow;
use diesel::prelude::*;
use serial_test::serial;

mod helpers;
use helpers as h;

use scriptura_backend::get_app_data;
use scriptura_backend::db::archive_models::{Book, Chapter, Verse};
use scriptura_backend::db::archive_schema::{books, chapters, verses};
use scriptura_backend::ingest::consumer::INTRODUCTION_BOOK_TITLE;
use scriptura_backend::ingest::{parse_page, IngestSession};

#[test]
#[serial]
fn test_rolled_back_chapter_falls_back_to_last_committed() {
    h::app_data_setup();
    h::reset_archive();
    let app_data = get_app_data();
    let _lock = app_data.dbm.archive.write_lock.lock();
    let mut conn = app_data.dbm.archive.get_conn().expect("No archive conn");

    let mut session = IngestSession::new();

    // Page 1 commits: a book with two chapters.
    let events = parse_page(&[
        "Book of Apollo",
        "Chapter 1",
        "1/1.1 a",
        "Chapter 2",
        "1/2.1 b",
    ], 1);
    conn.transaction::<_, anyhow::Error, _>(|tx_conn| {
        session.ingest_events(tx_conn, &events, 1)
    }).unwrap();

    // Page 2 rolls back after folding: Chapter 3 is never persisted, but
    // the session's in-memory pointer still references it.
    let events = parse_page(&["Chapter 3", "1/3.1 c"], 2);
    let result = conn.transaction::<(), anyhow::Error, _>(|tx_conn| {
        session.ingest_events(tx_conn, &events, 2)?;
        Err(anyhow!("simulated page failure"))
    });
    assert!(result.is_err());

    let chapter_count: i64 = chapters::table.count().get_result(&mut conn).unwrap();
    assert_eq!(chapter_count, 2);

    // Page 3: recovery drops the stale pointer and adopts the book's most
    // recently created chapter, so the verse attaches to Chapter 2.
    let events = parse_page(&["1/3.2 d"], 3);
    conn.transaction::<_, anyhow::Error, _>(|tx_conn| {
        session.ingest_events(tx_conn, &events, 3)
    }).unwrap();
    session.finish_ingestion(&mut conn).unwrap();

    let chapter_two: Chapter = chapters::table
        .filter(chapters::title.eq("Chapter 2"))
        .select(Chapter::as_select())
        .first(&mut conn).unwrap();

    let recovered_verse: Verse = verses::table
        .filter(verses::verse_key.eq("1/3.2"))
        .select(Verse::as_select())
        .first(&mut conn).unwrap();
    assert_eq!(recovered_verse.chapter_id, chapter_two.id);
}

#[test]
#[serial]
fn test_fully_rolled_back_book_leads_to_orphan_synthesis() {
    h::app_data_setup();
    h::reset_archive();
    let app_data = get_app_data();
    let _lock = app_data.dbm.archive.write_lock.lock();
    let mut conn = app_data.dbm.archive.get_conn().expect("No archive conn");

    let mut session = IngestSession::new();

    // The whole first page rolls back, book and chapter included.
    let events = parse_page(&["Book of Apollo", "Chapter 1", "1/1.1 a"], 1);
    let result = conn.transaction::<(), anyhow::Error, _>(|tx_conn| {
        session.ingest_events(tx_conn, &events, 1)?;
        Err(anyhow!("simulated page failure"))
    });
    assert!(result.is_err());
    let book_count: i64 = books::table.count().get_result(&mut conn).unwrap();
    assert_eq!(book_count, 0);

    // Page 2 carries only verse content. Recovery finds nothing to trust,
    // so the verse is treated as orphaned.
    let events = parse_page(&["1/1.2 b"], 2);
    conn.transaction::<_, anyhow::Error, _>(|tx_conn| {
        session.ingest_events(tx_conn, &events, 2)
    }).unwrap();
    session.finish_ingestion(&mut conn).unwrap();

    let all_books: Vec<Book> = books::table.select(Book::as_select()).load(&mut conn).unwrap();
    assert_eq!(all_books.len(), 1);
    assert_eq!(all_books[0].title, INTRODUCTION_BOOK_TITLE);
}

#[test]
#[serial]
fn test_chapter_reassigned_to_other_book_is_dropped() {
    h::app_data_setup();
    h::reset_archive();
    let app_data = get_app_data();
    let _lock = app_data.dbm.archive.write_lock.lock();
    let mut conn = app_data.dbm.archive.get_conn().expect("No archive conn");

    let mut session = IngestSession::new();

    let events = parse_page(&["Book of Apollo", "Chapter 1", "1/1.1 a"], 1);
    conn.transaction::<_, anyhow::Error, _>(|tx_conn| {
        session.ingest_events(tx_conn, &events, 1)
    }).unwrap();

    // Another actor re-points the chapter at a different book between
    // pages. The consistency check must refuse to trust the pointer.
    let other_book_id: i32 = diesel::insert_into(books::table)
        .values((
            books::title.eq("Book of Hermes"),
            books::source_page.eq(90),
        ))
        .returning(books::id)
        .get_result(&mut conn).unwrap();
    diesel::update(chapters::table)
        .set(chapters::book_id.eq(Some(other_book_id)))
        .execute(&mut conn).unwrap();

    // With its chapter pointer dropped and no chapter left under Book of
    // Apollo, the next verse is orphaned into the Preface.
    let events = parse_page(&["1/1.2 b"], 2);
    conn.transaction::<_, anyhow::Error, _>(|tx_conn| {
        session.ingest_events(tx_conn, &events, 2)
    }).unwrap();
    session.finish_ingestion(&mut conn).unwrap();

    let intro_count: i64 = books::table
        .filter(books::title.eq(INTRODUCTION_BOOK_TITLE))
        .count()
        .get_result(&mut conn).unwrap();
    assert_eq!(intro_count, 1);
}
