use diesel::prelude::*;
use serial_test::serial;

mod helpers;
use helpers as h;

use scriptura_backend::get_app_data;
use scriptura_backend::db::archive;
use scriptura_backend::db::archive_models::{Image, NewNote, NoteImage};
use scriptura_backend::db::archive_schema::{images, note_images};
use scriptura_backend::ingest::linker::{link_image_to_note, upsert_image};

#[test]
#[serial]
fn test_linking_twice_is_idempotent() {
    h::app_data_setup();
    h::reset_archive();
    let app_data = get_app_data();
    let _lock = app_data.dbm.archive.write_lock.lock();
    let mut conn = app_data.dbm.archive.get_conn().expect("No archive conn");

    let note_id = archive::insert_note(&mut conn, &NewNote {
        verse_id: None,
        note_key: "1",
        content: "a note",
        source_page: 3,
    }).unwrap();

    let first = link_image_to_note(&mut conn, note_id, "IMG007", "The gate", 3).unwrap();
    let second = link_image_to_note(&mut conn, note_id, "IMG007", "The gate", 3).unwrap();
    assert_eq!(first, second);

    let image_count: i64 = images::table.count().get_result(&mut conn).unwrap();
    assert_eq!(image_count, 1);

    let link_count: i64 = note_images::table.count().get_result(&mut conn).unwrap();
    assert_eq!(link_count, 1);
}

#[test]
#[serial]
fn test_two_notes_can_share_an_image() {
    h::app_data_setup();
    h::reset_archive();
    let app_data = get_app_data();
    let _lock = app_data.dbm.archive.write_lock.lock();
    let mut conn = app_data.dbm.archive.get_conn().expect("No archive conn");

    let note_a = archive::insert_note(&mut conn, &NewNote {
        verse_id: None,
        note_key: "1",
        content: "first",
        source_page: 3,
    }).unwrap();
    let note_b = archive::insert_note(&mut conn, &NewNote {
        verse_id: None,
        note_key: "2",
        content: "second",
        source_page: 4,
    }).unwrap();

    let img_a = link_image_to_note(&mut conn, note_a, "IMG001", "Shared plate", 3).unwrap();
    let img_b = link_image_to_note(&mut conn, note_b, "IMG001", "Shared plate", 4).unwrap();
    assert_eq!(img_a, img_b);

    let image_count: i64 = images::table.count().get_result(&mut conn).unwrap();
    assert_eq!(image_count, 1);

    let links: Vec<NoteImage> = note_images::table
        .order(note_images::id.asc())
        .select(NoteImage::as_select())
        .load(&mut conn).unwrap();
    assert_eq!(links.len(), 2);
    assert_eq!(links[0].note_id, note_a);
    assert_eq!(links[1].note_id, note_b);
}

#[test]
#[serial]
fn test_upsert_image_keeps_first_caption_and_page() {
    h::app_data_setup();
    h::reset_archive();
    let app_data = get_app_data();
    let _lock = app_data.dbm.archive.write_lock.lock();
    let mut conn = app_data.dbm.archive.get_conn().expect("No archive conn");

    let first = upsert_image(&mut conn, "IMG010", "Original caption", 10).unwrap();
    // A re-ingestion run sees the marker again, possibly with OCR drift.
    let second = upsert_image(&mut conn, "IMG010", "Originol caption", 11).unwrap();
    assert_eq!(first, second);

    let image: Image = images::table.select(Image::as_select()).first(&mut conn).unwrap();
    assert_eq!(image.title, "Original caption");
    assert_eq!(image.source_page, 10);
}
