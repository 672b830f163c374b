//! Image-note association.
//!
//! Image keys derive from the plate token in the source text, so re-running
//! ingestion over the same page must find the existing row instead of
//! creating a duplicate. Association rows are unique per (note, image)
//! pair; linking twice is a no-op.

use diesel::prelude::*;

use crate::db::archive;
use crate::db::archive_models::{NewImage, NewNoteImage};
use crate::logger::debug;

/// Find the image by its unique key, or persist it.
pub fn upsert_image(
    conn: &mut SqliteConnection,
    image_key: &str,
    caption: &str,
    source_page: i32,
) -> QueryResult<i32> {
    match archive::get_image_by_key(conn, image_key)? {
        Some(image) => Ok(image.id),
        None => {
            let new_image = NewImage {
                image_key,
                title: caption,
                source_page,
                content_data: None,
            };
            archive::insert_image(conn, &new_image)
        }
    }
}

/// Associate an image with a note, idempotently.
///
/// The image is upserted by key first; the association row is only added
/// when the pair is not already present.
pub fn link_image_to_note(
    conn: &mut SqliteConnection,
    for_note_id: i32,
    for_image_key: &str,
    caption: &str,
    source_page: i32,
) -> QueryResult<i32> {
    use crate::db::archive_schema::note_images::dsl::*;

    let for_image_id = upsert_image(conn, for_image_key, caption, source_page)?;

    let existing: Option<i32> = note_images
        .filter(note_id.eq(for_note_id))
        .filter(image_id.eq(for_image_id))
        .select(id)
        .first(conn)
        .optional()?;

    if existing.is_none() {
        let new_link = NewNoteImage {
            note_id: for_note_id,
            image_id: for_image_id,
        };
        diesel::insert_into(note_images)
            .values(&new_link)
            .execute(conn)?;
        debug(&format!("Linked image {} to note id {}", for_image_key, for_note_id));
    }

    Ok(for_image_id)
}
