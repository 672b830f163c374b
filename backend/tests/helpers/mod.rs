use std::env;
use std::sync::OnceLock;

use diesel::prelude::*;

use scriptura_backend::{get_app_data, init_app_data};

static SETUP: OnceLock<()> = OnceLock::new();

/// Point SCRIPTURA_DIR at a per-process temp directory and initialize the
/// app data once. The archive database is created there by the migration
/// runner, so each test binary works against its own isolated store.
pub fn app_data_setup() {
    SETUP.get_or_init(|| {
        let dir = env::temp_dir().join(format!("scriptura-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("Can't create test data dir");
        unsafe {
            env::set_var("SCRIPTURA_DIR", &dir);
            env::set_var("DISABLE_LOG", "true");
        }
        init_app_data();
    });
}

/// Delete all rows from every archive table, child tables first.
#[allow(dead_code)]
pub fn reset_archive() {
    use scriptura_backend::db::archive_schema::*;

    let app_data = get_app_data();
    app_data.dbm.archive.do_write(|conn| {
        diesel::delete(note_images::table).execute(conn)?;
        diesel::delete(notes::table).execute(conn)?;
        diesel::delete(verses::table).execute(conn)?;
        diesel::delete(chapters::table).execute(conn)?;
        diesel::delete(books::table).execute(conn)?;
        diesel::delete(images::table).execute(conn)?;
        diesel::delete(pages::table).execute(conn)?;
        diesel::delete(page_errors::table).execute(conn)?;
        diesel::delete(workflow_checkpoints::table).execute(conn)?;
        Ok(())
    }).expect("Can't reset the archive");
}
