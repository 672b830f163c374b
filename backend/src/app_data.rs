use anyhow::Result;

use crate::db::DbManager;
use crate::app_settings::AppSettings;
use crate::types::StatusSummary;

/// Represents the application data and settings
#[derive(Debug)]
pub struct AppData {
    pub dbm: DbManager,
    pub app_settings_cache: AppSettings,
}

impl AppData {
    pub fn new() -> Self {
        let dbm = DbManager::new().expect("Can't create DbManager");
        let app_settings_cache = dbm.archive.get_app_settings();

        AppData {
            dbm,
            app_settings_cache,
        }
    }

    /// Archive snapshot for the status command.
    pub fn status_summary(&self) -> Result<StatusSummary> {
        let (books, chapters, verses, notes, images) = self.dbm.archive.entity_counts()?;
        let pages = self.dbm.archive.page_count()?;
        let page_errors = self.dbm.archive.page_error_count()?;
        let checkpoints = self.dbm.archive.get_checkpoints()?
            .into_iter()
            .map(|cp| (cp.phase, cp.last_page))
            .collect();

        Ok(StatusSummary {
            pages,
            books,
            chapters,
            verses,
            notes,
            images,
            page_errors,
            checkpoints,
        })
    }
}
