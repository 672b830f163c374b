pub mod types;
pub mod helpers;
pub mod logger;
pub mod app_settings;
pub mod app_data;

pub mod db;
pub mod ingest;
pub mod page_load;
pub mod page_classify;
pub mod validation;
pub mod workflow;

use std::fs::create_dir_all;
use std::path::PathBuf;
use std::error::Error;
use std::sync::OnceLock;

use app_dirs::{get_app_root, AppDataType, AppInfo};

use crate::app_data::AppData;

pub const APP_INFO: AppInfo = AppInfo { name: "scriptura", author: "scriptura" };

pub static APP_DATA: OnceLock<AppData> = OnceLock::new();

pub fn get_create_scriptura_app_root() -> Result<PathBuf, Box<dyn Error>> {
    let p = get_app_root(AppDataType::UserData, &APP_INFO)?;
    if !p.exists() {
        create_dir_all(&p)?;
    }
    Ok(p)
}

pub fn get_create_scriptura_app_assets_path() -> PathBuf {
    let p = get_create_scriptura_app_root().unwrap_or(PathBuf::from(".")).join("app-assets/");
    if !p.exists() {
        let _ = create_dir_all(&p);
    }
    p
}

pub fn init_app_data() {
    if APP_DATA.get().is_none() {
        let app_data = AppData::new();
        let _ = APP_DATA.set(app_data);
    }
}

pub fn get_app_data() -> &'static AppData {
    APP_DATA.get().expect("AppData is not initialized")
}
