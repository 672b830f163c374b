use serde::{Serialize, Deserialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    /// Primary language of the source document ("en", "zh", ...).
    pub source_language: String,
    /// Parse pages classified as front matter instead of skipping them.
    pub ingest_front_matter: bool,
    /// Store raw image payloads extracted from the source PDF.
    pub keep_image_payloads: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            source_language: "en".to_string(),
            ingest_front_matter: false,
            keep_image_payloads: true,
        }
    }
}
