use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::error::Result;
use crate::io::excel_read::CATALOG_SHEET;
use crate::reconcile::{CatalogSource, Tracker};
use crate::store::StatusStore;

pub const DEFAULT_BIND: &str = "0.0.0.0:8000";
pub const DEFAULT_CATALOG_PATH: &str = "ISMS-P.xlsx";
pub const DEFAULT_DATABASE_PATH: &str = "isms.db";
pub const DEFAULT_FONT_PATH: &str = "NanumGothic.ttf";
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";

/// Paths shared by the server and the offline commands.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub catalog_path: PathBuf,
    pub catalog_sheet: String,
    pub database_path: PathBuf,
    /// TrueType font embedded in PDF reports. Must cover Hangul.
    pub font_path: Option<PathBuf>,
    pub upload_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from(DEFAULT_CATALOG_PATH),
            catalog_sheet: CATALOG_SHEET.to_string(),
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            font_path: Some(PathBuf::from(DEFAULT_FONT_PATH)),
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
        }
    }
}

impl AppConfig {
    pub fn catalog(&self) -> CatalogSource {
        CatalogSource::new(self.catalog_path.clone(), self.catalog_sheet.clone())
    }

    /// Opens the status database and wires it to the catalog.
    pub fn open_tracker(&self) -> Result<Tracker> {
        let store = StatusStore::open(&self.database_path)?;
        info!(
            database = %self.database_path.display(),
            catalog = %self.catalog_path.display(),
            "status store opened"
        );
        Ok(Tracker::new(self.catalog(), Arc::new(store)))
    }
}

/// Settings for the HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub app: AppConfig,
}
