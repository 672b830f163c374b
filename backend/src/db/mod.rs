pub mod archive;
pub mod archive_models;
pub mod archive_schema;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use diesel::prelude::*;
use diesel::r2d2::{Pool, ConnectionManager, PooledConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use dotenvy::dotenv;
use parking_lot::Mutex;
use anyhow::{Context, Result, Error as AnyhowError};

use crate::db::archive::ArchiveDbHandle;
use crate::get_create_scriptura_app_root;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations/archive");

pub type SqlitePool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConn = PooledConnection<ConnectionManager<SqliteConnection>>;

#[derive(Debug)]
pub struct DatabaseHandle {
    pool: SqlitePool,
    pub write_lock: Mutex<()>,
}

#[derive(Debug)]
pub struct DbManager {
    pub archive: ArchiveDbHandle,
}

impl DatabaseHandle {
    pub fn new(database_url: &str) -> Result<Self> {
        let manager = ConnectionManager::new(database_url);
        let pool = Pool::builder()
            .max_size(5)
            .build(manager)
            .with_context(|| format!("Failed to create pool for: {}", database_url))?;

        Ok(Self {
            pool,
            write_lock: Mutex::new(()),
        })
    }

    pub fn get_conn(&self) -> Result<DbConn> {
        self.pool.get().map_err(AnyhowError::from)
    }

    /// Performs a write operation on the database, guarded by a Mutex write_lock.
    pub fn do_write<F, T>(&self, operation: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T, diesel::result::Error>,
    {
        let _lock = self.write_lock.lock();
        let mut db_conn = self.pool.get()
            .context("Failed to get connection from pool for write")?;
        operation(&mut db_conn).map_err(AnyhowError::from)
    }

    /// Performs a read operation on the database.
    pub fn do_read<F, T>(&self, operation: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T, diesel::result::Error>,
    {
        let mut db_conn = self.pool.get()
            .context("Failed to get connection from pool for read")?;
        operation(&mut db_conn).map_err(AnyhowError::from)
    }
}

impl DbManager {
    pub fn new() -> Result<Self> {
        dotenv().ok();

        let archive_db_path = archive_db_path()?;
        initialize_archive_db(&archive_db_path)?;

        let abs_path = fs::canonicalize(&archive_db_path).unwrap_or(archive_db_path);
        let database_url = abs_path.to_str()
            .ok_or_else(|| anyhow::anyhow!("Archive db path is not valid UTF-8: {:?}", abs_path))?
            .to_string();

        Ok(Self {
            archive: DatabaseHandle::new(&database_url)?,
        })
    }
}

/// Resolve the archive database location under the Scriptura data root.
///
/// Precedence: SCRIPTURA_DIR env var, then the platform data directory.
pub fn archive_db_path() -> Result<PathBuf> {
    let scriptura_dir = match env::var("SCRIPTURA_DIR") {
        Ok(s) => PathBuf::from(s),
        Err(_) => {
            if let Ok(p) = get_create_scriptura_app_root() {
                p
            } else {
                PathBuf::from(".")
            }
        }
    };

    let assets_dir = scriptura_dir.join("app-assets");
    if !assets_dir.exists() {
        fs::create_dir_all(&assets_dir)
            .with_context(|| format!("Failed to create assets dir: {:?}", assets_dir))?;
    }

    Ok(assets_dir.join("archive.sqlite3"))
}

/// Create the database file and run pending migrations.
///
/// Unlike a reader application, the ingestion engine owns its database and
/// must be able to start from an empty data directory.
fn initialize_archive_db(db_path: &Path) -> Result<()> {
    let db_url = db_path.to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid database path: {:?}", db_path))?;

    let mut conn = SqliteConnection::establish(db_url)
        .with_context(|| format!("Failed to connect to database: {}", db_url))?;

    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow::anyhow!("Failed to run archive migrations: {}", e))?;

    Ok(())
}

/// Establish a single connection to the archive database.
pub fn establish_connection() -> Result<SqliteConnection> {
    dotenv().ok();

    let db_path = archive_db_path()?;
    initialize_archive_db(&db_path)?;

    let abs_path = fs::canonicalize(&db_path).unwrap_or(db_path);
    let db_url = abs_path.to_str()
        .ok_or_else(|| anyhow::anyhow!("Archive db path is not valid UTF-8: {:?}", abs_path))?;

    SqliteConnection::establish(db_url)
        .with_context(|| format!("Error connecting to {}", db_url))
}
