use std::{fs, path::PathBuf};

use serde::Serialize;
use sqlx::{Row, SqlitePool, migrate::Migrator, sqlite::SqliteConnectOptions, sqlite::SqliteRow};
use thiserror::Error;
use time::OffsetDateTime;

use crate::category::Category;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("XDG data directory is unavailable")]
    MissingDataDir,
    #[error("invalid category: {0}")]
    InvalidCategory(String),
}

/// A remote folder created earlier for (name, user, parent).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderRecord {
    pub id: i64,
    pub folder_name: String,
    pub remote_folder_id: String,
    pub parent_remote_id: String,
    pub owner_user_id: String,
    pub created_at: i64,
}

#[derive(Debug, Clone)]
pub struct FileInput<'a> {
    pub filename: &'a str,
    pub remote_file_id: &'a str,
    pub web_view_link: Option<&'a str>,
    pub remote_folder_id: &'a str,
    pub category: Category,
    pub owner_user_id: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: i64,
    pub filename: String,
    pub remote_file_id: String,
    pub web_view_link: Option<String>,
    pub remote_folder_id: String,
    pub category: Category,
    pub owner_user_id: String,
    pub uploaded_at: i64,
}

/// Filters for listing a user's uploaded files.
#[derive(Debug, Clone, Default)]
pub struct FileQuery {
    pub user_id: String,
    pub category: Option<Category>,
    pub search: Option<String>,
    pub folder_id: Option<String>,
}

pub struct IndexStore {
    pool: SqlitePool,
}

impl IndexStore {
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn new(database_url: &str) -> Result<Self, IndexError> {
        let pool = SqlitePool::connect(database_url).await?;
        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    pub async fn new_default() -> Result<Self, IndexError> {
        let db_path = default_db_path()?;
        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;
        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    pub async fn init(&self) -> Result<(), IndexError> {
        MIGRATOR.run(&self.pool).await?;
        Ok(())
    }

    /// Oldest record wins when a race left duplicates behind.
    pub async fn find_folder(
        &self,
        name: &str,
        user_id: &str,
        parent_id: &str,
    ) -> Result<Option<FolderRecord>, IndexError> {
        let row = sqlx::query(
            "SELECT id, folder_name, drive_folder_id, parent_drive_id, user_id, created_at
             FROM drive_folders
             WHERE folder_name = ?1 AND user_id = ?2 AND parent_drive_id = ?3
             ORDER BY id ASC
             LIMIT 1",
        )
        .bind(name)
        .bind(user_id)
        .bind(parent_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| folder_from_row(&row)).transpose()
    }

    pub async fn insert_folder(
        &self,
        name: &str,
        remote_id: &str,
        parent_id: &str,
        user_id: &str,
    ) -> Result<i64, IndexError> {
        let result = sqlx::query(
            "INSERT INTO drive_folders (folder_name, drive_folder_id, parent_drive_id, user_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(name)
        .bind(remote_id)
        .bind(parent_id)
        .bind(user_id)
        .bind(now_unix())
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn list_folders(&self, user_id: &str) -> Result<Vec<FolderRecord>, IndexError> {
        let rows = sqlx::query(
            "SELECT id, folder_name, drive_folder_id, parent_drive_id, user_id, created_at
             FROM drive_folders
             WHERE user_id = ?1
             ORDER BY id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(folder_from_row).collect()
    }

    pub async fn insert_file(&self, file: &FileInput<'_>) -> Result<i64, IndexError> {
        let result = sqlx::query(
            "INSERT INTO files (filename, drive_file_id, web_view_link, drive_folder_id, category, user_id, uploaded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(file.filename)
        .bind(file.remote_file_id)
        .bind(file.web_view_link)
        .bind(file.remote_folder_id)
        .bind(file.category.as_str())
        .bind(file.owner_user_id)
        .bind(now_unix())
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn get_file(&self, id: i64) -> Result<Option<FileRecord>, IndexError> {
        let row = sqlx::query(
            "SELECT id, filename, drive_file_id, web_view_link, drive_folder_id, category, user_id, uploaded_at
             FROM files WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| file_from_row(&row)).transpose()
    }

    pub async fn list_files(&self, query: &FileQuery) -> Result<Vec<FileRecord>, IndexError> {
        let pattern = query
            .search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", escape_like(s)));
        let rows = sqlx::query(
            r"SELECT id, filename, drive_file_id, web_view_link, drive_folder_id, category, user_id, uploaded_at
             FROM files
             WHERE user_id = ?1
               AND (?2 IS NULL OR category = ?2)
               AND (?3 IS NULL OR filename LIKE ?3 ESCAPE '\')
               AND (?4 IS NULL OR drive_folder_id = ?4)
             ORDER BY uploaded_at DESC, id DESC",
        )
        .bind(&query.user_id)
        .bind(query.category.map(|c| c.as_str()))
        .bind(pattern)
        .bind(&query.folder_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(file_from_row).collect()
    }
}

fn folder_from_row(row: &SqliteRow) -> Result<FolderRecord, IndexError> {
    Ok(FolderRecord {
        id: row.try_get("id")?,
        folder_name: row.try_get("folder_name")?,
        remote_folder_id: row.try_get("drive_folder_id")?,
        parent_remote_id: row.try_get("parent_drive_id")?,
        owner_user_id: row.try_get("user_id")?,
        created_at: row.try_get("created_at")?,
    })
}

fn file_from_row(row: &SqliteRow) -> Result<FileRecord, IndexError> {
    let category: String = row.try_get("category")?;
    Ok(FileRecord {
        id: row.try_get("id")?,
        filename: row.try_get("filename")?,
        remote_file_id: row.try_get("drive_file_id")?,
        web_view_link: row.try_get("web_view_link")?,
        remote_folder_id: row.try_get("drive_folder_id")?,
        category: Category::parse(&category).ok_or(IndexError::InvalidCategory(category))?,
        owner_user_id: row.try_get("user_id")?,
        uploaded_at: row.try_get("uploaded_at")?,
    })
}

fn escape_like(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

fn now_unix() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

fn default_db_path() -> Result<PathBuf, IndexError> {
    let mut path = dirs::data_dir().ok_or(IndexError::MissingDataDir)?;
    path.push("drivetree");
    path.push("index.db");
    Ok(path)
}
