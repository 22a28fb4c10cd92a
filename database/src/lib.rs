use sqlx::{Pool, Row, Sqlite, SqlitePool};
use std::path::Path;
use tracing::{debug, info};

pub mod error;
pub mod media;
pub mod store;

pub use error::{Result, StoreError};
pub use store::{ListFilter, PostPage, PostStore};

/// SQLite connection pool wrapper
#[derive(Debug)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Open (and create if needed) the database at the given path
    pub async fn new(database_path: &str) -> Result<Self> {
        if let Some(parent) = Path::new(database_path).parent() {
            std::fs::create_dir_all(parent)?;
        }

        info!("Connecting to database at: {}", database_path);

        // SQLite connection strings need the sqlite: scheme; absolute paths
        // take a double slash
        let connection_string = if database_path.starts_with("sqlite:")
            || database_path.starts_with(":memory:")
        {
            database_path.to_string()
        } else if database_path.starts_with('/') {
            format!("sqlite://{}?mode=rwc", database_path)
        } else {
            format!("sqlite:{}?mode=rwc", database_path)
        };

        debug!("Using connection string: {}", connection_string);

        let pool = SqlitePool::connect(&connection_string).await?;

        Ok(Self { pool })
    }

    /// Wrap an already-connected pool (used by tests)
    pub fn from_pool(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Check if a table exists
    pub async fn table_exists(&self, table_name: &str) -> Result<bool> {
        let query = r#"
            SELECT COUNT(*) as count
            FROM sqlite_master
            WHERE type='table' AND name=?
        "#;

        let result: (i32,) = sqlx::query_as(query)
            .bind(table_name)
            .fetch_one(&self.pool)
            .await?;

        Ok(result.0 > 0)
    }

    /// Column names of a table, via PRAGMA table_info
    pub async fn table_columns(&self, table_name: &str) -> Result<Vec<String>> {
        let sql = format!("PRAGMA table_info({})", table_name);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in rows {
            columns.push(row.try_get::<String, _>("name")?);
        }
        Ok(columns)
    }

    /// Execute raw SQL (table and index bootstrap)
    pub async fn execute_raw(&self, sql: &str) -> Result<()> {
        sqlx::query(sql).execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) async fn create_test_db(dir: &tempfile::TempDir) -> Database {
        let db_path = dir.path().join("test.db");
        Database::new(db_path.to_str().unwrap()).await.unwrap()
    }

    #[tokio::test]
    async fn test_database_connection() {
        let dir = tempfile::tempdir().unwrap();
        let db = create_test_db(&dir).await;
        assert!(db.pool().acquire().await.is_ok());
    }

    #[tokio::test]
    async fn test_table_exists_and_columns() {
        let dir = tempfile::tempdir().unwrap();
        let db = create_test_db(&dir).await;

        db.execute_raw("CREATE TABLE sample (id INTEGER PRIMARY KEY, title TEXT)")
            .await
            .unwrap();

        assert!(db.table_exists("sample").await.unwrap());
        assert!(!db.table_exists("missing").await.unwrap());

        let columns = db.table_columns("sample").await.unwrap();
        assert_eq!(columns, vec!["id".to_string(), "title".to_string()]);
    }
}
