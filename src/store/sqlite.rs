use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{debug, info, instrument};

use crate::core::{Deadline, Quote, QuoteRecord, QuoteStore, StoreError};

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS cotacoes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        bid TEXT,
        timestamp DATETIME
    )"#;

const INSERT_QUOTE: &str = "INSERT INTO cotacoes (bid, timestamp) VALUES (?, ?)";

/// Append-only quote log backed by SQLite.
///
/// The pool is the one storage handle shared by every request; SQLite's own
/// locking serialises concurrent writers.
#[derive(Clone)]
pub struct SqliteQuoteStore {
    pool: SqlitePool,
}

impl SqliteQuoteStore {
    /// Opens (creating if needed) the database at `db_url` and makes sure the table exists.
    pub async fn open(db_url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(db_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        Self::with_pool(pool).await
    }

    pub async fn with_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::query(CREATE_TABLE).execute(&pool).await?;
        debug!("Quote table ready");
        Ok(Self { pool })
    }

    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM cotacoes")
            .fetch_one(&self.pool)
            .await
    }

    /// Most recently appended record, if any.
    pub async fn latest(&self) -> Result<Option<QuoteRecord>, sqlx::Error> {
        sqlx::query_as::<_, QuoteRecord>(
            "SELECT id, bid, timestamp FROM cotacoes ORDER BY id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
    }
}

#[async_trait]
impl QuoteStore for SqliteQuoteStore {
    #[instrument(name = "QuoteAppend", skip(self, quote), fields(budget = %deadline))]
    async fn append(&self, deadline: Deadline, quote: &Quote) -> Result<(), StoreError> {
        let insert = async {
            sqlx::query(INSERT_QUOTE)
                .bind(&quote.bid)
                .bind(Utc::now())
                .execute(&self.pool)
                .await
        };

        let result = deadline
            .run(insert)
            .await
            .map_err(|e| StoreError::Write(e.to_string()))?
            .map_err(|e| StoreError::Write(e.to_string()))?;

        info!(bid = %quote.bid, id = result.last_insert_rowid(), "Quote stored");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::{Connection, SqliteConnection};
    use std::time::Duration;
    use tempfile::TempDir;

    fn temp_db_url(dir: &TempDir) -> String {
        format!("sqlite://{}", dir.path().join("cotacoes.db").display())
    }

    async fn open_temp_store(dir: &TempDir) -> SqliteQuoteStore {
        SqliteQuoteStore::open(&temp_db_url(dir)).await.unwrap()
    }

    fn quote(bid: &str) -> Quote {
        Quote {
            bid: bid.to_string(),
        }
    }

    #[tokio::test]
    async fn test_append_and_read_back() {
        let dir = TempDir::new().unwrap();
        let store = open_temp_store(&dir).await;
        let before = Utc::now();

        store
            .append(Deadline::after(Duration::from_secs(1)), &quote("5.4321"))
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        let record = store.latest().await.unwrap().unwrap();
        assert_eq!(record.id, 1);
        assert_eq!(record.bid, "5.4321");
        assert!(record.timestamp >= before - chrono::Duration::seconds(1));
    }

    #[tokio::test]
    async fn test_append_only_log_grows() {
        let dir = TempDir::new().unwrap();
        let store = open_temp_store(&dir).await;

        for bid in ["5.10", "5.20", "5.30"] {
            store
                .append(Deadline::after(Duration::from_secs(1)), &quote(bid))
                .await
                .unwrap();
        }

        assert_eq!(store.count().await.unwrap(), 3);
        assert_eq!(store.latest().await.unwrap().unwrap().bid, "5.30");
    }

    #[tokio::test]
    async fn test_reopen_keeps_existing_rows() {
        let dir = TempDir::new().unwrap();
        let store = open_temp_store(&dir).await;
        store
            .append(Deadline::after(Duration::from_secs(1)), &quote("5.00"))
            .await
            .unwrap();
        drop(store);

        let reopened = open_temp_store(&dir).await;
        assert_eq!(reopened.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_expired_deadline_is_write_error() {
        let dir = TempDir::new().unwrap();
        let store = open_temp_store(&dir).await;

        let deadline = Deadline::after(Duration::ZERO);
        let err = store.append(deadline, &quote("5.43")).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "store write error: deadline of 0ms exceeded"
        );
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_deadline_expires_while_database_is_locked() {
        let dir = TempDir::new().unwrap();
        let store = open_temp_store(&dir).await;

        let mut locker = SqliteConnection::connect(&temp_db_url(&dir)).await.unwrap();
        sqlx::query("BEGIN IMMEDIATE")
            .execute(&mut locker)
            .await
            .unwrap();

        let started = std::time::Instant::now();
        let err = store
            .append(Deadline::after(Duration::from_millis(20)), &quote("5.43"))
            .await
            .unwrap_err();
        let elapsed = started.elapsed();

        assert!(matches!(err, StoreError::Write(_)));
        assert_eq!(
            err.to_string(),
            "store write error: deadline of 20ms exceeded"
        );
        assert!(elapsed < Duration::from_secs(1), "took {elapsed:?}");

        sqlx::query("ROLLBACK").execute(&mut locker).await.unwrap();
        locker.close().await.unwrap();

        // The abandoned insert may still land once the lock is gone, never twice.
        let count = store.count().await.unwrap();
        assert!(count <= 1, "unexpected row count {count}");
        if count == 1 {
            assert_eq!(store.latest().await.unwrap().unwrap().bid, "5.43");
        }
    }

    #[tokio::test]
    async fn test_open_fails_for_missing_directory() {
        let dir = TempDir::new().unwrap();
        let db_url = format!(
            "sqlite://{}",
            dir.path().join("missing").join("cotacoes.db").display()
        );

        let result = SqliteQuoteStore::open(&db_url).await;
        assert!(matches!(result, Err(StoreError::Init(_))));
    }
}
