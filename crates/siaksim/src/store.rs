//! Persistence gateway over the `records` table.
//!
//! One row per name: credentials plus the best recorded run. Login and
//! registration share the row creation path; plan submission is the only
//! mutation.

use std::str::FromStr;
use std::time::Duration;

use siaksim_common::constants::LEADERBOARD_LIMIT;
use siaksim_common::{LeaderboardRow, PortalError, UserRecord};
use sqlx::sqlite::{SqliteRow, SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    time_elapsed INTEGER,
    submitted_body TEXT,
    is_bot INTEGER NOT NULL DEFAULT 0
)";

/// Handle to the records store. Cheap to clone; wraps a pool.
#[derive(Clone)]
pub struct RecordStore {
    pool: SqlitePool,
}

impl RecordStore {
    /// Open (creating if missing) the database at `url` and ensure the
    /// schema exists.
    pub async fn connect(url: &str) -> Result<Self, PortalError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(db_err)?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(db_err)?;
        sqlx::query(SCHEMA).execute(&pool).await.map_err(db_err)?;
        Ok(Self { pool })
    }

    /// In-memory store for tests. Single connection so every query sees
    /// the same database.
    pub async fn in_memory() -> Result<Self, PortalError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(db_err)?;
        sqlx::query(SCHEMA).execute(&pool).await.map_err(db_err)?;
        Ok(Self { pool })
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<UserRecord>, PortalError> {
        let row = sqlx::query(
            "SELECT id, name, password_hash, time_elapsed, submitted_body, is_bot
             FROM records WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.map(record_from_row).transpose()
    }

    /// First-use registration: insert a fresh row with no run recorded.
    pub async fn create(&self, name: &str, password_hash: &str) -> Result<(), PortalError> {
        sqlx::query("INSERT INTO records (name, password_hash) VALUES (?, ?)")
            .bind(name)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    /// Record a finished run. The prior-time read and the update share one
    /// immediate transaction: the write lock is taken up front, so a
    /// concurrent same-name submission waits at BEGIN instead of failing
    /// the shared-to-exclusive lock upgrade after its read.
    ///
    /// Returns whether the run improved on the stored time; no prior time
    /// counts as improved.
    pub async fn record_run(
        &self,
        name: &str,
        submitted_body: &str,
        time_elapsed: i64,
        is_bot: bool,
    ) -> Result<bool, PortalError> {
        let mut conn = self.pool.acquire().await.map_err(db_err)?;
        sqlx::query("BEGIN IMMEDIATE")
            .execute(&mut *conn)
            .await
            .map_err(db_err)?;

        match Self::record_run_locked(&mut conn, name, submitted_body, time_elapsed, is_bot).await {
            Ok(improved) => {
                sqlx::query("COMMIT").execute(&mut *conn).await.map_err(db_err)?;
                Ok(improved)
            }
            Err(err) => {
                let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
                Err(err)
            }
        }
    }

    async fn record_run_locked(
        conn: &mut sqlx::SqliteConnection,
        name: &str,
        submitted_body: &str,
        time_elapsed: i64,
        is_bot: bool,
    ) -> Result<bool, PortalError> {
        let prior: Option<Option<i64>> =
            sqlx::query_scalar("SELECT time_elapsed FROM records WHERE name = ?")
                .bind(name)
                .fetch_optional(&mut *conn)
                .await
                .map_err(db_err)?;
        let Some(prior) = prior else {
            return Err(PortalError::Database(format!("no record for {name}")));
        };

        let improved = prior.is_none_or(|p| p > time_elapsed);

        sqlx::query(
            "UPDATE records SET submitted_body = ?, time_elapsed = ?, is_bot = ? WHERE name = ?",
        )
        .bind(submitted_body)
        .bind(time_elapsed)
        .bind(is_bot as i64)
        .bind(name)
        .execute(&mut *conn)
        .await
        .map_err(db_err)?;

        Ok(improved)
    }

    /// Top finished runs for one class of participant, fastest first.
    /// Rows without a recorded time never rank.
    pub async fn leaderboard(&self, bots: bool) -> Result<Vec<LeaderboardRow>, PortalError> {
        let rows = sqlx::query(
            "SELECT name, time_elapsed FROM records
             WHERE is_bot = ? AND time_elapsed IS NOT NULL
             ORDER BY time_elapsed ASC LIMIT ?",
        )
        .bind(bots as i64)
        .bind(LEADERBOARD_LIMIT)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter()
            .map(|row| {
                Ok(LeaderboardRow {
                    name: row.try_get("name").map_err(db_err)?,
                    time_elapsed: row.try_get("time_elapsed").map_err(db_err)?,
                })
            })
            .collect()
    }
}

fn record_from_row(row: SqliteRow) -> Result<UserRecord, PortalError> {
    Ok(UserRecord {
        id: row.try_get("id").map_err(db_err)?,
        name: row.try_get("name").map_err(db_err)?,
        password_hash: row.try_get("password_hash").map_err(db_err)?,
        time_elapsed: row.try_get("time_elapsed").map_err(db_err)?,
        submitted_body: row.try_get("submitted_body").map_err(db_err)?,
        is_bot: row.try_get("is_bot").map_err(db_err)?,
    })
}

fn db_err(err: impl std::fmt::Display) -> PortalError {
    PortalError::Database(err.to_string())
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;

    async fn store_with(name: &str) -> RecordStore {
        let store = RecordStore::in_memory().await.unwrap();
        store.create(name, "hash").await.unwrap();
        store
    }

    #[tokio::test]
    async fn create_then_find() {
        let store = store_with("alice").await;
        let record = store.find_by_name("alice").await.unwrap().unwrap();
        assert_eq!(record.name, "alice");
        assert_eq!(record.time_elapsed, None);
        assert_eq!(record.submitted_body, None);
        assert!(store.find_by_name("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_name_is_rejected() {
        let store = store_with("alice").await;
        assert!(store.create("alice", "other").await.is_err());
    }

    #[tokio::test]
    async fn first_run_is_always_an_improvement() {
        let store = store_with("alice").await;
        assert!(store.record_run("alice", "{}", 9000, false).await.unwrap());
        let record = store.find_by_name("alice").await.unwrap().unwrap();
        assert_eq!(record.time_elapsed, Some(9000));
    }

    #[tokio::test]
    async fn slower_run_reports_not_improved() {
        let store = store_with("alice").await;
        store.record_run("alice", "{}", 5000, false).await.unwrap();
        assert!(!store.record_run("alice", "{}", 8000, false).await.unwrap());
        // The stored value still follows the latest submission.
        let record = store.find_by_name("alice").await.unwrap().unwrap();
        assert_eq!(record.time_elapsed, Some(8000));
    }

    #[tokio::test]
    async fn faster_run_reports_improved() {
        let store = store_with("alice").await;
        store.record_run("alice", "{}", 5000, false).await.unwrap();
        assert!(store.record_run("alice", "{}", 3000, false).await.unwrap());
    }

    #[tokio::test]
    async fn racing_submissions_serialize_instead_of_erroring() {
        // A file-backed store so contenders get separate connections.
        let path = std::env::temp_dir().join(format!(
            "siaksim-race-{}-{:08x}.db",
            std::process::id(),
            rand::rng().random::<u32>()
        ));
        let url = format!("sqlite:{}", path.display());
        let store = RecordStore::connect(&url).await.unwrap();
        store.create("alice", "h").await.unwrap();

        let mut contenders = Vec::new();
        for i in 1..=4i64 {
            let store = store.clone();
            contenders.push(tokio::spawn(async move {
                store.record_run("alice", "{}", i * 1000, false).await
            }));
        }
        for contender in contenders {
            // Late writers must wait for the lock, not surface a 500.
            contender.await.unwrap().unwrap();
        }

        let record = store.find_by_name("alice").await.unwrap().unwrap();
        let stored = record.time_elapsed.unwrap();
        assert!((1..=4).contains(&(stored / 1000)));
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn run_for_unknown_name_errors() {
        let store = RecordStore::in_memory().await.unwrap();
        assert!(store.record_run("ghost", "{}", 1, false).await.is_err());
    }

    #[tokio::test]
    async fn leaderboard_filters_and_orders() {
        let store = RecordStore::in_memory().await.unwrap();
        store.create("slow", "h").await.unwrap();
        store.create("fast", "h").await.unwrap();
        store.create("robot", "h").await.unwrap();
        store.create("lurker", "h").await.unwrap();
        store.record_run("slow", "{}", 9000, false).await.unwrap();
        store.record_run("fast", "{}", 1000, false).await.unwrap();
        store.record_run("robot", "{}", 10, true).await.unwrap();

        let humans = store.leaderboard(false).await.unwrap();
        let names: Vec<_> = humans.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["fast", "slow"]);

        let bots = store.leaderboard(true).await.unwrap();
        assert_eq!(bots.len(), 1);
        assert_eq!(bots[0].name, "robot");
    }

    #[tokio::test]
    async fn leaderboard_caps_at_fifty() {
        let store = RecordStore::in_memory().await.unwrap();
        for i in 0..60 {
            let name = format!("runner{i}");
            store.create(&name, "h").await.unwrap();
            store.record_run(&name, "{}", i, false).await.unwrap();
        }
        let rows = store.leaderboard(false).await.unwrap();
        assert_eq!(rows.len(), 50);
        assert_eq!(rows[0].time_elapsed, 0);
    }
}
