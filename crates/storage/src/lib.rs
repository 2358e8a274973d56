use anyhow::{anyhow, Context, Result};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite, Transaction,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use thiserror::Error;

use shared::domain::{Counter, CounterId, NewCounter};

/// Raised by [`CounterTx::create_row`] when the name is already taken.
/// Travels inside `anyhow::Error`; recover it with `downcast_ref`.
#[derive(Debug, Error)]
#[error("counter '{name}' already exists")]
pub struct DuplicateCounterName {
    pub name: String,
}

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

/// One storage transaction. Dropping it without [`CounterTx::commit`] rolls back.
pub struct CounterTx {
    tx: Transaction<'static, Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn begin(&self) -> Result<CounterTx> {
        let tx = self
            .pool
            .begin()
            .await
            .context("failed to open counter transaction")?;
        Ok(CounterTx { tx })
    }

    /// Drops every counter row. Test support only; normal operation never deletes.
    pub async fn reset_all(&self) -> Result<()> {
        sqlx::query("DELETE FROM counters")
            .execute(&self.pool)
            .await
            .context("failed to clear counters")?;
        Ok(())
    }

    pub async fn count_rows(&self) -> Result<i64> {
        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM counters")
            .fetch_one(&self.pool)
            .await
            .context("failed to count counters")?;
        Ok(rows)
    }
}

impl CounterTx {
    pub async fn find_row(&mut self, name: &str) -> Result<Option<Counter>> {
        let row = sqlx::query("SELECT id, name, count FROM counters WHERE name = ?")
            .bind(name)
            .fetch_optional(&mut *self.tx)
            .await
            .with_context(|| format!("failed to load counter '{name}'"))?;
        row.as_ref().map(counter_from_row).transpose()
    }

    pub async fn create_row(&mut self, new_counter: &NewCounter) -> Result<Counter> {
        let result = sqlx::query(
            "INSERT INTO counters (name, count) VALUES (?, ?) RETURNING id, name, count",
        )
        .bind(&new_counter.name)
        .bind(new_counter.count)
        .fetch_one(&mut *self.tx)
        .await;

        match result {
            Ok(row) => counter_from_row(&row),
            Err(sqlx::Error::Database(db_error)) if db_error.is_unique_violation() => {
                Err(DuplicateCounterName {
                    name: new_counter.name.clone(),
                }
                .into())
            }
            Err(error) => Err(anyhow::Error::new(error)
                .context(format!("failed to create counter '{}'", new_counter.name))),
        }
    }

    /// Writes `count` back to the row identified by `counter.id`.
    pub async fn save_row(&mut self, counter: &Counter) -> Result<Counter> {
        let row = sqlx::query("UPDATE counters SET count = ? WHERE id = ? RETURNING id, name, count")
            .bind(counter.count)
            .bind(counter.id.0)
            .fetch_optional(&mut *self.tx)
            .await
            .with_context(|| format!("failed to save counter '{}'", counter.name))?
            .ok_or_else(|| anyhow!("counter row {} no longer exists", counter.id.0))?;
        counter_from_row(&row)
    }

    pub async fn commit(self) -> Result<()> {
        self.tx
            .commit()
            .await
            .context("failed to commit counter transaction")
    }
}

fn counter_from_row(row: &SqliteRow) -> Result<Counter> {
    Ok(Counter {
        id: CounterId(row.try_get::<i64, _>("id")?),
        name: row.try_get::<String, _>("name")?,
        count: row.try_get::<i64, _>("count")?,
    })
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() || path == ":memory:" {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
