//! Counter operations over [`Storage`].
//!
//! Every call runs in its own transaction and returns `Ok(None)` for a
//! missing counter instead of an error. Increment and update read the row,
//! change it in memory and write it back; nothing serializes two callers
//! doing that on the same name at once beyond what SQLite itself does.

use shared::{
    domain::{validate_counter_name, Counter, CounterUpdate, NewCounter},
    error::{ApiError, ErrorCode},
};
use storage::{DuplicateCounterName, Storage};
use tracing::debug;

#[derive(Clone)]
pub struct CounterContext {
    pub storage: Storage,
}

impl CounterContext {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }
}

pub async fn fetch_counter(ctx: &CounterContext, name: &str) -> Result<Option<Counter>, ApiError> {
    validate_counter_name(name)?;
    let mut tx = ctx.storage.begin().await.map_err(internal)?;
    let counter = tx.find_row(name).await.map_err(internal)?;
    tx.commit().await.map_err(internal)?;
    Ok(counter)
}

pub async fn create_counter(ctx: &CounterContext, new_counter: NewCounter) -> Result<Counter, ApiError> {
    validate_counter_name(&new_counter.name)?;
    let mut tx = ctx.storage.begin().await.map_err(internal)?;
    let counter = tx.create_row(&new_counter).await.map_err(internal)?;
    tx.commit().await.map_err(internal)?;
    debug!(name = %counter.name, id = counter.id.0, count = counter.count, "counter created");
    Ok(counter)
}

/// Two transactions: a lookup, then a create when the lookup came back empty.
/// A concurrent creator in between surfaces as `ErrorCode::Conflict`.
pub async fn get_or_create_counter(ctx: &CounterContext, name: &str) -> Result<Counter, ApiError> {
    if let Some(counter) = fetch_counter(ctx, name).await? {
        return Ok(counter);
    }
    create_counter(ctx, NewCounter::new(name, 0)).await
}

pub async fn increment_counter(ctx: &CounterContext, name: &str) -> Result<Counter, ApiError> {
    validate_counter_name(name)?;
    let mut tx = ctx.storage.begin().await.map_err(internal)?;
    let counter = match tx.find_row(name).await.map_err(internal)? {
        // Created at 1 directly, not at 0 and then bumped.
        None => tx
            .create_row(&NewCounter::new(name, 1))
            .await
            .map_err(internal)?,
        Some(mut counter) => {
            counter.count = counter
                .count
                .checked_add(1)
                .ok_or_else(|| ApiError::new(ErrorCode::Validation, "counter overflow"))?;
            tx.save_row(&counter).await.map_err(internal)?
        }
    };
    tx.commit().await.map_err(internal)?;
    debug!(name = %counter.name, count = counter.count, "counter incremented");
    Ok(counter)
}

pub async fn update_counter(
    ctx: &CounterContext,
    name: &str,
    update: CounterUpdate,
) -> Result<Option<Counter>, ApiError> {
    validate_counter_name(name)?;
    let mut tx = ctx.storage.begin().await.map_err(internal)?;
    let Some(mut counter) = tx.find_row(name).await.map_err(internal)? else {
        tx.commit().await.map_err(internal)?;
        return Ok(None);
    };

    update.apply(&mut counter);
    let counter = tx.save_row(&counter).await.map_err(internal)?;
    tx.commit().await.map_err(internal)?;
    debug!(name = %counter.name, count = counter.count, "counter updated");
    Ok(Some(counter))
}

pub async fn reset_counter(ctx: &CounterContext, name: &str) -> Result<Option<Counter>, ApiError> {
    update_counter(ctx, name, CounterUpdate::set(0)).await
}

pub async fn get_counter_value(ctx: &CounterContext, name: &str) -> Result<i64, ApiError> {
    Ok(fetch_counter(ctx, name)
        .await?
        .map_or(0, |counter| counter.count))
}

fn internal(err: anyhow::Error) -> ApiError {
    if let Some(duplicate) = err.downcast_ref::<DuplicateCounterName>() {
        return ApiError::new(ErrorCode::Conflict, duplicate.to_string());
    }
    ApiError::new(ErrorCode::Internal, format!("{err:#}"))
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
