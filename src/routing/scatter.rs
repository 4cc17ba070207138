//! Concurrent fan-out over every physical slot.
//!
//! One tokio task is spawned per slot index and the caller waits for all of
//! them. Successful slots keep their side effects even when siblings fail;
//! failures come back as one error (see [`DbError::combine`]).

use crate::core::{DbError, Result};
use futures::future::join_all;
use std::future::Future;
use tracing::warn;

/// Run `op(i)` for every `i` in `0..n` concurrently and return the values in slot order.
pub async fn scatter<F, Fut, T>(n: usize, op: F) -> Result<Vec<T>>
where
    F: Fn(usize) -> Fut,
    Fut: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    collect(scatter_all(n, op).await)
}

/// Like [`scatter`] but hands back every per-slot outcome untouched.
pub async fn scatter_all<F, Fut, T>(n: usize, op: F) -> Vec<Result<T>>
where
    F: Fn(usize) -> Fut,
    Fut: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    if n == 0 {
        return Vec::new();
    }

    let handles: Vec<_> = (0..n).map(|i| tokio::spawn(op(i))).collect();

    let results: Vec<Result<T>> = join_all(handles)
        .await
        .into_iter()
        .enumerate()
        .map(|(slot, joined)| match joined {
            Ok(res) => res,
            Err(err) => Err(DbError::TaskFailed {
                slot,
                reason: err.to_string(),
            }),
        })
        .collect();

    let failed = results.iter().filter(|r| r.is_err()).count();
    if failed > 0 {
        warn!(failed, total = n, "scatter finished with failed slots");
    }

    results
}

/// Separate successes from failures, folding the failures into one error.
pub fn split<T>(results: Vec<Result<T>>) -> (Vec<T>, Option<DbError>) {
    let mut values = Vec::with_capacity(results.len());
    let mut errors = Vec::new();

    for res in results {
        match res {
            Ok(value) => values.push(value),
            Err(err) => errors.push(err),
        }
    }

    (values, DbError::combine(errors))
}

/// All values when every slot succeeded, otherwise the combined error.
pub fn collect<T>(results: Vec<Result<T>>) -> Result<Vec<T>> {
    match split(results) {
        (_, Some(err)) => Err(err),
        (values, None) => Ok(values),
    }
}
