//! Scatter-gather: issue one request per key concurrently, wait for every
//! one of them to settle, and hand back a value for each key.

use std::future::Future;

use dp_core::AppError;
use futures::future::join_all;

/// Runs `fetch` for every key concurrently and joins on all of them.
///
/// A failed fetch is replaced by `fallback(&key, &error)`, so the output has
/// exactly one entry per input key, in input order.
pub async fn scatter_gather<K, V, F, Fut, D>(
    keys: impl IntoIterator<Item = K>,
    fetch: F,
    fallback: D,
) -> Vec<(K, V)>
where
    K: Clone,
    F: Fn(K) -> Fut,
    Fut: Future<Output = Result<V, AppError>>,
    D: Fn(&K, &AppError) -> V,
{
    let keys: Vec<K> = keys.into_iter().collect();
    let settled = join_all(keys.iter().cloned().map(&fetch)).await;

    keys.into_iter()
        .zip(settled)
        .map(|(key, result)| {
            let value = match result {
                Ok(value) => value,
                Err(err) => fallback(&key, &err),
            };
            (key, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn failures_degrade_per_key() {
        let out = scatter_gather(
            vec![1, 2, 3],
            |k| async move {
                if k == 2 {
                    Err(AppError::Transport("reset".into()))
                } else {
                    Ok(k * 10)
                }
            },
            |_, _| -1,
        )
        .await;
        assert_eq!(out, vec![(1, 10), (2, -1), (3, 30)]);
    }

    #[tokio::test]
    async fn empty_input_yields_empty_output() {
        let out: Vec<(u8, bool)> =
            scatter_gather(Vec::new(), |_| async { Ok(true) }, |_, _| false).await;
        assert!(out.is_empty());
    }
}
