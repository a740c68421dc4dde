use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::error::{Error, Result};

/// Closed-loop limiter: a task is only spawned once a permit is free.
#[derive(Debug, Clone, Copy)]
pub struct ConcurrencyLimiter {
    limit: usize,
}

impl ConcurrencyLimiter {
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Runs `count` tasks built by `make_task`, at most `limit` at a time.
    /// Outputs are returned in submission order.
    pub async fn run<F, Fut, T>(&self, count: u64, mut make_task: F) -> Result<Vec<T>>
    where
        F: FnMut(u64) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.limit));
        let mut set = JoinSet::new();

        for index in 0..count {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| Error::Other(e.to_string()))?;
            let task = make_task(index);
            set.spawn(async move {
                let output = task.await;
                drop(permit);
                (index, output)
            });
        }

        let mut slots: Vec<Option<T>> = (0..count).map(|_| None).collect();
        while let Some(joined) = set.join_next().await {
            let (index, output) = joined?;
            slots[index as usize] = Some(output);
        }

        let outputs: Vec<T> = slots.into_iter().flatten().collect();
        if outputs.len() as u64 != count {
            return Err(Error::Other(format!(
                "limiter completed {} of {} tasks",
                outputs.len(),
                count
            )));
        }
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    async fn run_tracked(limit: usize, count: u64) -> (Vec<u64>, usize) {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let outputs = ConcurrencyLimiter::new(limit)
            .run(count, |index| {
                let in_flight = in_flight.clone();
                let peak = peak.clone();
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    // Later tasks finish first to scramble completion order
                    tokio::time::sleep(Duration::from_millis(1 + (count - index) % 5)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    index
                }
            })
            .await
            .unwrap();

        (outputs, peak.load(Ordering::SeqCst))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn never_exceeds_limit() {
        for (limit, count) in [(1, 10), (3, 40), (8, 64), (16, 16)] {
            let (outputs, peak) = run_tracked(limit, count).await;
            assert!(peak <= limit, "peak {} exceeded limit {}", peak, limit);
            assert_eq!(outputs.len() as u64, count);
        }
    }

    #[tokio::test]
    async fn returns_outputs_in_submission_order() {
        let (outputs, _) = run_tracked(4, 30).await;
        assert_eq!(outputs, (0..30).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn zero_tasks_yield_empty_output() {
        let outputs = ConcurrencyLimiter::new(4)
            .run(0, |index| async move { index })
            .await
            .unwrap();
        assert!(outputs.is_empty());
    }

    #[test]
    fn limit_is_at_least_one() {
        assert_eq!(ConcurrencyLimiter::new(0).limit(), 1);
    }
}
