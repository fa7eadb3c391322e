//! Single-flight coalescing of identical concurrent work.
//!
//! The first caller for a key starts the work; later callers for the same
//! key await the same shared future. The registry only keeps weak handles:
//! once every waiter has dropped its future the work is dropped with it,
//! and the next caller starts afresh.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared, WeakShared};
use parking_lot::Mutex;

type Registry<K, V> = Arc<Mutex<HashMap<K, WeakShared<BoxFuture<'static, V>>>>>;

pub struct SingleFlight<K, V> {
    in_flight: Registry<K, V>,
}

impl<K, V> SingleFlight<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Run `work` for `key`, or join the run already in flight.
    ///
    /// `work` is only called when no live run exists for the key.
    pub async fn run<F, Fut>(&self, key: K, work: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V> + Send + 'static,
    {
        let shared = self.join_or_start(key, work);
        shared.await
    }

    fn join_or_start<F, Fut>(&self, key: K, work: F) -> Shared<BoxFuture<'static, V>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V> + Send + 'static,
    {
        let mut map = self.in_flight.lock();
        if let Some(existing) = map.get(&key).and_then(WeakShared::upgrade) {
            tracing::trace!("Joining in-flight work");
            return existing;
        }

        // Drop entries whose waiters have all gone away
        map.retain(|_, weak| weak.upgrade().is_some());

        let registry = Arc::downgrade(&self.in_flight);
        let done_key = key.clone();
        let fut = work();
        let shared = async move {
            let value = fut.await;
            if let Some(registry) = registry.upgrade() {
                registry.lock().remove(&done_key);
            }
            value
        }
        .boxed()
        .shared();

        if let Some(weak) = shared.downgrade() {
            map.insert(key, weak);
        }
        shared
    }

    /// Number of keys with live work
    pub fn in_flight(&self) -> usize {
        self.in_flight
            .lock()
            .values()
            .filter(|weak| weak.upgrade().is_some())
            .count()
    }
}

impl<K, V> Default for SingleFlight<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_concurrent_calls_share_one_run() {
        let flight: SingleFlight<&str, u32> = SingleFlight::new();
        let runs = Arc::new(AtomicUsize::new(0));

        let start = |runs: Arc<AtomicUsize>| {
            move || async move {
                runs.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                7
            }
        };

        let (a, b, c) = tokio::join!(
            flight.run("cover", start(runs.clone())),
            flight.run("cover", start(runs.clone())),
            flight.run("cover", start(runs.clone())),
        );

        assert_eq!((a, b, c), (7, 7, 7));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(flight.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_different_keys_run_separately() {
        let flight: SingleFlight<u8, u8> = SingleFlight::new();
        let (a, b) = tokio::join!(
            flight.run(1, || async { 1 }),
            flight.run(2, || async { 2 }),
        );
        assert_eq!((a, b), (1, 2));
    }

    #[tokio::test]
    async fn test_finished_key_runs_again() {
        let flight: SingleFlight<u8, usize> = SingleFlight::new();
        let runs = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let runs = runs.clone();
            flight
                .run(1, move || async move { runs.fetch_add(1, Ordering::SeqCst) })
                .await;
        }
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_dropping_all_waiters_cancels() {
        let flight: SingleFlight<u8, u8> = SingleFlight::new();
        let (_tx, rx) = tokio::sync::oneshot::channel::<()>();

        // Poll once so the work registers, then drop it
        let pending = flight.run(1, move || async move {
            let _ = rx.await;
            1
        });
        assert!(pending.now_or_never().is_none());
        assert_eq!(flight.in_flight(), 0);

        // A new caller starts fresh rather than joining the dead run
        let value = flight.run(1, || async { 2 }).await;
        assert_eq!(value, 2);
    }
}
