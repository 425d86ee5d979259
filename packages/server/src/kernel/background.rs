//! Tracked background work that outlives the request that started it.

use std::future::Future;

use tokio_util::task::TaskTracker;

/// Handle for fire-and-forget tasks (SMS delivery) that shutdown can drain.
#[derive(Clone, Default)]
pub struct BackgroundTasks {
    tracker: TaskTracker,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tracker.spawn(task);
    }

    /// Number of tasks still running.
    pub fn len(&self) -> usize {
        self.tracker.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracker.is_empty()
    }

    /// Close the tracker and wait for in-flight tasks to finish.
    pub async fn shutdown(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_shutdown_waits_for_spawned_tasks() {
        let tasks = BackgroundTasks::new();
        let done = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let done = done.clone();
            tasks.spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                done.fetch_add(1, Ordering::SeqCst);
            });
        }

        tasks.shutdown().await;

        assert_eq!(done.load(Ordering::SeqCst), 3);
        assert!(tasks.is_empty());
    }
}
