use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;

use pdfqa_core::error::{Error, Result};

/// Runs jobs on the tokio runtime with at most `size` in flight; callers
/// beyond that wait for a permit.
#[derive(Debug, Clone)]
pub struct JobPool {
    semaphore: Arc<Semaphore>,
}

impl JobPool {
    pub fn new(size: usize) -> Self {
        Self { semaphore: Arc::new(Semaphore::new(size.max(1))) }
    }

    pub fn available(&self) -> usize { self.semaphore.available_permits() }

    pub async fn run<F, T>(&self, job: F) -> Result<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let permit = self.semaphore.clone().acquire_owned().await.map_err(|_| Error::Operation("job pool closed".into()))?;
        let handle = tokio::spawn(async move {
            let _permit = permit;
            job.await
        });
        handle.await.map_err(|e| Error::Operation(format!("job failed: {e}")))
    }
}
