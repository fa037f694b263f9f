use async_trait::async_trait;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use td_core::{Error, InferenceModel, Result, SharedModel};

/// Caps the number of calls forwarded to the wrapped model for this process.
pub struct QuotaLimitedModel {
    inner: SharedModel,
    limit: usize,
    used: AtomicUsize,
}

impl QuotaLimitedModel {
    pub fn new(inner: SharedModel, limit: usize) -> Self {
        Self {
            inner,
            limit,
            used: AtomicUsize::new(0),
        }
    }

    pub fn used(&self) -> usize {
        self.used.load(Ordering::SeqCst)
    }

    pub fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.used())
    }

    fn acquire(&self) -> Result<usize> {
        self.used
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| {
                (used < self.limit).then_some(used + 1)
            })
            .map(|previous| previous + 1)
            .map_err(|used| Error::QuotaExceeded {
                used,
                limit: self.limit,
            })
    }
}

impl fmt::Debug for QuotaLimitedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuotaLimitedModel")
            .field("inner", &self.inner)
            .field("limit", &self.limit)
            .field("used", &self.used())
            .finish()
    }
}

#[async_trait]
impl InferenceModel for QuotaLimitedModel {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let count = self.acquire()?;
        tracing::debug!(
            model = self.inner.name(),
            count,
            remaining = self.remaining(),
            "Model request"
        );
        self.inner.complete(prompt).await
    }
}
