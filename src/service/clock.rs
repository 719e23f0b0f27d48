//! Injected time source.
//!
//! The engines never read the wall clock or sleep directly. Production code
//! uses [`SystemClock`]; tests supply their own [`GenericClock`] so retries and
//! latencies are deterministic without real delays.

use std::{ops::Deref, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Generic clock trait.
#[async_trait]
pub trait GenericClock: Send + Sync + 'static {
    /// The current time.
    fn now(&self) -> DateTime<Utc>;

    /// Suspends the caller for `duration`.
    ///
    /// Implementations must yield cooperatively rather than block the thread.
    async fn sleep(&self, duration: Duration);
}

/// Clock handle.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Clock {
    inner: Arc<dyn GenericClock>,
}

impl Deref for Clock {
    type Target = dyn GenericClock;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl Clock {
    pub fn new(inner: Arc<dyn GenericClock>) -> Self {
        Self { inner }
    }

    /// A clock backed by `chrono::Utc` and `tokio::time::sleep`.
    pub fn system() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

/// Wall clock.
pub struct SystemClock;

#[async_trait]
impl GenericClock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
