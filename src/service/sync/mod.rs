//! Inventory sync target integration.
//!
//! The reconciliation engine pushes each reconciled record to the sync target.
//! A push either succeeds or fails; failures are retried by the engine.

pub mod http;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::types::{InventoryRecord, Void};

// Traits.

/// Generic sync target trait that clients must implement.
#[async_trait]
pub trait GenericSyncTarget: Send + Sync + 'static {
    /// Pushes the record's current quantity downstream.
    ///
    /// `Ok(())` is the success signal; any error is a failed attempt.
    async fn push(&self, record: &InventoryRecord) -> Void;
}

// Structs.

/// Sync target client for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct SyncClient {
    inner: Arc<dyn GenericSyncTarget>,
}

impl Deref for SyncClient {
    type Target = dyn GenericSyncTarget;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl SyncClient {
    pub fn new(inner: Arc<dyn GenericSyncTarget>) -> Self {
        Self { inner }
    }

    /// A target that accepts every push without forwarding it.
    ///
    /// Used when no sync endpoint is configured and the record store is the
    /// only destination.
    pub fn store_only() -> Self {
        Self::new(Arc::new(StoreOnlySyncTarget))
    }
}

/// Sync target with no downstream.
struct StoreOnlySyncTarget;

#[async_trait]
impl GenericSyncTarget for StoreOnlySyncTarget {
    async fn push(&self, _record: &InventoryRecord) -> Void {
        Ok(())
    }
}
