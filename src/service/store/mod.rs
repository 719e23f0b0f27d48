//! Record store for tickets and inventory rows.
//!
//! The store is the sole owner of both entity types. Engines borrow rows from
//! it, compute new values, and hand them back through `put_*`.

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::types::{InventoryRecord, Res, Ticket, Void};

pub mod locks;
pub mod surreal;

pub use locks::KeyedLocks;

// Traits.

/// Generic record store trait that backends must implement.
///
/// Every call is atomic on its own. Callers that read, modify, and write a row
/// must hold the row's [`KeyedLocks`] guard for the duration.
#[async_trait]
pub trait GenericRecordStore: Send + Sync + 'static {
    /// Gets a ticket by ID, or `None` if it does not exist.
    async fn get_ticket(&self, id: &str) -> Res<Option<Ticket>>;

    /// Inserts or replaces a ticket.
    async fn put_ticket(&self, ticket: &Ticket) -> Void;

    /// Lists every stored ticket.
    async fn list_tickets(&self) -> Res<Vec<Ticket>>;

    /// Gets an inventory record by ID, or `None` if it does not exist.
    async fn get_inventory(&self, id: &str) -> Res<Option<InventoryRecord>>;

    /// Inserts or replaces an inventory record.
    async fn put_inventory(&self, record: &InventoryRecord) -> Void;

    /// Lists every stored inventory record.
    async fn list_inventory(&self) -> Res<Vec<InventoryRecord>>;
}

/// Record store client.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
/// Clones share the same per-key locks.
#[derive(Clone)]
pub struct StoreClient {
    inner: Arc<dyn GenericRecordStore>,
    locks: KeyedLocks,
}

impl Deref for StoreClient {
    type Target = dyn GenericRecordStore;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl StoreClient {
    pub fn new(inner: Arc<dyn GenericRecordStore>) -> Self {
        Self {
            inner,
            locks: KeyedLocks::default(),
        }
    }

    /// The per-identifier locks that serialize read-modify-write cycles.
    pub fn locks(&self) -> &KeyedLocks {
        &self.locks
    }
}
