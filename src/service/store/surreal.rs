//! SurrealDB implementation of the record store.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use surrealdb::{
    Surreal,
    engine::any::{self, Any},
    opt::auth::Root,
};
use tracing::{debug, info, instrument};

use crate::base::{
    config::Config,
    types::{InventoryRecord, Res, Ticket, Void},
};

use super::{GenericRecordStore, StoreClient};

const TICKET_TABLE: &str = "ticket";
const INVENTORY_TABLE: &str = "inventory";

// Extra methods on `StoreClient` applied by the surreal implementation.

impl StoreClient {
    /// Connects to the SurrealDB endpoint named in the configuration.
    pub async fn surreal(config: &Config) -> Res<Self> {
        let store = SurrealRecordStore::new(config).await?;
        Ok(Self::new(Arc::new(store)))
    }

    /// Creates a fresh in-memory SurrealDB store.
    pub async fn surreal_memory() -> Res<Self> {
        Self::surreal(&Config::default()).await
    }
}

// Structs.

/// Storage envelope.
///
/// SurrealDB owns the `id` field of every record, so the entity is nested
/// under `data` to keep its own `id` intact.
#[derive(Debug, Serialize, Deserialize)]
struct Row<T> {
    data: T,
}

/// SurrealDB record store.
struct SurrealRecordStore {
    db: Surreal<Any>,
}

impl SurrealRecordStore {
    #[instrument(name = "SurrealRecordStore::new", skip_all, fields(endpoint = %config.db_endpoint))]
    async fn new(config: &Config) -> Res<Self> {
        let db = any::connect(config.db_endpoint.as_str()).await?;

        // Remote endpoints require authentication.
        if let (Some(username), Some(password)) = (&config.db_username, &config.db_password) {
            db.signin(Root {
                username: username.as_str(),
                password: password.as_str(),
            })
            .await?;
        }

        db.use_ns(config.db_namespace.as_str()).use_db(config.db_database.as_str()).await?;

        // Define schemas.

        db.query(format!("DEFINE TABLE IF NOT EXISTS {TICKET_TABLE} SCHEMALESS;")).await?.check()?;
        db.query(format!("DEFINE TABLE IF NOT EXISTS {INVENTORY_TABLE} SCHEMALESS;")).await?.check()?;

        info!("Record store initialized successfully.");

        Ok(Self { db })
    }

    async fn get<T>(&self, table: &str, id: &str) -> Res<Option<T>>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        let row: Option<Row<T>> = self.db.select((table, id.to_string())).await?;

        if row.is_none() {
            debug!("Record `{}:{}` not found.", table, id);
        }

        Ok(row.map(|r| r.data))
    }

    async fn put<T>(&self, table: &str, id: &str, entity: &T) -> Void
    where
        T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    {
        let _: Option<Row<T>> = self.db.upsert((table, id.to_string())).content(Row { data: entity.clone() }).await?;

        Ok(())
    }

    async fn list<T>(&self, table: &str) -> Res<Vec<T>>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        let rows: Vec<Row<T>> = self.db.select(table).await?;

        Ok(rows.into_iter().map(|r| r.data).collect())
    }
}

#[async_trait]
impl GenericRecordStore for SurrealRecordStore {
    #[instrument(skip(self))]
    async fn get_ticket(&self, id: &str) -> Res<Option<Ticket>> {
        self.get(TICKET_TABLE, id).await
    }

    #[instrument(skip_all, fields(id = %ticket.id))]
    async fn put_ticket(&self, ticket: &Ticket) -> Void {
        self.put(TICKET_TABLE, &ticket.id, ticket).await
    }

    async fn list_tickets(&self) -> Res<Vec<Ticket>> {
        self.list(TICKET_TABLE).await
    }

    #[instrument(skip(self))]
    async fn get_inventory(&self, id: &str) -> Res<Option<InventoryRecord>> {
        self.get(INVENTORY_TABLE, id).await
    }

    #[instrument(skip_all, fields(id = %record.id))]
    async fn put_inventory(&self, record: &InventoryRecord) -> Void {
        self.put(INVENTORY_TABLE, &record.id, record).await
    }

    async fn list_inventory(&self) -> Res<Vec<InventoryRecord>> {
        self.list(INVENTORY_TABLE).await
    }
}

// Tests.
