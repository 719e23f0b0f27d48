//! HTTP implementation of the sync target.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;

use crate::base::{
    config::Config,
    types::{InventoryRecord, Res, Void},
};

use super::{GenericSyncTarget, SyncClient};

// Extra methods on `SyncClient` applied by the HTTP implementation.

impl SyncClient {
    /// Creates a sync client from the configuration.
    ///
    /// Falls back to [`SyncClient::store_only`] when no endpoint is set.
    pub fn from_config(config: &Config) -> Res<Self> {
        match &config.sync_endpoint {
            Some(endpoint) => Ok(Self::new(Arc::new(HttpSyncTarget::new(endpoint, config)?))),
            None => Ok(Self::store_only()),
        }
    }
}

/// Sync target that PUTs records as JSON to `{endpoint}/{id}`.
struct HttpSyncTarget {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpSyncTarget {
    fn new(endpoint: &str, config: &Config) -> Res<Self> {
        let client = reqwest::Client::builder().timeout(config.http_timeout).build()?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl GenericSyncTarget for HttpSyncTarget {
    #[instrument(name = "HttpSyncTarget::push", skip_all, fields(record = %record.id))]
    async fn push(&self, record: &InventoryRecord) -> Void {
        let url = format!("{}/{}", self.endpoint, record.id);

        self.client.put(url).json(record).send().await?.error_for_status()?;

        Ok(())
    }
}
