//! HTTP implementation of the support channel.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::base::{
    config::Config,
    types::{Res, SupportReply, Ticket},
};

use super::{GenericSupportChannel, SupportClient};

// Extra methods on `SupportClient` applied by the HTTP implementation.

impl SupportClient {
    /// Creates a support client from the configuration.
    ///
    /// Falls back to [`SupportClient::disconnected`] when no endpoint is set.
    pub fn from_config(config: &Config) -> Res<Self> {
        match &config.support_endpoint {
            Some(endpoint) => Ok(Self::new(Arc::new(HttpSupportChannel::new(endpoint, config)?))),
            None => Ok(Self::disconnected()),
        }
    }
}

/// Body returned by the support endpoint.
#[derive(Debug, Deserialize)]
struct SupportReplyBody {
    message: String,
}

/// Support channel that POSTs tickets as JSON.
struct HttpSupportChannel {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpSupportChannel {
    fn new(endpoint: &str, config: &Config) -> Res<Self> {
        let client = reqwest::Client::builder().timeout(config.http_timeout).build()?;

        Ok(Self {
            endpoint: endpoint.to_string(),
            client,
        })
    }
}

#[async_trait]
impl GenericSupportChannel for HttpSupportChannel {
    #[instrument(name = "HttpSupportChannel::submit", skip_all, fields(ticket = %ticket.id))]
    async fn submit(&self, ticket: &Ticket) -> Res<SupportReply> {
        let response = self.client.post(&self.endpoint).json(ticket).send().await?.error_for_status()?;
        let body: SupportReplyBody = response.json().await?;

        debug!("Support channel replied to `{}`.", ticket.id);

        Ok(SupportReply {
            ticket_id: ticket.id.clone(),
            message: body.message,
        })
    }
}
