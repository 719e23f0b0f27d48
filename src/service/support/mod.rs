//! Upstream support channel integration.
//!
//! The triage engine hands tickets to the support channel and treats any
//! failure it reports as "channel unavailable".

pub mod http;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::types::{Res, SupportReply, Ticket};

// Traits.

/// Generic support channel trait that clients must implement.
#[async_trait]
pub trait GenericSupportChannel: Send + Sync + 'static {
    /// Submits a ticket and returns the channel's reply.
    ///
    /// Any error means the channel is unavailable; callers do not distinguish
    /// between error kinds.
    async fn submit(&self, ticket: &Ticket) -> Res<SupportReply>;
}

// Structs.

/// Support channel client for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct SupportClient {
    inner: Arc<dyn GenericSupportChannel>,
}

impl Deref for SupportClient {
    type Target = dyn GenericSupportChannel;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl SupportClient {
    pub fn new(inner: Arc<dyn GenericSupportChannel>) -> Self {
        Self { inner }
    }

    /// A channel that is always unavailable.
    ///
    /// Used when no support endpoint is configured, so every ticket receives
    /// the fallback response.
    pub fn disconnected() -> Self {
        Self::new(Arc::new(DisconnectedSupportChannel))
    }
}

/// Support channel with no upstream.
struct DisconnectedSupportChannel;

#[async_trait]
impl GenericSupportChannel for DisconnectedSupportChannel {
    async fn submit(&self, ticket: &Ticket) -> Res<SupportReply> {
        Err(anyhow::anyhow!("No support endpoint configured; ticket `{}` not submitted.", ticket.id))
    }
}
