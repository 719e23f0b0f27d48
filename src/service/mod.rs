//! Service integrations for storage, external APIs, and time.
//!
//! This module contains implementations for the services used by triage-sync:
//! - Record store (e.g., SurrealDB)
//! - Upstream support channel (e.g., HTTP)
//! - Inventory sync target (e.g., HTTP)
//! - Clock
//!
//! Each service module defines both generic traits and concrete implementations,
//! allowing for extensibility and easy testing.

pub mod clock;
pub mod store;
pub mod support;
pub mod sync;
