//! Core components, types, and utilities for triage-sync.
//!
//! This module contains fundamental building blocks used throughout the application:
//! - Configuration handling and environment variables.
//! - Domain entities and common result types.
//! - The engines' error taxonomy.

pub mod config;
pub mod error;
pub mod types;
