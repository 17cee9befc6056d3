//! Temporal connection manager.
//!
//! This crate owns everything between the tool layer and a Temporal cluster:
//!
//! - resolving connection settings from flags, environment and defaults
//!   ([`config`]), including the TLS / mTLS / API key rules;
//! - the [`TemporalClient`] trait the tool handlers are written against;
//! - [`TemporalHttpClient`], an implementation over the frontend HTTP API;
//! - `InMemoryTemporal` (feature `testing`), a deterministic fake.
//!
//! # Example
//!
//! ```ignore
//! use temporal_mcp_api::{ConnectionConfig, ConnectionOverrides, connect};
//!
//! let config = ConnectionConfig::resolve(ConnectionOverrides::default())?;
//! let client = connect(&config)?;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
#[cfg(feature = "testing")]
pub mod testing;
mod wire;

pub use client::{SharedTemporalClient, TemporalClient};
pub use config::{ConfigError, ConnectionConfig, ConnectionOverrides, ServerSettings, SettingsOverrides, TlsDecision};
pub use error::TemporalError;
pub use http::{TemporalHttpClient, connect};
#[cfg(feature = "testing")]
pub use testing::InMemoryTemporal;
