//! # Google Cloud Storage (GCS) Client
//!
//! [`StorageConnector`](crate::contract::StorageConnector) implementation
//! for GCS, using the JSON API over `reqwest`.
//!
//! ## Submodules
//! - `auth`: service-account key parsing and token exchange.
//! - `client`: connector and bucket handle (listing, downloads).
//! - `types`: data structures exchanged with the GCS API.

pub mod auth;
pub mod client;
pub mod types;

pub use client::{encode_object_name, GcsBucket, GcsConnector, DEFAULT_ENDPOINT};
pub use types::ServiceAccount;
