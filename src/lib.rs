#![doc = "gpu-worker: serverless GPU worker handlers."]

//! Handlers for a serverless GPU worker: GPU diagnostics, directory listing
//! and synchronisation of an object-store bucket onto local disk.
//!
//! # Usage
//! Build a [`handlers::HandlerContext`] and pass jobs to
//! [`handlers::handle_job`], or call [`synchronise::sync`] directly with any
//! [`contract::StorageConnector`].

pub mod cli;
pub mod config;
pub mod contract;
pub mod credential;
pub mod error;
pub mod gcs;
pub mod handlers;
pub mod job;
pub mod load_config;
pub mod synchronise;
