//! Annotation backend REST API: wire types and a small async client.

pub mod client;
pub mod types;

pub use client::BackendClient;
