//! JSON RPC client for the remote list service
//!
//! Implements the core `ListRpcClient` port over HTTP. Every call is a POST to
//! `{api_url}?method=<name>&output=json` with the named parameters as a JSON
//! object; faults come back as `{ "error": ..., "code": ... }`.

pub mod client;
pub mod errors;
mod wire;

pub use client::JsonRpcListClient;
pub use errors::transport_error;
