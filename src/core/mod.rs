//! Core components of the `restwell` client.
//!
//! This module contains the foundational building blocks of the library, including:
//! - The main [`RestClient`] and its builder.
//! - The primary [`RestError`] type.
//! - The [`Response`] model shared by the executor and the cache.
//! - The [`RestContext`] carrying state shared between clients.

/// The main client (`RestClient`), builder, retry strategies and request encoding.
pub mod client;
/// Shared limiter, cache and telemetry (`RestContext`).
pub mod context;
/// The primary error type (`RestError`) for the crate.
pub mod error;
/// The response model returned by every execution.
pub mod models;

// convenient re-exports so most code can just `use crate::core::RestClient`
pub use client::{RestClient, RestClientBuilder};
pub use context::RestContext;
pub use error::RestError;
pub use models::Response;
