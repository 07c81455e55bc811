//! Infrastructure layer for nerdfeed.
//!
//! Provides backend configuration, the HTTP adapters for the hosted
//! backend-as-a-service and an in-memory backend implementing the same ports.

pub mod config;
pub mod memory;
pub mod supabase;

pub use crate::config::BackendConfig;
pub use crate::memory::{InMemoryBackend, MemoryOperation};
