//! Cache inspection MCP tools.
//!
//! This module provides read-only views of the versioned stores.

pub mod keys;
pub mod list;

pub use keys::{CacheKeysParams, keys_impl};
pub use list::list_impl;
