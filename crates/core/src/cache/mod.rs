//! SQLite-backed versioned cache storage.
//!
//! This module provides persistent, named cache stores using SQLite with
//! async access via tokio-rusqlite. It supports:
//!
//! - Named stores, one per deployed cache version
//! - Request-identity keyed entries (SHA-256 of method and URL)
//! - Whole-store deletion, cascading to its entries
//! - Automatic schema migrations
//! - WAL mode for concurrent access

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod stores;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::CacheStore;
