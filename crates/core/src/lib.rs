//! Core types and shared functionality for shellcache.
//!
//! This crate provides:
//! - Versioned cache storage with SQLite backend
//! - Request/response model shared by the transport and the worker
//! - Request classification policy
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod policy;
pub mod request;

pub use cache::{CacheDb, CacheStore};
pub use config::AppConfig;
pub use error::Error;
pub use policy::{Classification, ExclusionRule};
pub use request::{Destination, Request, Response, ResponseType};
