//! Client code for shellcache.
//!
//! This crate provides the network transport and the cache worker that
//! drives the install/activate/fetch lifecycle on top of the core storage.

pub mod fetch;
pub mod worker;

pub use fetch::{FetchClient, FetchConfig, Transport};
pub use worker::{ActivationReport, CacheWorker, FetchOutcome, Host, InstallReport, ResponseSource};
