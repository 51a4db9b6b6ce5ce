//! # Utilities Module
//!
//! Shared plumbing used by every target crate: logging, retry policy,
//! account/proxy list loading and the worker runner.

pub(crate) mod logger;
pub(crate) mod proxy_manager;
pub(crate) mod retry;
pub(crate) mod runner;
pub(crate) mod token_manager;

pub use logger::setup_logger;
pub use proxy_manager::ProxyManager;
pub use runner::WorkerRunner;
pub use token_manager::TokenManager;
