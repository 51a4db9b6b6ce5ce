//! # Core Logic - Shared Utilities for Account Automation
//!
//! This crate provides the target-agnostic pieces used by the bots under
//! `chains/`: typed errors, the logger, a reusable retry policy, token and
//! proxy list loading, and the concurrent worker runner.
//!
//! ## Modules
//!
//! - [`config`] - Proxy binding shared by all targets
//! - [`error`] - Typed error handling with thiserror
//! - [`traits`] - The [`Worker`](traits::Worker) trait driven by the runner
//! - `utils` - Logger, retry, proxy/token loaders, runner

pub mod config;
pub mod error;
pub mod traits;
pub(crate) mod utils;

pub use config::ProxyConfig;
pub use error::{ConfigError, CoreError, CredentialError, NetworkError};
pub use traits::{Worker, WorkerStats};

pub use utils::{setup_logger, ProxyManager, TokenManager, WorkerRunner};

pub use utils::retry::{with_retry, with_retry_if, RetryConfig};
