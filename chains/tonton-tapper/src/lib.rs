//! # TonTon Tapper
//!
//! Multi-account tap-to-earn bot. Every line of the token list becomes one
//! account; each account validates its proxy, resolves a bearer credential
//! and then loops probe -> tap / wait, while a side task claims the daily
//! login bonus. Accounts run concurrently under
//! [`core_logic::WorkerRunner`] and never share a client.

pub mod api;
pub mod client;
pub mod config;
pub mod credential;
pub mod daily;
pub mod proxy_health;
pub mod scheduler;

pub use api::{EnergyStatus, TapApi};
pub use client::{AccountClient, ApiResponse, Transport};
pub use config::TapperConfig;
pub use credential::{BearerCredential, CredentialResolver};
pub use scheduler::{next_state, AccountScheduler, AccountSession, State, TapperWorker};
