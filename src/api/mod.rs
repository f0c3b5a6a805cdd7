//! SkillForge API access.
//!
//! `client` owns the HTTP plumbing; `history_api` defines the remote history
//! seam used by the history store.

pub mod client;
pub mod history_api;

pub use client::ApiClient;
pub use history_api::HistoryApi;
