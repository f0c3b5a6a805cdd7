//! SkillForge client core: session handling, the paginated tool-usage
//! history with confirmed deletes, and the AI tool requests.
//!
//! This library crate exposes all modules for use by the RPC binary and integration tests.

pub mod api;
pub mod app;
pub mod logging;
pub mod managers;
pub mod platform;
pub mod rpc_handler;
pub mod services;
pub mod types;
