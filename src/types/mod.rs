// SkillForge shared type definitions
// Each submodule defines types used across the client.

pub mod confirmation;
pub mod errors;
pub mod history;
pub mod session;
pub mod settings;
pub mod tools;
