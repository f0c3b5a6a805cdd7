// SkillForge services
// Stateless request helpers and local persistence: settings, tool calls, usage stats, token sealing.

pub mod settings_engine;
pub mod token_vault;
pub mod tools_service;
pub mod usage_service;
