// SkillForge state managers
// Managers own mutable client state: the session, the history collection, the confirmation gate, the scroll trigger.

pub mod confirmation_gate;
pub mod history_store;
pub mod scroll_trigger;
pub mod session_manager;
