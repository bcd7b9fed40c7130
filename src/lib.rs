//! Kudos - gamified profile engine
//!
//! Kudos tracks a user's progress through XP, levels and badges earned by
//! using applications. Apps report counters, levels and flags into a per-app
//! state store; declarative rule documents turn that state into a
//! progression profile, and every state save is diffed so newly reached
//! levels and badges can trigger a user-facing notification.
//!
//! The engine is synchronous and single-process. Presentation, remote sync
//! and the notification UI are external collaborators reached through the
//! traits in [`profile`].

pub mod config;
pub mod paths;
pub mod profile;

pub use profile::*;
