//! CLI command implementations

pub mod init;
pub mod show;
pub mod state;
