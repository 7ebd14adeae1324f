//! Mentorlink Core - Shared data structures and infrastructure
//!
//! This module defines the session domain types, the unified error type, logging
//! setup and client configuration used by every other mentorlink crate

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use types::*;

// Re-export commonly used external types
pub use async_trait::async_trait;
pub use tokio;
pub use tracing;
