//! PSE core types: errors, tolerances, configuration, progress and outcomes.

pub mod config;
pub mod error;
pub mod id;
pub mod outcome;
pub mod progress;
pub mod tolerance;

pub use config::EngineConfig;
pub use error::{ensure_positive, PseError, Result};
pub use id::EntityId;
pub use outcome::Outcome;
pub use progress::{CancelToken, NoProgress, Progress};
pub use tolerance::Tolerance;
