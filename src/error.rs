//! Engine error type
//!
//! Game outcomes (misses, blocked picks, overflow) are not errors; they are
//! ordinary result enums. This type covers contract violations and
//! configuration problems only.

use thiserror::Error;

use crate::sim::BodyHandle;

#[derive(Debug, Error)]
pub enum EngineError {
    /// A body handle was used after removal or before registration
    #[error("unknown body handle {0:?}")]
    UnknownHandle(BodyHandle),
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
    #[error("settings json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
