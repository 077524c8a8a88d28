//! Error types for the interaction engine
//!
//! None of these ever reach the visitor. Mount code logs them and the
//! effect degrades to doing nothing.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FxError {
    #[error("element could not be measured: {0}")]
    Unmeasurable(String),

    #[error("environment does not support {0}")]
    Unsupported(&'static str),

    #[error("physics world failed to initialize: {0}")]
    PhysicsInit(String),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("DOM operation failed: {0}")]
    Dom(String),
}

pub type Result<T> = std::result::Result<T, FxError>;
