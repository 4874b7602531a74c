//! Offline evaluation and self-learning loop.
//!
//! Evaluator → FeedbackRepository → learner → HeuristicRepository →
//! synthesizer → RuleTableStore. Each stage reads what the previous one
//! persisted; nothing here runs on the interactive extraction path.

pub mod types;
pub mod gold;
pub mod evaluator;
pub mod store;
pub mod learner;
pub mod synthesizer;
pub mod cycle;

pub use types::*;
pub use gold::*;
pub use evaluator::*;
pub use store::*;
pub use learner::*;
pub use synthesizer::*;
pub use cycle::*;

use thiserror::Error;

/// Failures reading or writing the persisted learning stores.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Store document is not a JSON object: {0}")]
    InvalidDocument(String),
}

/// Gold-file problems are configuration errors and always fatal.
#[derive(Error, Debug)]
pub enum GoldFileError {
    #[error("Gold test file not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Gold test file is malformed: {0}")]
    Malformed(String),

    #[error("Gold test file contains no cases")]
    Empty,

    #[error("Gold case #{index} is invalid: {reason}")]
    InvalidCase { index: usize, reason: String },
}
