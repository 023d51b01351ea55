use thiserror::Error;

use crate::codec::CodecError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("malformed stored json: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("unknown item '{0}'")]
    UnknownItem(String),

    #[error("invalid answer for item '{item_id}': {reason}")]
    InvalidAnswer { item_id: String, reason: String },

    #[error("stored column '{column}' holds unrecognised value '{value}'")]
    BadColumn { column: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("session '{0}' has no answers to score")]
    NoAnswers(String),
}
