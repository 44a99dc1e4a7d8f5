//! Error types for ttree.

use std::path::PathBuf;

use crate::output::OutputError;
use crate::tokens::TokenError;
use crate::walker::WalkError;

/// Top-level error type for ttree operations.
#[derive(Debug, thiserror::Error)]
pub enum TtreeError {
    #[error("invalid option `{field}`: {message}")]
    Config { field: &'static str, message: String },

    #[error("cannot read root directory {path}: {source}")]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("tokenizer initialization failed: {0}")]
    TokenizerInit(#[from] TokenError),

    #[error("tree aggregation failed: {0}")]
    Aggregation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("walk error: {0}")]
    Walk(WalkError),

    #[error("output error: {0}")]
    Output(#[from] OutputError),
}

impl TtreeError {
    pub(crate) fn config(field: &'static str, message: impl Into<String>) -> Self {
        TtreeError::Config {
            field,
            message: message.into(),
        }
    }
}

impl From<WalkError> for TtreeError {
    fn from(error: WalkError) -> Self {
        match error {
            WalkError::RootUnreadable { path, source } => {
                TtreeError::RootUnreadable { path, source }
            }
            other => TtreeError::Walk(other),
        }
    }
}

/// Map an error to its exit code.
pub fn exit_code(error: &TtreeError) -> i32 {
    match error {
        TtreeError::Config { .. } => 2,
        TtreeError::RootUnreadable { .. } => 3,
        TtreeError::TokenizerInit(_) => 4,
        TtreeError::Aggregation(_) => 5,
        TtreeError::Io(_) => 1,
        TtreeError::Walk(_) => 1,
        TtreeError::Output(_) => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_names_field() {
        let err = TtreeError::config("threshold", "must be non-negative");
        assert_eq!(
            err.to_string(),
            "invalid option `threshold`: must be non-negative"
        );
        assert_eq!(exit_code(&err), 2);
    }

    #[test]
    fn test_root_walk_error_becomes_root_unreadable() {
        let err: TtreeError = WalkError::RootUnreadable {
            path: PathBuf::from("/missing"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        }
        .into();
        assert!(matches!(err, TtreeError::RootUnreadable { .. }));
        assert_eq!(exit_code(&err), 3);
    }
}
