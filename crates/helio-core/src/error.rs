//! Error types for the Helio chain core.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainIndexError {
    #[error("duplicate block: {0}")] DuplicateBlock(String),
    #[error("unknown parent {parent} for block {block}")] UnknownParent { block: String, parent: String },
    #[error("checkpoint mismatch at height {height}")] CheckpointMismatch { height: u64 },
}

#[derive(Error, Debug)]
pub enum HelioError {
    #[error(transparent)] ChainIndex(#[from] ChainIndexError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_variants_display() {
        let errors: Vec<ChainIndexError> = vec![
            ChainIndexError::DuplicateBlock("abc".into()),
            ChainIndexError::UnknownParent { block: "abc".into(), parent: "def".into() },
            ChainIndexError::CheckpointMismatch { height: 7 },
        ];
        for e in &errors {
            assert!(!format!("{e}").is_empty());
        }
    }

    #[test]
    fn helio_error_from_chain_index() {
        let err: HelioError = ChainIndexError::DuplicateBlock("x".into()).into();
        assert!(matches!(err, HelioError::ChainIndex(_)));
    }
}
