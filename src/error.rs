use thiserror::Error;

/// Fatal-class failures. Anything else in a run is either coerced to a
/// default or recorded as a report issue.
#[derive(Debug, Error)]
pub enum ShelfError {
    #[error("paper source unavailable: {0}")]
    SourceUnavailable(String),
    #[error("record store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("record store locked by another writer: {0}")]
    StoreLocked(String),
    #[error("config file invalid or unreadable: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShelfErrorCode {
    E001SourceUnavailable,
    E002StoreUnavailable,
    E003StoreLocked,
    E004ConfigInvalid,
}

impl ShelfErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::E001SourceUnavailable => "E001_SOURCE_UNAVAILABLE",
            Self::E002StoreUnavailable => "E002_STORE_UNAVAILABLE",
            Self::E003StoreLocked => "E003_STORE_LOCKED",
            Self::E004ConfigInvalid => "E004_CONFIG_INVALID",
        }
    }
}

impl ShelfError {
    pub fn code(&self) -> ShelfErrorCode {
        match self {
            Self::SourceUnavailable(_) => ShelfErrorCode::E001SourceUnavailable,
            Self::StoreUnavailable(_) => ShelfErrorCode::E002StoreUnavailable,
            Self::StoreLocked(_) => ShelfErrorCode::E003StoreLocked,
            Self::InvalidConfig(_) => ShelfErrorCode::E004ConfigInvalid,
        }
    }
}

/// Find the typed fatal error anywhere in an `anyhow` chain.
pub fn fatal_code(err: &anyhow::Error) -> Option<ShelfErrorCode> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<ShelfError>())
        .map(ShelfError::code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn fatal_code_survives_added_context() {
        let err = Err::<(), _>(ShelfError::StoreUnavailable("papers.jsonl".to_string()))
            .context("rank request failed")
            .expect_err("error");
        assert_eq!(
            fatal_code(&err).map(ShelfErrorCode::as_str),
            Some("E002_STORE_UNAVAILABLE")
        );
    }

    #[test]
    fn plain_errors_have_no_code() {
        let err = anyhow::anyhow!("something else");
        assert!(fatal_code(&err).is_none());
    }
}
