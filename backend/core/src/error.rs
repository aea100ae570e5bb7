use thiserror::Error;

/// Errors raised by content stores.
#[derive(Debug, Error)]
pub enum FolioError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    Storage(String),
}

pub type FolioResult<T> = Result<T, FolioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_subject() {
        assert_eq!(
            FolioError::NotFound("post hello".into()).to_string(),
            "not found: post hello"
        );
        assert_eq!(
            FolioError::Conflict("slug taken".into()).to_string(),
            "conflict: slug taken"
        );
    }
}
