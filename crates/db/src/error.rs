use wbs_core::error::CoreError;

/// Failure of a structural repository operation.
///
/// Engine rejections (missing node, illegal move) come back as [`CoreError`]
/// and roll the transaction back untouched; store failures surface as-is.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;
