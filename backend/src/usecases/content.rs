use axum::http::StatusCode;
use crates::domain::{
    repositories::commerces::CommerceRepository, value_objects::content::ValidationErrors,
};
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error(transparent)]
    Validation(ValidationErrors),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("content limit of {limit} reached, upgrade to create more")]
    ContentLimitReached { limit: i64 },
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ContentError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ContentError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ContentError::NotFound(_) => StatusCode::NOT_FOUND,
            ContentError::ContentLimitReached { .. } => StatusCode::FORBIDDEN,
            ContentError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationErrors> for ContentError {
    fn from(errors: ValidationErrors) -> Self {
        ContentError::Validation(errors)
    }
}

pub type UseCaseResult<T> = std::result::Result<T, ContentError>;

/// Fails with a validation error unless every id names one of the user's commerces.
pub(crate) async fn ensure_commerces_owned<C>(
    commerce_repo: &C,
    user_id: Uuid,
    commerce_ids: Vec<Uuid>,
) -> UseCaseResult<()>
where
    C: CommerceRepository + Send + Sync,
{
    let expected = commerce_ids.len() as i64;
    let owned = commerce_repo
        .count_owned(user_id, commerce_ids)
        .await
        .map_err(|err| {
            error!(%user_id, db_error = ?err, "content: failed to check commerce ownership");
            ContentError::Internal(err)
        })?;

    if owned != expected {
        let mut errors = ValidationErrors::new();
        errors.push("commerce_id must reference one of your commerces");
        return Err(errors.into());
    }

    Ok(())
}
