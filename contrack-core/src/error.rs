use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

/// Error kinds surfaced by the reconstruction core.
///
/// Write operations fail as a unit: no partial mutation is left behind,
/// with the one documented exception of `PeriodTransitionFailed`, where
/// the amendment is already committed and only the period side effect
/// is outstanding.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Referenced contract/amendment/period does not exist. Non-retryable.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Malformed input at a boundary that enforces shape. Local to the
    /// operation, does not corrupt state.
    #[error("validation failed: {0}")]
    Validation(String),

    /// External store timed out or is unreachable. Retryable by the
    /// caller with backoff; the core performs no automatic retry.
    #[error("store unavailable during {operation}")]
    StoreUnavailable { operation: &'static str },

    /// Any other store failure
    #[error("store operation failed")]
    Store(#[from] sqlx::Error),

    /// The amendment was recorded, but the follow-up period transition
    /// failed. Surfaced combined so the caller can retry just the period
    /// step instead of re-submitting the amendment.
    #[error("amendment {amendment_id} recorded but period transition failed")]
    PeriodTransitionFailed {
        amendment_id: Uuid,
        #[source]
        source: Box<CoreError>,
    },
}

impl CoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        CoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        CoreError::Validation(message.into())
    }

    /// Classify a sqlx failure: connectivity problems become
    /// `StoreUnavailable`, everything else is a plain store error.
    pub(crate) fn store(operation: &'static str, err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                CoreError::StoreUnavailable { operation }
            }
            other => CoreError::Store(other),
        }
    }

    /// HTTP status the error maps to at the API boundary
    pub fn status_code(&self) -> StatusCode {
        match self {
            CoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            CoreError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CoreError::StoreUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            CoreError::Store(_) | CoreError::PeriodTransitionFailed { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let err = CoreError::not_found("contract", Uuid::new_v4());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_store_unavailable_maps_to_503() {
        let err = CoreError::StoreUnavailable { operation: "get_contract" };
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_period_transition_failure_keeps_amendment_id() {
        let amendment_id = Uuid::new_v4();
        let err = CoreError::PeriodTransitionFailed {
            amendment_id,
            source: Box::new(CoreError::StoreUnavailable { operation: "open_period" }),
        };
        assert!(err.to_string().contains(&amendment_id.to_string()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
