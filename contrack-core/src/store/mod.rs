pub mod amendments;
pub mod contracts;
pub mod payments;
pub mod periods;

use std::future::Future;
use std::time::Duration;

use crate::error::CoreError;

/// Upper bound for a single store round trip. The core performs no
/// retry; a timeout surfaces as `StoreUnavailable` for the caller to
/// retry with backoff.
pub(crate) const STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Run one store operation under the bounded timeout.
///
/// Multi-statement operations pass their whole transaction as a single
/// future: either the full operation succeeds or it fails as a unit,
/// never with partial results.
pub(crate) async fn bounded<T, F>(operation: &'static str, fut: F) -> Result<T, CoreError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(STORE_TIMEOUT, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(CoreError::store(operation, err)),
        Err(_) => Err(CoreError::StoreUnavailable { operation }),
    }
}
