use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::amendment::{Amendment, AmendmentsHistory, AmendmentsSummary};
use crate::models::contract::Contract;
use crate::store;

/// Current effective value delta for a contract: the sum of every
/// active value amendment's signed delta.
///
/// Order-independent by construction: each amendment stores an absolute
/// signed delta, not a formula over prior deltas, so no chronological
/// replay happens here. Readjustment percentages are computed by the
/// caller before submission.
pub async fn active_value_delta(pool: &PgPool, contract_id: Uuid) -> Result<Decimal, CoreError> {
    store::amendments::active_value_delta(pool, contract_id).await
}

/// Full amendment history for a contract, newest first, with its
/// summary. Inactive amendments are included: the ledger never hides
/// audit history, it only excludes it from aggregates.
pub async fn amendments_history(
    pool: &PgPool,
    contract_id: Uuid,
) -> Result<AmendmentsHistory, CoreError> {
    let contract = store::contracts::get(pool, contract_id).await?;
    let amendments = store::amendments::list_by_contract(pool, contract_id).await?;
    let summary = summarize(&contract, &amendments);
    Ok(AmendmentsHistory { amendments, summary })
}

/// Aggregate a loaded amendment history. Only active value amendments
/// contribute to the delta; counts cover active and inactive alike.
pub fn summarize(contract: &Contract, amendments: &[Amendment]) -> AmendmentsSummary {
    let total_amendments_value: Decimal = amendments
        .iter()
        .filter(|amendment| amendment.is_value() && amendment.is_active)
        .filter_map(|amendment| amendment.amendment_value)
        .sum();

    AmendmentsSummary {
        total_amendments_value,
        total_value_amendments: amendments.iter().filter(|a| a.is_value()).count(),
        total_tenure_amendments: amendments.iter().filter(|a| a.is_tenure()).count(),
        current_value: contract.original_value + total_amendments_value,
    }
}
