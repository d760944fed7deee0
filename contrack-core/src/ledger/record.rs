use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::amendment::{
    Amendment, AmendmentCategory, TenureAmendmentForm, TenureKind, ValueAmendmentForm,
};
use crate::models::contract::Contract;
use crate::periods;
use crate::store;

/// Record a tenure amendment (extension or early termination).
///
/// `previous_start/end` are snapshotted from the contract's current
/// period at call time, not from the original contract dates. The
/// ledger imposes no ordering on the new dates: the system records what
/// happened, blocking nonsensical transitions is the submitting layer's
/// job.
///
/// An extension triggers the period transition as a second step. If
/// that step fails the amendment stays recorded and the failure
/// surfaces as `PeriodTransitionFailed`, so the caller can retry just
/// the period step.
pub async fn record_tenure_amendment(
    pool: &PgPool,
    contract_id: Uuid,
    form: TenureAmendmentForm,
    user_id: Uuid,
) -> Result<Amendment, CoreError> {
    validate_justification(&form.justification)?;
    let contract = store::contracts::get(pool, contract_id).await?;

    let existing = store::periods::list_by_contract(pool, contract_id).await?;
    let (previous_start, previous_end) = match periods::current_period(&existing) {
        Some(period) => (period.start_date, period.end_date),
        None => (contract.original_start_date, contract.end_or_start()),
    };

    let now = Utc::now();
    let amendment = Amendment {
        id: Uuid::new_v4(),
        contract_id,
        category: AmendmentCategory::Tenure,
        kind: form.kind.into(),
        amendment_date: now,
        is_active: true,
        previous_start_date: Some(previous_start),
        previous_end_date: Some(previous_end),
        new_start_date: Some(form.new_start_date),
        new_end_date: Some(form.new_end_date),
        previous_value: None,
        amendment_value: None,
        percentage_applied: None,
        index_used: None,
        reference_period: None,
        description: None,
        justification: form.justification,
        legal_basis: form.legal_basis,
        created_by: user_id,
        created_at: now,
        updated_at: now,
    };
    store::amendments::insert(pool, &amendment).await?;
    info!(%contract_id, amendment_id = %amendment.id, kind = %amendment.kind, "tenure amendment recorded");

    let transition = match form.kind {
        TenureKind::Extension => {
            // The new period inherits the full effective value as of the
            // extension, not just the delta.
            extension_transition(pool, &contract, form.new_start_date, form.new_end_date).await
        }
        TenureKind::EarlyTermination => {
            periods::shorten_active_period(pool, contract_id, form.new_end_date).await
        }
    };
    if let Err(source) = transition {
        return Err(CoreError::PeriodTransitionFailed {
            amendment_id: amendment.id,
            source: Box::new(source),
        });
    }

    Ok(amendment)
}

async fn extension_transition(
    pool: &PgPool,
    contract: &Contract,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<(), CoreError> {
    let delta = store::amendments::active_value_delta(pool, contract.id).await?;
    periods::open_extension_period(
        pool,
        contract.id,
        start_date,
        end_date,
        contract.original_value + delta,
        None,
    )
    .await?;
    Ok(())
}

/// Record a value amendment.
///
/// `previous_value` snapshots the effective value at call time
/// (original value plus the active delta). It is informational only:
/// concurrent submissions can leave it stale without affecting any
/// aggregate, since the delta sum never reads it. The signed
/// `amendment_value` is stored exactly as given.
pub async fn record_value_amendment(
    pool: &PgPool,
    contract_id: Uuid,
    form: ValueAmendmentForm,
    user_id: Uuid,
) -> Result<Amendment, CoreError> {
    validate_justification(&form.justification)?;
    let contract = store::contracts::get(pool, contract_id).await?;
    let delta = store::amendments::active_value_delta(pool, contract_id).await?;

    let now = Utc::now();
    let amendment = Amendment {
        id: Uuid::new_v4(),
        contract_id,
        category: AmendmentCategory::Value,
        kind: form.kind.into(),
        amendment_date: now,
        is_active: true,
        previous_start_date: None,
        previous_end_date: None,
        new_start_date: None,
        new_end_date: None,
        previous_value: Some(contract.original_value + delta),
        amendment_value: Some(form.amendment_value),
        percentage_applied: form.percentage_applied,
        index_used: form.index_used,
        reference_period: form.reference_period,
        description: form.description,
        justification: form.justification,
        legal_basis: form.legal_basis,
        created_by: user_id,
        created_at: now,
        updated_at: now,
    };
    store::amendments::insert(pool, &amendment).await?;
    info!(%contract_id, amendment_id = %amendment.id, kind = %amendment.kind, "value amendment recorded");

    Ok(amendment)
}

/// Deactivate an amendment: the only supported "delete". Idempotent;
/// there is no reactivation operation, so exclusion from the aggregates
/// is permanent.
pub async fn deactivate_amendment(pool: &PgPool, amendment_id: Uuid) -> Result<(), CoreError> {
    let touched = store::amendments::deactivate(pool, amendment_id).await?;
    if touched == 0 {
        return Err(CoreError::not_found("amendment", amendment_id));
    }
    info!(%amendment_id, "amendment deactivated");
    Ok(())
}

fn validate_justification(justification: &str) -> Result<(), CoreError> {
    if justification.trim().is_empty() {
        return Err(CoreError::validation("justification must not be empty"));
    }
    Ok(())
}
