use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::error::CoreError;
use crate::ledger;
use crate::models::amendment::AmendmentsHistory;
use crate::models::contract::{Contract, ContractWithCurrentInfo};
use crate::models::period::PeriodSummary;
use crate::periods;

/// Build the current-state read model for one contract.
///
/// The projection is assembled from three sources on every call and
/// never stored: the base contract row, the amendment ledger summary,
/// and the period tracker. Period lookup failures degrade rather than
/// fail the whole read: the vigência falls back to the contract's
/// original dates, with the effective value still reflecting the
/// ledger.
pub async fn contract_with_current_info(
    pool: &PgPool,
    contract_id: Uuid,
) -> Result<ContractWithCurrentInfo, CoreError> {
    let history = ledger::amendments_history(pool, contract_id).await?;
    let contract = crate::store::contracts::get(pool, contract_id).await?;

    let current_period = match periods::periods_summary(pool, contract_id).await {
        Ok(summaries) => periods::active_period(&summaries).cloned(),
        Err(err) => {
            warn!(%contract_id, error = %err, "period lookup failed, falling back to contract dates");
            None
        }
    };

    Ok(assemble(contract, &history, current_period.as_ref()))
}

/// The current-state read model for every registered contract, in
/// registration order (newest first).
pub async fn contracts_overview(pool: &PgPool) -> Result<Vec<ContractWithCurrentInfo>, CoreError> {
    let contracts = crate::store::contracts::list(pool).await?;
    let mut overview = Vec::with_capacity(contracts.len());
    for contract in contracts {
        overview.push(contract_with_current_info(pool, contract.id).await?);
    }
    Ok(overview)
}

/// Combine the loaded pieces into the read model. The current vigência
/// comes from the active period when one exists, else the contract's
/// original dates.
pub fn assemble(
    contract: Contract,
    history: &AmendmentsHistory,
    current_period: Option<&PeriodSummary>,
) -> ContractWithCurrentInfo {
    let (current_start_date, current_end_date): (NaiveDate, NaiveDate) = match current_period {
        Some(period) => (period.start_date, period.end_date),
        None => (contract.original_start_date, contract.end_or_start()),
    };

    ContractWithCurrentInfo {
        id: contract.id,
        contract_number: contract.contract_number,
        company_name: contract.company_name,
        cnpj: contract.cnpj,
        process_number: contract.process_number,
        object: contract.object,
        total_value: contract.original_value,
        total_amendments_value: history.summary.total_amendments_value,
        effective_value: contract.original_value + history.summary.total_amendments_value,
        current_start_date,
        current_end_date,
        total_amendments: history.amendments.len(),
    }
}
