use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::contract::Contract;
use crate::models::period::{Period, PeriodKind, PeriodStatus};
use crate::store;

/// The period tenure changes apply to: the active one, or the most
/// recent as a defensive fallback when none is flagged active.
pub fn current_period(periods: &[Period]) -> Option<&Period> {
    periods
        .iter()
        .find(|period| period.status == PeriodStatus::Active)
        .or_else(|| periods.last())
}

/// Decide the transition an extension triggers: the next period number
/// and which period to flip to `completed`
pub(crate) fn plan_extension(periods: &[Period]) -> (i32, Option<Uuid>) {
    let next_number = periods
        .iter()
        .map(|period| period.period_number)
        .max()
        .unwrap_or(0)
        + 1;
    let complete = current_period(periods).map(|period| period.id);
    (next_number, complete)
}

/// Open Period #1 for a freshly registered contract.
///
/// `available_value` starts at the contract's original value; there are
/// no amendments yet.
pub async fn bootstrap_period(pool: &PgPool, contract: &Contract) -> Result<Period, CoreError> {
    let period = build_period(
        contract.id,
        1,
        PeriodKind::Original,
        contract.original_start_date,
        contract.end_or_start(),
        contract.original_value,
        None,
    );
    store::periods::insert(pool, &period).await?;
    info!(
        contract_id = %contract.id,
        "opened original period for contract {}", contract.contract_number
    );
    Ok(period)
}

/// Transition triggered by an extension amendment: the current active
/// period completes and period N+1 opens with the contract's full
/// effective value at this moment, not just the delta.
pub async fn open_extension_period(
    pool: &PgPool,
    contract_id: Uuid,
    start_date: NaiveDate,
    end_date: NaiveDate,
    available_value: Decimal,
    justification: Option<String>,
) -> Result<Period, CoreError> {
    let periods = store::periods::list_by_contract(pool, contract_id).await?;
    let (next_number, complete) = plan_extension(&periods);

    let period = build_period(
        contract_id,
        next_number,
        PeriodKind::Extension,
        start_date,
        end_date,
        available_value,
        justification,
    );
    store::periods::open_period(pool, &period, complete).await?;
    info!(
        %contract_id,
        period_number = next_number,
        "opened extension period"
    );
    Ok(period)
}

/// Transition triggered by an early termination: the active period
/// shrinks in place. No period is ever created here; a past end date is
/// reflected lazily on the next read, not by a proactive status write.
pub async fn shorten_active_period(
    pool: &PgPool,
    contract_id: Uuid,
    new_end_date: NaiveDate,
) -> Result<(), CoreError> {
    let periods = store::periods::list_by_contract(pool, contract_id).await?;
    match current_period(&periods) {
        Some(period) => store::periods::update_end_date(pool, period.id, new_end_date).await,
        None => {
            // Legacy contracts imported without period bootstrapping.
            warn!(%contract_id, "early termination on a contract with no periods");
            Ok(())
        }
    }
}

fn build_period(
    contract_id: Uuid,
    period_number: i32,
    kind: PeriodKind,
    start_date: NaiveDate,
    end_date: NaiveDate,
    available_value: Decimal,
    justification: Option<String>,
) -> Period {
    let now = Utc::now();
    Period {
        id: Uuid::new_v4(),
        contract_id,
        period_number,
        kind,
        start_date,
        end_date,
        status: PeriodStatus::Active,
        available_value,
        // Scaffolding values; read paths always recompute from payments.
        paid_value: Decimal::ZERO,
        remaining_value: available_value,
        execution_percentage: 0.0,
        justification,
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period(number: i32, status: PeriodStatus) -> Period {
        let mut period = build_period(
            Uuid::new_v4(),
            number,
            if number == 1 {
                PeriodKind::Original
            } else {
                PeriodKind::Extension
            },
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            Decimal::from(100_000),
            None,
        );
        period.status = status;
        period
    }

    #[test]
    fn test_plan_on_empty_history_starts_at_one() {
        let (number, complete) = plan_extension(&[]);
        assert_eq!(number, 1);
        assert_eq!(complete, None);
    }

    #[test]
    fn test_plan_completes_the_active_period() {
        let periods = vec![
            period(1, PeriodStatus::Completed),
            period(2, PeriodStatus::Active),
        ];
        let (number, complete) = plan_extension(&periods);
        assert_eq!(number, 3);
        assert_eq!(complete, Some(periods[1].id));
    }

    #[test]
    fn test_plan_falls_back_to_latest_when_none_active() {
        let periods = vec![
            period(1, PeriodStatus::Completed),
            period(2, PeriodStatus::Completed),
        ];
        let (number, complete) = plan_extension(&periods);
        assert_eq!(number, 3);
        assert_eq!(complete, Some(periods[1].id));
    }

    #[test]
    fn test_current_period_prefers_active() {
        let periods = vec![
            period(1, PeriodStatus::Active),
            period(2, PeriodStatus::Completed),
        ];
        assert_eq!(current_period(&periods).map(|p| p.id), Some(periods[0].id));
    }
}
