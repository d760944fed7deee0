use chrono::{NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::period::{CurrentPeriodExecution, Period, PeriodStatistics, PeriodStatus, PeriodSummary};
use crate::payments::aggregate;
use crate::store;

/// All periods of a contract with freshly computed execution figures.
///
/// The stored paid/remaining/execution columns are scaffolding written
/// at creation time; this read path always recomputes them from the
/// payment aggregator. Paid value is the contract-wide total, compared
/// against each period's `available_value` — payments are not
/// period-scoped.
///
/// A contract with no bootstrapped periods yields an empty vec;
/// consumers fall back to contract-level dates.
pub async fn periods_summary(
    pool: &PgPool,
    contract_id: Uuid,
) -> Result<Vec<PeriodSummary>, CoreError> {
    let contract = store::contracts::get(pool, contract_id).await?;
    let periods = store::periods::list_by_contract(pool, contract_id).await?;
    if periods.is_empty() {
        return Ok(Vec::new());
    }

    let payments = store::payments::by_contract_number(pool, &contract.contract_number).await?;
    let total_paid = aggregate::total_paid(&payments);
    let today = Utc::now().date_naive();

    Ok(periods
        .into_iter()
        .map(|period| enrich_period(period, total_paid, today))
        .collect())
}

/// Recompute one period's execution figures against the contract-wide
/// paid total. An `active` period whose end date has passed reads as
/// `completed`; the stored status is not rewritten.
pub fn enrich_period(period: Period, total_paid: Decimal, today: NaiveDate) -> PeriodSummary {
    let remaining = period.available_value - total_paid;
    let execution = if period.available_value > Decimal::ZERO {
        (total_paid / period.available_value * Decimal::from(100))
            .to_f64()
            .unwrap_or(0.0)
    } else {
        0.0
    };
    let status = if period.status == PeriodStatus::Active && period.end_date < today {
        PeriodStatus::Completed
    } else {
        period.status
    };

    PeriodSummary {
        id: period.id,
        contract_id: period.contract_id,
        period_number: period.period_number,
        kind: period.kind,
        start_date: period.start_date,
        end_date: period.end_date,
        status,
        available_value: period.available_value,
        paid_value: total_paid,
        remaining_value: remaining,
        execution_percentage: execution,
        justification: period.justification,
    }
}

/// The active period, or the most recent when none is flagged active
pub fn active_period(periods: &[PeriodSummary]) -> Option<&PeriodSummary> {
    periods
        .iter()
        .find(|period| period.status == PeriodStatus::Active)
        .or_else(|| periods.last())
}

/// Aggregate execution figures across every period of a contract
pub fn period_statistics(periods: &[PeriodSummary]) -> PeriodStatistics {
    let total_paid: Decimal = periods.iter().map(|period| period.paid_value).sum();
    let total_available: Decimal = periods.iter().map(|period| period.available_value).sum();
    let overall = if total_available > Decimal::ZERO {
        (total_paid / total_available * Decimal::from(100))
            .to_f64()
            .unwrap_or(0.0)
    } else {
        0.0
    };

    let current = periods
        .iter()
        .find(|period| period.status == PeriodStatus::Active)
        .map(|period| CurrentPeriodExecution {
            period_number: period.period_number,
            paid_value: period.paid_value,
            remaining_value: period.remaining_value,
            execution_percentage: period.execution_percentage,
        });

    PeriodStatistics {
        total_paid_all_periods: total_paid,
        total_available_all_periods: total_available,
        overall_execution_percentage: overall,
        completed_periods: periods
            .iter()
            .filter(|period| period.status == PeriodStatus::Completed)
            .count(),
        total_periods: periods.len(),
        current_period: current,
    }
}

/// Days until the active period ends; negative once it has passed,
/// `None` when no period is active
pub fn days_remaining_in_active_period(periods: &[PeriodSummary], today: NaiveDate) -> Option<i64> {
    periods
        .iter()
        .find(|period| period.status == PeriodStatus::Active)
        .map(|period| (period.end_date - today).num_days())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::period::PeriodKind;

    fn stored_period(number: i32, status: PeriodStatus, available: i64, end: NaiveDate) -> Period {
        let now = Utc::now();
        Period {
            id: Uuid::new_v4(),
            contract_id: Uuid::new_v4(),
            period_number: number,
            kind: PeriodKind::Original,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: end,
            status,
            available_value: Decimal::from(available),
            paid_value: Decimal::ZERO,
            remaining_value: Decimal::from(available),
            execution_percentage: 0.0,
            justification: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_enrich_recomputes_from_payments_not_stored_columns() {
        let mut stored = stored_period(1, PeriodStatus::Active, 100_000, date(2030, 12, 31));
        // Stale scaffolding that must be ignored on read.
        stored.paid_value = Decimal::from(1);
        stored.remaining_value = Decimal::from(2);
        stored.execution_percentage = 3.0;

        let summary = enrich_period(stored, Decimal::from(25_000), date(2024, 6, 1));
        assert_eq!(summary.paid_value, Decimal::from(25_000));
        assert_eq!(summary.remaining_value, Decimal::from(75_000));
        assert!((summary.execution_percentage - 25.0).abs() < f64::EPSILON);
        assert_eq!(summary.status, PeriodStatus::Active);
    }

    #[test]
    fn test_enrich_zero_available_value_has_zero_execution() {
        let stored = stored_period(1, PeriodStatus::Active, 0, date(2030, 12, 31));
        let summary = enrich_period(stored, Decimal::from(5_000), date(2024, 6, 1));
        assert_eq!(summary.execution_percentage, 0.0);
    }

    #[test]
    fn test_expired_active_period_reads_as_completed() {
        let stored = stored_period(1, PeriodStatus::Active, 100_000, date(2024, 1, 31));
        let summary = enrich_period(stored, Decimal::ZERO, date(2024, 6, 1));
        assert_eq!(summary.status, PeriodStatus::Completed);
    }

    #[test]
    fn test_active_period_falls_back_to_latest() {
        let today = date(2024, 6, 1);
        let summaries: Vec<PeriodSummary> = vec![
            enrich_period(
                stored_period(1, PeriodStatus::Completed, 100_000, date(2024, 12, 31)),
                Decimal::ZERO,
                today,
            ),
            enrich_period(
                stored_period(2, PeriodStatus::Completed, 110_000, date(2025, 12, 31)),
                Decimal::ZERO,
                today,
            ),
        ];
        assert_eq!(active_period(&summaries).map(|p| p.period_number), Some(2));
        assert!(active_period(&[]).is_none());
    }

    #[test]
    fn test_statistics_aggregate_all_periods() {
        let today = date(2024, 6, 1);
        let summaries: Vec<PeriodSummary> = vec![
            enrich_period(
                stored_period(1, PeriodStatus::Completed, 100_000, date(2023, 12, 31)),
                Decimal::from(50_000),
                today,
            ),
            enrich_period(
                stored_period(2, PeriodStatus::Active, 100_000, date(2030, 12, 31)),
                Decimal::from(50_000),
                today,
            ),
        ];

        let stats = period_statistics(&summaries);
        assert_eq!(stats.total_paid_all_periods, Decimal::from(100_000));
        assert_eq!(stats.total_available_all_periods, Decimal::from(200_000));
        assert!((stats.overall_execution_percentage - 50.0).abs() < f64::EPSILON);
        assert_eq!(stats.completed_periods, 1);
        assert_eq!(stats.total_periods, 2);
        assert_eq!(stats.current_period.as_ref().map(|c| c.period_number), Some(2));
    }

    #[test]
    fn test_days_remaining() {
        let today = date(2024, 6, 1);
        let summaries = vec![enrich_period(
            stored_period(1, PeriodStatus::Active, 100_000, date(2024, 6, 11)),
            Decimal::ZERO,
            today,
        )];
        assert_eq!(days_remaining_in_active_period(&summaries, today), Some(10));
        assert_eq!(days_remaining_in_active_period(&[], today), None);
    }
}
