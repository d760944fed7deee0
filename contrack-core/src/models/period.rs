use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// Period kind enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PeriodKind {
    /// Period #1, opened on contract registration
    Original,
    /// Opened by an extension amendment
    Extension,
}

/// Period status enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PeriodStatus {
    Active,
    Completed,
    Cancelled,
}

impl fmt::Display for PeriodStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodStatus::Active => write!(f, "active"),
            PeriodStatus::Completed => write!(f, "completed"),
            PeriodStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Period of vigência for a contract.
///
/// Maps to the `contract_periods` table. Periods are derived state: one
/// is opened on contract registration and one per extension amendment.
/// At most one period per contract is `active` at any time.
///
/// `paid_value`, `remaining_value` and `execution_percentage` are written
/// at creation time as scaffolding only. Read paths must recompute them
/// from the payment aggregator; payments recorded later never update the
/// stored columns.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Period {
    pub id: Uuid,
    pub contract_id: Uuid,

    /// 1 = original, monotonically increasing
    pub period_number: i32,

    pub kind: PeriodKind,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: PeriodStatus,

    /// Value baseline for the period: the contract's effective value as
    /// of period creation
    pub available_value: Decimal,

    pub paid_value: Decimal,
    pub remaining_value: Decimal,
    pub execution_percentage: f64,

    pub justification: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Period enriched with freshly computed execution figures.
///
/// `status` here is the effective status: an `active` period whose end
/// date has passed reads as `completed` without a proactive write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub period_number: i32,
    pub kind: PeriodKind,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: PeriodStatus,
    pub available_value: Decimal,
    pub paid_value: Decimal,
    pub remaining_value: Decimal,
    pub execution_percentage: f64,
    pub justification: Option<String>,
}

/// Aggregate execution figures over all of a contract's periods
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodStatistics {
    pub total_paid_all_periods: Decimal,
    pub total_available_all_periods: Decimal,
    pub overall_execution_percentage: f64,
    pub completed_periods: usize,
    pub total_periods: usize,
    pub current_period: Option<CurrentPeriodExecution>,
}

/// Execution detail for the active period, when one exists
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentPeriodExecution {
    pub period_number: i32,
    pub paid_value: Decimal,
    pub remaining_value: Decimal,
    pub execution_percentage: f64,
}
