use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// Amendment category enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AmendmentCategory {
    /// Vigência change (extension or early termination)
    Tenure,
    /// Value change (signed delta against the contract baseline)
    Value,
}

/// Amendment kind enumeration, covering both categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AmendmentKind {
    Extension,
    EarlyTermination,
    Addition,
    Suppression,
    Readjustment,
    Renegotiation,
}

impl fmt::Display for AmendmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmendmentKind::Extension => write!(f, "extension"),
            AmendmentKind::EarlyTermination => write!(f, "early_termination"),
            AmendmentKind::Addition => write!(f, "addition"),
            AmendmentKind::Suppression => write!(f, "suppression"),
            AmendmentKind::Readjustment => write!(f, "readjustment"),
            AmendmentKind::Renegotiation => write!(f, "renegotiation"),
        }
    }
}

/// Kinds accepted by a tenure amendment. Using a dedicated enum keeps
/// a value kind from ever reaching the tenure recording path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenureKind {
    Extension,
    EarlyTermination,
}

impl From<TenureKind> for AmendmentKind {
    fn from(kind: TenureKind) -> Self {
        match kind {
            TenureKind::Extension => AmendmentKind::Extension,
            TenureKind::EarlyTermination => AmendmentKind::EarlyTermination,
        }
    }
}

/// Kinds accepted by a value amendment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Addition,
    Suppression,
    Readjustment,
    Renegotiation,
}

impl From<ValueKind> for AmendmentKind {
    fn from(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Addition => AmendmentKind::Addition,
            ValueKind::Suppression => AmendmentKind::Suppression,
            ValueKind::Readjustment => AmendmentKind::Readjustment,
            ValueKind::Renegotiation => AmendmentKind::Renegotiation,
        }
    }
}

/// Amendment record in the append-only ledger.
///
/// Maps to the `contract_amendments` table. Amendments are never hard
/// deleted or updated in place: `is_active = false` excludes a record
/// from every aggregate computation while preserving audit history.
/// Tenure fields are populated for `category = tenure`, value fields
/// for `category = value`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Amendment {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub category: AmendmentCategory,
    pub kind: AmendmentKind,
    pub amendment_date: DateTime<Utc>,

    /// Soft-delete flag. Deactivation is monotonic: there is no
    /// reactivation operation.
    pub is_active: bool,

    // Tenure fields, snapshotted from the current period at creation time
    pub previous_start_date: Option<NaiveDate>,
    pub previous_end_date: Option<NaiveDate>,
    pub new_start_date: Option<NaiveDate>,
    pub new_end_date: Option<NaiveDate>,

    /// Effective value at creation time. Informational only: the active
    /// delta never depends on it.
    pub previous_value: Option<Decimal>,

    /// Signed delta (negative for suppression). Stored exactly as given
    /// by the caller.
    pub amendment_value: Option<Decimal>,

    pub percentage_applied: Option<Decimal>,
    pub index_used: Option<String>,
    pub reference_period: Option<String>,
    pub description: Option<String>,

    pub justification: String,
    pub legal_basis: Option<String>,

    /// User who recorded the amendment
    pub created_by: Uuid,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Amendment {
    pub fn is_value(&self) -> bool {
        self.category == AmendmentCategory::Value
    }

    pub fn is_tenure(&self) -> bool {
        self.category == AmendmentCategory::Tenure
    }
}

/// Tenure amendment submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenureAmendmentForm {
    pub kind: TenureKind,
    pub new_start_date: NaiveDate,
    pub new_end_date: NaiveDate,
    pub justification: String,
    pub legal_basis: Option<String>,
}

/// Value amendment submission.
///
/// `amendment_value` carries the sign: the ledger stores it as given and
/// never re-derives it from `kind`. Readjustment percentages are computed
/// by the caller before submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueAmendmentForm {
    pub kind: ValueKind,
    pub amendment_value: Decimal,
    pub percentage_applied: Option<Decimal>,
    pub index_used: Option<String>,
    pub reference_period: Option<String>,
    pub description: Option<String>,
    pub justification: String,
    pub legal_basis: Option<String>,
}

/// Aggregate figures over a contract's amendment history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmendmentsSummary {
    /// Sum of `amendment_value` over active value amendments
    pub total_amendments_value: Decimal,

    /// Count of value amendments, active and inactive
    pub total_value_amendments: usize,

    /// Count of tenure amendments, active and inactive
    pub total_tenure_amendments: usize,

    /// `original_value + total_amendments_value`
    pub current_value: Decimal,
}

/// Amendment history plus its summary, ordered by `amendment_date`
/// descending
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmendmentsHistory {
    pub amendments: Vec<Amendment>,
    pub summary: AmendmentsSummary,
}
