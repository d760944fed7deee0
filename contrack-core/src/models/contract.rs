use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Contract model representing a registered service contract.
///
/// This struct maps to the `contracts` table. It holds the immutable
/// financial baseline: `original_value` and the original vigência dates
/// never change after registration. Value and tenure changes are recorded
/// as amendments and reconstructed at read time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Contract {
    /// Unique identifier for the contract
    pub id: Uuid,

    /// Tax id of the contracted party (CNPJ)
    pub cnpj: String,

    /// Name of the contracted company
    pub company_name: String,

    /// Human-assigned contract number, e.g. "120/SESAU/2023".
    /// Payments reference contracts through this business key.
    pub contract_number: String,

    /// Administrative process number
    pub process_number: String,

    /// Nature of the contracted service
    pub nature: Option<String>,

    /// Object of the contract (service description)
    pub object: Option<String>,

    /// Original contracted value, before any amendment
    pub original_value: Decimal,

    /// Start of the original vigência
    pub original_start_date: NaiveDate,

    /// End of the original vigência, when registered with one
    pub original_end_date: Option<NaiveDate>,

    /// Timestamp when the contract was registered
    pub created_at: DateTime<Utc>,

    /// Timestamp when the contract was last updated
    pub updated_at: DateTime<Utc>,
}

impl Contract {
    /// End date used when snapshotting or falling back: registered end
    /// date, or the start date for contracts registered without one.
    pub fn end_or_start(&self) -> NaiveDate {
        self.original_end_date.unwrap_or(self.original_start_date)
    }
}

/// Contract registration request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateContract {
    pub cnpj: String,
    pub company_name: String,
    pub contract_number: String,
    pub process_number: String,
    pub nature: Option<String>,
    pub object: Option<String>,
    pub original_value: Decimal,
    pub original_start_date: NaiveDate,
    pub original_end_date: Option<NaiveDate>,
}

/// Administrative edit request.
///
/// Only descriptive fields can be edited in place. Financial and tenure
/// changes go through the amendment ledger, never through this struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateContract {
    pub company_name: Option<String>,
    pub nature: Option<String>,
    pub object: Option<String>,
}

/// The authoritative "current state" read model for a contract.
///
/// Assembled by the projection builder from the base contract, the
/// amendment ledger and the period tracker. Never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractWithCurrentInfo {
    pub id: Uuid,
    pub contract_number: String,
    pub company_name: String,
    pub cnpj: String,
    pub process_number: String,
    pub object: Option<String>,

    /// Original contracted value (immutable baseline)
    pub total_value: Decimal,

    /// Sum of all active value amendments (signed)
    pub total_amendments_value: Decimal,

    /// `total_value + total_amendments_value`
    pub effective_value: Decimal,

    /// Start of the current vigência (active period, or contract dates
    /// when no periods exist)
    pub current_start_date: NaiveDate,

    /// End of the current vigência
    pub current_end_date: NaiveDate,

    /// Count of amendments, active and inactive
    pub total_amendments: usize,
}
