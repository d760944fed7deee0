use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// Funding source of a bank order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FundingSource {
    Federal,
    State,
}

impl fmt::Display for FundingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FundingSource::Federal => write!(f, "federal"),
            FundingSource::State => write!(f, "state"),
        }
    }
}

/// Nota fiscal attached to a payment record.
///
/// Maps to the `payment_invoices` table. Belongs to exactly one
/// `PaymentRecord`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Invoice {
    pub id: Uuid,

    /// Invoice number as issued (numero_nf)
    pub nf_number: String,

    /// Gross invoiced amount (valor_nfe)
    pub gross_amount: Decimal,

    /// Reference month, 1-12 (mes_competencia)
    pub reference_month: i32,

    /// Reference year (ano_competencia)
    pub reference_year: i32,
}

/// Bank order (ordem bancária) entry: an actual liquidation event.
///
/// Maps to the `payment_entries` table. `bank_order_date` is kept as the
/// raw string it was registered with; the aggregator parses it with the
/// multi-format rules in `payments::dates`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PaymentEntry {
    pub id: Uuid,

    /// Amount liquidated by this bank order
    pub amount: Decimal,

    /// Bank order reference (referencia_ob)
    pub bank_order_ref: String,

    /// Bank order date, raw as registered (DD/MM/YYYY, YYYY-MM-DD or
    /// DD-MM-YYYY)
    pub bank_order_date: String,

    /// Budget commitment number (empenho)
    pub commitment_number: String,

    /// Invoice this entry liquidates. `None` on records registered
    /// before multi-invoice support; those resolve to the legacy fields
    /// on the parent record.
    pub invoice_id: Option<Uuid>,
}

/// Payment record: one registration event bundling invoices and the bank
/// orders liquidating them.
///
/// References its contract through the business key `contract_number`,
/// not the contract's internal id. Entries are never required to sum to
/// the invoiced value; partial payment is a valid terminal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: Uuid,
    pub contract_number: String,

    pub invoices: Vec<Invoice>,
    pub federal_entries: Vec<PaymentEntry>,
    pub state_entries: Vec<PaymentEntry>,

    // Pre-multi-invoice records stored the single nota fiscal directly
    // on the record. Kept for fallback resolution.
    pub legacy_nf_number: Option<String>,
    pub legacy_gross_amount: Option<Decimal>,
    pub legacy_reference_month: Option<i32>,
    pub legacy_reference_year: Option<i32>,

    /// Timestamp when the payment was registered
    pub registered_at: DateTime<Utc>,
}

/// Derived payment status of an invoice. Display only: nothing enforces
/// that entries sum to the invoiced value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    FullyPaid,
    Partial,
}

/// Invoice fields for payment registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInvoice {
    pub nf_number: String,
    pub gross_amount: Decimal,
    pub reference_month: i32,
    pub reference_year: i32,
}

/// Entry fields for payment registration. `invoice_index` points into
/// the request's `invoices` array; ids are assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPaymentEntry {
    pub amount: Decimal,
    pub bank_order_ref: String,
    pub bank_order_date: String,
    pub commitment_number: String,
    pub invoice_index: Option<usize>,
}

/// Payment registration request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePaymentRecord {
    pub contract_number: String,
    pub invoices: Vec<NewInvoice>,
    pub federal_entries: Vec<NewPaymentEntry>,
    pub state_entries: Vec<NewPaymentEntry>,
}
