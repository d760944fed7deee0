use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use uuid::Uuid;

use rust_decimal::Decimal;

use crate::models::payment::{FundingSource, PaymentEntry, PaymentRecord};
use crate::payments::aggregate::{effective_invoices, resolve_invoice_id};
use crate::payments::dates::parse_date_to_time;

/// Sort direction for the bank-order ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[serde(alias = "asc")]
    Ascending,
    #[default]
    #[serde(alias = "desc")]
    Descending,
}

/// One bank order flattened out of its payment record, annotated with
/// the invoice it liquidates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankOrderLine {
    pub payment_id: Uuid,
    pub entry_id: Uuid,
    pub bank_order_ref: String,
    pub bank_order_date: String,
    pub commitment_number: String,
    pub source: FundingSource,
    pub amount: Decimal,

    /// Nota fiscal number of the liquidated invoice
    pub nf_number: String,
    pub reference_month: i32,
    pub reference_year: i32,

    /// Parsed `bank_order_date`, midnight millis; 0 when unparseable
    pub ordered_at: i64,
}

/// Flatten every federal and state entry into a single chronologically
/// sorted ledger.
///
/// Invoice annotations resolve through `invoice_id`, falling back to the
/// record's legacy single-nota fields. Ties on the parsed date break by
/// descending bank-order reference, whatever the requested direction.
pub fn bank_order_ledger(payments: &[PaymentRecord], order: SortOrder) -> Vec<BankOrderLine> {
    let mut lines: Vec<BankOrderLine> = Vec::new();

    for record in payments {
        let invoices = effective_invoices(record);
        let by_id: HashMap<Uuid, usize> = invoices
            .iter()
            .enumerate()
            .map(|(idx, invoice)| (invoice.id, idx))
            .collect();

        let mut push = |entry: &PaymentEntry, source: FundingSource| {
            let idx = by_id
                .get(&resolve_invoice_id(record, entry))
                .copied()
                .or(if invoices.is_empty() { None } else { Some(0) });
            let invoice = idx.map(|idx| &invoices[idx]);

            lines.push(BankOrderLine {
                payment_id: record.id,
                entry_id: entry.id,
                bank_order_ref: entry.bank_order_ref.clone(),
                bank_order_date: entry.bank_order_date.clone(),
                commitment_number: entry.commitment_number.clone(),
                source,
                amount: entry.amount,
                nf_number: invoice.map(|inv| inv.nf_number.clone()).unwrap_or_default(),
                reference_month: invoice.map(|inv| inv.reference_month).unwrap_or(0),
                reference_year: invoice.map(|inv| inv.reference_year).unwrap_or(0),
                ordered_at: parse_date_to_time(&entry.bank_order_date),
            });
        };

        for entry in &record.federal_entries {
            push(entry, FundingSource::Federal);
        }
        for entry in &record.state_entries {
            push(entry, FundingSource::State);
        }
    }

    lines.sort_by(|a, b| {
        let chronological = match order {
            SortOrder::Ascending => a.ordered_at.cmp(&b.ordered_at),
            SortOrder::Descending => b.ordered_at.cmp(&a.ordered_at),
        };
        match chronological {
            Ordering::Equal => b.bank_order_ref.cmp(&a.bank_order_ref),
            other => other,
        }
    });

    lines
}
