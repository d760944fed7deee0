use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::payment::{Invoice, PaymentEntry, PaymentRecord, PaymentStatus};

/// Sum of every bank order, federal and state, across all records.
/// Pure function, no I/O.
pub fn total_paid(payments: &[PaymentRecord]) -> Decimal {
    payments
        .iter()
        .map(|record| entries_total(&record.federal_entries) + entries_total(&record.state_entries))
        .sum()
}

/// Paid totals split by funding source
pub fn total_paid_by_source(payments: &[PaymentRecord]) -> (Decimal, Decimal) {
    let federal = payments
        .iter()
        .map(|record| entries_total(&record.federal_entries))
        .sum();
    let state = payments
        .iter()
        .map(|record| entries_total(&record.state_entries))
        .sum();
    (federal, state)
}

/// Sum of `gross_amount` across every invoice of every record
pub fn total_invoiced(payments: &[PaymentRecord]) -> Decimal {
    payments
        .iter()
        .map(|record| {
            effective_invoices(record)
                .iter()
                .map(|invoice| invoice.gross_amount)
                .sum::<Decimal>()
        })
        .sum()
}

/// Contract value minus everything paid so far, across all periods
pub fn remaining_to_pay(contract_value: Decimal, payments: &[PaymentRecord]) -> Decimal {
    contract_value - total_paid(payments)
}

/// Paid and invoiced totals for one reference month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthSlice {
    pub federal: Decimal,
    pub state: Decimal,
    pub total: Decimal,
    pub invoiced: Decimal,
}

/// Totals for the invoices of one reference month.
///
/// Entries are attributed through `invoice_id`: a record may bundle
/// invoices across different months, so matching the parent record is
/// not enough. Entries of a matching invoice count; the record's other
/// entries do not.
pub fn by_month(payments: &[PaymentRecord], month: i32) -> MonthSlice {
    let mut slice = MonthSlice {
        federal: Decimal::ZERO,
        state: Decimal::ZERO,
        total: Decimal::ZERO,
        invoiced: Decimal::ZERO,
    };

    for record in payments {
        let matching: Vec<Uuid> = effective_invoices(record)
            .iter()
            .filter(|invoice| invoice.reference_month == month)
            .map(|invoice| invoice.id)
            .collect();
        if matching.is_empty() {
            continue;
        }

        slice.invoiced += effective_invoices(record)
            .iter()
            .filter(|invoice| invoice.reference_month == month)
            .map(|invoice| invoice.gross_amount)
            .sum::<Decimal>();

        slice.federal += entries_for_invoices(record, &record.federal_entries, &matching);
        slice.state += entries_for_invoices(record, &record.state_entries, &matching);
    }

    slice.total = slice.federal + slice.state;
    slice
}

/// Derived status badge for one invoice: fully paid once the entries
/// referencing it cover `gross_amount`. Display only, never enforced.
///
/// Returns `None` when the record holds no such invoice.
pub fn invoice_status(record: &PaymentRecord, invoice_id: Uuid) -> Option<PaymentStatus> {
    let invoices = effective_invoices(record);
    let invoice = invoices.iter().find(|invoice| invoice.id == invoice_id)?;

    let ids = [invoice_id];
    let paid = entries_for_invoices(record, &record.federal_entries, &ids)
        + entries_for_invoices(record, &record.state_entries, &ids);

    Some(if paid >= invoice.gross_amount {
        PaymentStatus::FullyPaid
    } else {
        PaymentStatus::Partial
    })
}

/// Status badge for a whole record: everything liquidated against
/// everything invoiced
pub fn record_status(record: &PaymentRecord) -> PaymentStatus {
    let paid = entries_total(&record.federal_entries) + entries_total(&record.state_entries);
    let invoiced: Decimal = effective_invoices(record)
        .iter()
        .map(|invoice| invoice.gross_amount)
        .sum();
    if paid >= invoiced {
        PaymentStatus::FullyPaid
    } else {
        PaymentStatus::Partial
    }
}

/// Per-month series for the dashboard chart, trimmed to start at the
/// first month with a bank order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthTotals {
    pub month: i32,
    pub federal: Decimal,
    pub state: Decimal,
    pub total: Decimal,
    pub invoiced: Decimal,
}

pub fn monthly_series(payments: &[PaymentRecord]) -> Vec<MonthTotals> {
    let series: Vec<MonthTotals> = (1..=12)
        .map(|month| {
            let slice = by_month(payments, month);
            MonthTotals {
                month,
                federal: slice.federal,
                state: slice.state,
                total: slice.total,
                invoiced: slice.invoiced,
            }
        })
        .collect();

    match series.iter().position(|m| m.total > Decimal::ZERO) {
        Some(first) => series[first..].to_vec(),
        None => series,
    }
}

/// Dashboard read model for one contract's payments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_federal: Decimal,
    pub total_state: Decimal,
    pub total_paid: Decimal,
    pub total_invoiced: Decimal,
    pub remaining_to_pay: Decimal,
    pub monthly: Vec<MonthTotals>,
}

pub fn dashboard_summary(contract_value: Decimal, payments: &[PaymentRecord]) -> DashboardSummary {
    let (total_federal, total_state) = total_paid_by_source(payments);
    DashboardSummary {
        total_federal,
        total_state,
        total_paid: total_federal + total_state,
        total_invoiced: total_invoiced(payments),
        remaining_to_pay: remaining_to_pay(contract_value, payments),
        monthly: monthly_series(payments),
    }
}

/// The record's invoices, synthesizing one from the legacy single-nota
/// fields for records registered before multi-invoice support. The
/// synthetic invoice borrows the record's id; legacy entries carry no
/// `invoice_id` and resolve to it through [`resolve_invoice_id`].
pub(crate) fn effective_invoices(record: &PaymentRecord) -> Vec<Invoice> {
    if !record.invoices.is_empty() {
        return record.invoices.clone();
    }
    if record.legacy_nf_number.is_none() && record.legacy_gross_amount.is_none() {
        return Vec::new();
    }
    vec![Invoice {
        id: record.id,
        nf_number: record.legacy_nf_number.clone().unwrap_or_default(),
        gross_amount: record.legacy_gross_amount.unwrap_or(Decimal::ZERO),
        reference_month: record.legacy_reference_month.unwrap_or(0),
        reference_year: record.legacy_reference_year.unwrap_or(0),
    }]
}

/// Invoice an entry liquidates: its own `invoice_id`, or the record's
/// synthetic legacy invoice when absent
pub(crate) fn resolve_invoice_id(record: &PaymentRecord, entry: &PaymentEntry) -> Uuid {
    entry.invoice_id.unwrap_or(record.id)
}

fn entries_total(entries: &[PaymentEntry]) -> Decimal {
    entries.iter().map(|entry| entry.amount).sum()
}

fn entries_for_invoices(
    record: &PaymentRecord,
    entries: &[PaymentEntry],
    invoice_ids: &[Uuid],
) -> Decimal {
    entries
        .iter()
        .filter(|entry| invoice_ids.contains(&resolve_invoice_id(record, entry)))
        .map(|entry| entry.amount)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(amount: i64, invoice_id: Option<Uuid>) -> PaymentEntry {
        PaymentEntry {
            id: Uuid::new_v4(),
            amount: Decimal::from(amount),
            bank_order_ref: "2024OB00001".to_string(),
            bank_order_date: "01/02/2024".to_string(),
            commitment_number: "2024NE0001".to_string(),
            invoice_id,
        }
    }

    fn invoice(amount: i64, month: i32) -> Invoice {
        Invoice {
            id: Uuid::new_v4(),
            nf_number: "NF-001".to_string(),
            gross_amount: Decimal::from(amount),
            reference_month: month,
            reference_year: 2024,
        }
    }

    fn record(
        invoices: Vec<Invoice>,
        federal: Vec<PaymentEntry>,
        state: Vec<PaymentEntry>,
    ) -> PaymentRecord {
        PaymentRecord {
            id: Uuid::new_v4(),
            contract_number: "120/SESAU/2023".to_string(),
            invoices,
            federal_entries: federal,
            state_entries: state,
            legacy_nf_number: None,
            legacy_gross_amount: None,
            legacy_reference_month: None,
            legacy_reference_year: None,
            registered_at: Utc::now(),
        }
    }

    #[test]
    fn test_total_paid_sums_both_sources() {
        let inv = invoice(10_000, 3);
        let inv_id = inv.id;
        let payments = vec![record(
            vec![inv],
            vec![entry(4_000, Some(inv_id))],
            vec![entry(3_000, Some(inv_id))],
        )];

        assert_eq!(total_paid(&payments), Decimal::from(7_000));
        let (federal, state) = total_paid_by_source(&payments);
        assert_eq!(federal, Decimal::from(4_000));
        assert_eq!(state, Decimal::from(3_000));
        assert_eq!(total_invoiced(&payments), Decimal::from(10_000));
    }

    #[test]
    fn test_by_month_attributes_entries_through_invoice_id() {
        // One record bundling invoices of two different months. Only the
        // entries liquidating the March invoice count for March.
        let march = invoice(10_000, 3);
        let april = invoice(8_000, 4);
        let march_id = march.id;
        let april_id = april.id;
        let payments = vec![record(
            vec![march, april],
            vec![entry(4_000, Some(march_id)), entry(8_000, Some(april_id))],
            vec![entry(3_000, Some(march_id))],
        )];

        let slice = by_month(&payments, 3);
        assert_eq!(slice.total, Decimal::from(7_000));
        assert_eq!(slice.federal, Decimal::from(4_000));
        assert_eq!(slice.state, Decimal::from(3_000));
        assert_eq!(slice.invoiced, Decimal::from(10_000));

        let april_slice = by_month(&payments, 4);
        assert_eq!(april_slice.total, Decimal::from(8_000));
    }

    #[test]
    fn test_partial_invoice_status() {
        let inv = invoice(10_000, 3);
        let inv_id = inv.id;
        let rec = record(
            vec![inv],
            vec![entry(4_000, Some(inv_id)), entry(3_000, Some(inv_id))],
            vec![],
        );

        assert_eq!(invoice_status(&rec, inv_id), Some(PaymentStatus::Partial));
        assert_eq!(record_status(&rec), PaymentStatus::Partial);
    }

    #[test]
    fn test_fully_paid_invoice_status() {
        let inv = invoice(7_000, 3);
        let inv_id = inv.id;
        let rec = record(
            vec![inv],
            vec![entry(4_000, Some(inv_id))],
            vec![entry(3_000, Some(inv_id))],
        );

        assert_eq!(invoice_status(&rec, inv_id), Some(PaymentStatus::FullyPaid));
    }

    #[test]
    fn test_unknown_invoice_has_no_status() {
        let rec = record(vec![invoice(1_000, 1)], vec![], vec![]);
        assert_eq!(invoice_status(&rec, Uuid::new_v4()), None);
    }

    #[test]
    fn test_legacy_record_resolves_through_synthetic_invoice() {
        let mut rec = record(vec![], vec![entry(2_500, None)], vec![]);
        rec.legacy_nf_number = Some("NF-88229".to_string());
        rec.legacy_gross_amount = Some(Decimal::from(5_000));
        rec.legacy_reference_month = Some(6);
        rec.legacy_reference_year = Some(2023);
        let payments = vec![rec];

        assert_eq!(total_invoiced(&payments), Decimal::from(5_000));
        let slice = by_month(&payments, 6);
        assert_eq!(slice.total, Decimal::from(2_500));
        assert_eq!(slice.invoiced, Decimal::from(5_000));
        assert_eq!(
            invoice_status(&payments[0], payments[0].id),
            Some(PaymentStatus::Partial)
        );
    }

    #[test]
    fn test_monthly_series_trims_leading_empty_months() {
        let inv = invoice(10_000, 3);
        let inv_id = inv.id;
        let payments = vec![record(vec![inv], vec![entry(4_000, Some(inv_id))], vec![])];

        let series = monthly_series(&payments);
        assert_eq!(series.first().map(|m| m.month), Some(3));
        assert_eq!(series.len(), 10);
    }

    #[test]
    fn test_remaining_to_pay() {
        let inv = invoice(10_000, 3);
        let inv_id = inv.id;
        let payments = vec![record(vec![inv], vec![entry(4_000, Some(inv_id))], vec![])];

        assert_eq!(
            remaining_to_pay(Decimal::from(100_000), &payments),
            Decimal::from(96_000)
        );
    }
}
