pub mod aggregate;
pub mod dates;
pub mod orders;

pub use aggregate::{
    by_month, dashboard_summary, invoice_status, monthly_series, record_status, remaining_to_pay,
    total_invoiced, total_paid, total_paid_by_source,
};
pub use dates::parse_date_to_time;
pub use orders::{bank_order_ledger, BankOrderLine, SortOrder};
