use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres};
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::payment::{
    CreatePaymentRecord, FundingSource, Invoice, NewPaymentEntry, PaymentEntry, PaymentRecord,
};
use crate::store::bounded;

#[derive(Debug, FromRow)]
struct PaymentRow {
    id: Uuid,
    contract_number: String,
    legacy_nf_number: Option<String>,
    legacy_gross_amount: Option<Decimal>,
    legacy_reference_month: Option<i32>,
    legacy_reference_year: Option<i32>,
    registered_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct InvoiceRow {
    payment_id: Uuid,
    #[sqlx(flatten)]
    invoice: Invoice,
}

#[derive(Debug, FromRow)]
struct EntryRow {
    payment_id: Uuid,
    source: FundingSource,
    #[sqlx(flatten)]
    entry: PaymentEntry,
}

impl PaymentRow {
    fn into_record(self) -> PaymentRecord {
        PaymentRecord {
            id: self.id,
            contract_number: self.contract_number,
            invoices: Vec::new(),
            federal_entries: Vec::new(),
            state_entries: Vec::new(),
            legacy_nf_number: self.legacy_nf_number,
            legacy_gross_amount: self.legacy_gross_amount,
            legacy_reference_month: self.legacy_reference_month,
            legacy_reference_year: self.legacy_reference_year,
            registered_at: self.registered_at,
        }
    }
}

const PAYMENT_COLUMNS: &str = "id, contract_number, legacy_nf_number, legacy_gross_amount, \
     legacy_reference_month, legacy_reference_year, registered_at";

/// All payment records for a contract, joined by the business key
/// `contract_number`, newest registration first. The record plus its
/// invoices and entries load as a unit.
pub async fn by_contract_number(
    pool: &PgPool,
    contract_number: &str,
) -> Result<Vec<PaymentRecord>, CoreError> {
    let sql = format!(
        "SELECT {PAYMENT_COLUMNS} FROM payments WHERE contract_number = $1 \
         ORDER BY registered_at DESC"
    );
    bounded("payments_by_contract", async {
        let rows: Vec<PaymentRow> = sqlx::query_as(&sql)
            .bind(contract_number)
            .fetch_all(pool)
            .await?;
        assemble(pool, rows).await
    })
    .await
}

/// One payment record with its invoices and entries
pub async fn get(pool: &PgPool, payment_id: Uuid) -> Result<PaymentRecord, CoreError> {
    let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1");
    let records = bounded("get_payment", async {
        let row: Option<PaymentRow> = sqlx::query_as(&sql)
            .bind(payment_id)
            .fetch_optional(pool)
            .await?;
        assemble(pool, row.into_iter().collect()).await
    })
    .await?;
    records
        .into_iter()
        .next()
        .ok_or_else(|| CoreError::not_found("payment", payment_id))
}

/// Register a payment record with its invoices and bank orders in one
/// transaction. Entry `invoice_index` values point into the request's
/// invoices array and are resolved to the generated invoice ids.
pub async fn insert(
    pool: &PgPool,
    request: CreatePaymentRecord,
) -> Result<PaymentRecord, CoreError> {
    let invoices: Vec<Invoice> = request
        .invoices
        .into_iter()
        .map(|invoice| Invoice {
            id: Uuid::new_v4(),
            nf_number: invoice.nf_number,
            gross_amount: invoice.gross_amount,
            reference_month: invoice.reference_month,
            reference_year: invoice.reference_year,
        })
        .collect();

    let federal_entries = materialize_entries(&invoices, request.federal_entries)?;
    let state_entries = materialize_entries(&invoices, request.state_entries)?;

    let record = PaymentRecord {
        id: Uuid::new_v4(),
        contract_number: request.contract_number,
        invoices,
        federal_entries,
        state_entries,
        legacy_nf_number: None,
        legacy_gross_amount: None,
        legacy_reference_month: None,
        legacy_reference_year: None,
        registered_at: Utc::now(),
    };

    bounded("insert_payment", async {
        let mut tx = pool.begin().await?;
        sqlx::query(
            "INSERT INTO payments (id, contract_number, registered_at) VALUES ($1, $2, $3)",
        )
        .bind(record.id)
        .bind(&record.contract_number)
        .bind(record.registered_at)
        .execute(&mut *tx)
        .await?;

        for invoice in &record.invoices {
            sqlx::query(
                "INSERT INTO payment_invoices (id, payment_id, nf_number, gross_amount, \
                 reference_month, reference_year) VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(invoice.id)
            .bind(record.id)
            .bind(&invoice.nf_number)
            .bind(invoice.gross_amount)
            .bind(invoice.reference_month)
            .bind(invoice.reference_year)
            .execute(&mut *tx)
            .await?;
        }

        for entry in &record.federal_entries {
            insert_entry(&mut *tx, record.id, FundingSource::Federal, entry).await?;
        }
        for entry in &record.state_entries {
            insert_entry(&mut *tx, record.id, FundingSource::State, entry).await?;
        }

        tx.commit().await?;
        Ok(())
    })
    .await?;

    Ok(record)
}

/// Append one bank order to an existing record. Entries accumulate
/// append-style; nothing requires them to sum to the invoiced value.
pub async fn append_entry(
    pool: &PgPool,
    payment_id: Uuid,
    source: FundingSource,
    new_entry: NewPaymentEntry,
) -> Result<PaymentEntry, CoreError> {
    let record = get(pool, payment_id).await?;
    let entries = materialize_entries(&record.invoices, vec![new_entry])?;
    let entry = entries
        .into_iter()
        .next()
        .ok_or_else(|| CoreError::validation("empty entry payload"))?;

    bounded("append_payment_entry", async {
        insert_entry(pool, payment_id, source, &entry).await
    })
    .await?;

    Ok(entry)
}

fn materialize_entries(
    invoices: &[Invoice],
    entries: Vec<NewPaymentEntry>,
) -> Result<Vec<PaymentEntry>, CoreError> {
    entries
        .into_iter()
        .map(|entry| {
            let invoice_id = match entry.invoice_index {
                Some(index) => Some(
                    invoices
                        .get(index)
                        .map(|invoice| invoice.id)
                        .ok_or_else(|| {
                            CoreError::validation(format!(
                                "invoice_index {index} is out of bounds"
                            ))
                        })?,
                ),
                None => None,
            };
            Ok(PaymentEntry {
                id: Uuid::new_v4(),
                amount: entry.amount,
                bank_order_ref: entry.bank_order_ref,
                bank_order_date: entry.bank_order_date,
                commitment_number: entry.commitment_number,
                invoice_id,
            })
        })
        .collect()
}

async fn insert_entry<'e, E>(
    executor: E,
    payment_id: Uuid,
    source: FundingSource,
    entry: &PaymentEntry,
) -> Result<(), sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    sqlx::query(
        "INSERT INTO payment_entries (id, payment_id, source, amount, bank_order_ref, \
         bank_order_date, commitment_number, invoice_id, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())",
    )
    .bind(entry.id)
    .bind(payment_id)
    .bind(source)
    .bind(entry.amount)
    .bind(&entry.bank_order_ref)
    .bind(&entry.bank_order_date)
    .bind(&entry.commitment_number)
    .bind(entry.invoice_id)
    .execute(executor)
    .await?;
    Ok(())
}

/// Attach invoices and entries to their parent rows, preserving the
/// parent ordering
async fn assemble(pool: &PgPool, rows: Vec<PaymentRow>) -> Result<Vec<PaymentRecord>, sqlx::Error> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();

    let invoice_rows: Vec<InvoiceRow> = sqlx::query_as(
        "SELECT payment_id, id, nf_number, gross_amount, reference_month, reference_year \
         FROM payment_invoices WHERE payment_id = ANY($1) ORDER BY reference_year, reference_month",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let entry_rows: Vec<EntryRow> = sqlx::query_as(
        "SELECT payment_id, source, id, amount, bank_order_ref, bank_order_date, \
         commitment_number, invoice_id \
         FROM payment_entries WHERE payment_id = ANY($1) ORDER BY created_at",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let mut records: Vec<PaymentRecord> = rows.into_iter().map(PaymentRow::into_record).collect();
    for row in invoice_rows {
        if let Some(record) = records.iter_mut().find(|record| record.id == row.payment_id) {
            record.invoices.push(row.invoice);
        }
    }
    for row in entry_rows {
        if let Some(record) = records.iter_mut().find(|record| record.id == row.payment_id) {
            match row.source {
                FundingSource::Federal => record.federal_entries.push(row.entry),
                FundingSource::State => record.state_entries.push(row.entry),
            }
        }
    }

    Ok(records)
}
