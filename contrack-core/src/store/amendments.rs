use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::amendment::Amendment;
use crate::store::bounded;

const COLUMNS: &str = "id, contract_id, category, kind, amendment_date, is_active, \
     previous_start_date, previous_end_date, new_start_date, new_end_date, \
     previous_value, amendment_value, percentage_applied, index_used, reference_period, \
     description, justification, legal_basis, created_by, created_at, updated_at";

/// Append one amendment to the ledger. Amendments are never updated in
/// place afterwards; edits are modeled as deactivate + create new.
pub async fn insert(pool: &PgPool, amendment: &Amendment) -> Result<(), CoreError> {
    bounded(
        "insert_amendment",
        sqlx::query(
            "INSERT INTO contract_amendments (id, contract_id, category, kind, amendment_date, \
             is_active, previous_start_date, previous_end_date, new_start_date, new_end_date, \
             previous_value, amendment_value, percentage_applied, index_used, reference_period, \
             description, justification, legal_basis, created_by, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
             $17, $18, $19, $20, $21)",
        )
        .bind(amendment.id)
        .bind(amendment.contract_id)
        .bind(amendment.category)
        .bind(amendment.kind)
        .bind(amendment.amendment_date)
        .bind(amendment.is_active)
        .bind(amendment.previous_start_date)
        .bind(amendment.previous_end_date)
        .bind(amendment.new_start_date)
        .bind(amendment.new_end_date)
        .bind(amendment.previous_value)
        .bind(amendment.amendment_value)
        .bind(amendment.percentage_applied)
        .bind(&amendment.index_used)
        .bind(&amendment.reference_period)
        .bind(&amendment.description)
        .bind(&amendment.justification)
        .bind(&amendment.legal_basis)
        .bind(amendment.created_by)
        .bind(amendment.created_at)
        .bind(amendment.updated_at)
        .execute(pool),
    )
    .await?;
    Ok(())
}

/// All amendments for a contract, active and inactive, newest first
pub async fn list_by_contract(pool: &PgPool, contract_id: Uuid) -> Result<Vec<Amendment>, CoreError> {
    let sql = format!(
        "SELECT {COLUMNS} FROM contract_amendments WHERE contract_id = $1 \
         ORDER BY amendment_date DESC, created_at DESC"
    );
    bounded(
        "list_amendments",
        sqlx::query_as::<_, Amendment>(&sql).bind(contract_id).fetch_all(pool),
    )
    .await
}

/// Sum of `amendment_value` over active value amendments. Commutative:
/// each amendment stores an independent signed delta, so no
/// chronological replay is needed.
pub async fn active_value_delta(pool: &PgPool, contract_id: Uuid) -> Result<Decimal, CoreError> {
    bounded(
        "active_value_delta",
        sqlx::query_scalar(
            "SELECT COALESCE(SUM(amendment_value), 0) FROM contract_amendments \
             WHERE contract_id = $1 AND category = 'value' AND is_active = TRUE",
        )
        .bind(contract_id)
        .fetch_one(pool),
    )
    .await
}

/// Soft delete: flips `is_active` off. Returns the number of rows
/// touched; flipping an already-inactive amendment still touches the
/// row, so the operation is idempotent.
pub async fn deactivate(pool: &PgPool, amendment_id: Uuid) -> Result<u64, CoreError> {
    let result = bounded(
        "deactivate_amendment",
        sqlx::query(
            "UPDATE contract_amendments SET is_active = FALSE, updated_at = NOW() WHERE id = $1",
        )
        .bind(amendment_id)
        .execute(pool),
    )
    .await?;
    Ok(result.rows_affected())
}
