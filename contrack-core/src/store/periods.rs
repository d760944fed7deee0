use chrono::NaiveDate;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::period::Period;
use crate::store::bounded;

const COLUMNS: &str = "id, contract_id, period_number, kind, start_date, end_date, status, \
     available_value, paid_value, remaining_value, execution_percentage, justification, \
     created_at, updated_at";

/// All periods of a contract, ordered by `period_number` ascending.
/// A contract with no bootstrapped periods yields an empty vec, not an
/// error.
pub async fn list_by_contract(pool: &PgPool, contract_id: Uuid) -> Result<Vec<Period>, CoreError> {
    let sql = format!(
        "SELECT {COLUMNS} FROM contract_periods WHERE contract_id = $1 ORDER BY period_number ASC"
    );
    bounded(
        "list_periods",
        sqlx::query_as::<_, Period>(&sql).bind(contract_id).fetch_all(pool),
    )
    .await
}

/// Insert a period outside any transition (bootstrap of Period #1)
pub async fn insert(pool: &PgPool, period: &Period) -> Result<(), CoreError> {
    bounded("insert_period", insert_with(pool, period)).await
}

/// Open a new period, completing the prior one in the same transaction.
/// This is the only place a period flips from `active` to `completed`
/// proactively; the at-most-one-active invariant holds because both
/// writes commit together.
pub async fn open_period(
    pool: &PgPool,
    period: &Period,
    complete_period: Option<Uuid>,
) -> Result<(), CoreError> {
    bounded("open_period", async {
        let mut tx = pool.begin().await?;
        if let Some(previous_id) = complete_period {
            sqlx::query(
                "UPDATE contract_periods SET status = 'completed', updated_at = NOW() \
                 WHERE id = $1",
            )
            .bind(previous_id)
            .execute(&mut *tx)
            .await?;
        }
        insert_with(&mut *tx, period).await?;
        tx.commit().await?;
        Ok(())
    })
    .await
}

/// Shrink a period in place (early termination). Never spawns a period.
pub async fn update_end_date(
    pool: &PgPool,
    period_id: Uuid,
    new_end_date: NaiveDate,
) -> Result<(), CoreError> {
    let result = bounded(
        "update_period_end",
        sqlx::query("UPDATE contract_periods SET end_date = $2, updated_at = NOW() WHERE id = $1")
            .bind(period_id)
            .bind(new_end_date)
            .execute(pool),
    )
    .await?;
    if result.rows_affected() == 0 {
        return Err(CoreError::not_found("period", period_id));
    }
    Ok(())
}

async fn insert_with<'e, E>(executor: E, period: &Period) -> Result<(), sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    sqlx::query(
        "INSERT INTO contract_periods (id, contract_id, period_number, kind, start_date, \
         end_date, status, available_value, paid_value, remaining_value, execution_percentage, \
         justification, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
    )
    .bind(period.id)
    .bind(period.contract_id)
    .bind(period.period_number)
    .bind(period.kind)
    .bind(period.start_date)
    .bind(period.end_date)
    .bind(period.status)
    .bind(period.available_value)
    .bind(period.paid_value)
    .bind(period.remaining_value)
    .bind(period.execution_percentage)
    .bind(&period.justification)
    .bind(period.created_at)
    .bind(period.updated_at)
    .execute(executor)
    .await?;
    Ok(())
}
