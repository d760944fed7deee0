use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::contract::{Contract, CreateContract, UpdateContract};
use crate::store::bounded;

const COLUMNS: &str = "id, cnpj, company_name, contract_number, process_number, nature, object, \
     original_value, original_start_date, original_end_date, created_at, updated_at";

pub async fn get(pool: &PgPool, id: Uuid) -> Result<Contract, CoreError> {
    let sql = format!("SELECT {COLUMNS} FROM contracts WHERE id = $1");
    let contract = bounded(
        "get_contract",
        sqlx::query_as::<_, Contract>(&sql).bind(id).fetch_optional(pool),
    )
    .await?;
    contract.ok_or_else(|| CoreError::not_found("contract", id))
}

pub async fn list(pool: &PgPool) -> Result<Vec<Contract>, CoreError> {
    let sql = format!("SELECT {COLUMNS} FROM contracts ORDER BY created_at DESC");
    bounded(
        "list_contracts",
        sqlx::query_as::<_, Contract>(&sql).fetch_all(pool),
    )
    .await
}

/// Register a contract.
///
/// `contract_number` is the denormalized join key payments reference, so
/// it must be unique; a duplicate is rejected as a validation failure
/// before anything is written.
pub async fn insert(pool: &PgPool, request: CreateContract) -> Result<Contract, CoreError> {
    let duplicate: bool = bounded(
        "check_contract_number",
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM contracts WHERE contract_number = $1)")
            .bind(&request.contract_number)
            .fetch_one(pool),
    )
    .await?;
    if duplicate {
        return Err(CoreError::validation(format!(
            "contract number {} is already registered",
            request.contract_number
        )));
    }

    let now = Utc::now();
    let contract = Contract {
        id: Uuid::new_v4(),
        cnpj: request.cnpj,
        company_name: request.company_name,
        contract_number: request.contract_number,
        process_number: request.process_number,
        nature: request.nature,
        object: request.object,
        original_value: request.original_value,
        original_start_date: request.original_start_date,
        original_end_date: request.original_end_date,
        created_at: now,
        updated_at: now,
    };

    bounded(
        "insert_contract",
        sqlx::query(
            "INSERT INTO contracts (id, cnpj, company_name, contract_number, process_number, \
             nature, object, original_value, original_start_date, original_end_date, \
             created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(contract.id)
        .bind(&contract.cnpj)
        .bind(&contract.company_name)
        .bind(&contract.contract_number)
        .bind(&contract.process_number)
        .bind(&contract.nature)
        .bind(&contract.object)
        .bind(contract.original_value)
        .bind(contract.original_start_date)
        .bind(contract.original_end_date)
        .bind(contract.created_at)
        .bind(contract.updated_at)
        .execute(pool),
    )
    .await?;

    Ok(contract)
}

/// Administrative edit: descriptive fields only. Financial and tenure
/// columns are never touched here.
pub async fn update_administrative(
    pool: &PgPool,
    id: Uuid,
    request: UpdateContract,
) -> Result<Contract, CoreError> {
    let sql = format!(
        "UPDATE contracts SET \
         company_name = COALESCE($2, company_name), \
         nature = COALESCE($3, nature), \
         object = COALESCE($4, object), \
         updated_at = NOW() \
         WHERE id = $1 RETURNING {COLUMNS}"
    );
    let contract = bounded(
        "update_contract",
        sqlx::query_as::<_, Contract>(&sql)
            .bind(id)
            .bind(request.company_name)
            .bind(request.nature)
            .bind(request.object)
            .fetch_optional(pool),
    )
    .await?;
    contract.ok_or_else(|| CoreError::not_found("contract", id))
}
