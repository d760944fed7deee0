use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::CoreError;
use crate::ledger;
use crate::models::amendment::{
    Amendment, AmendmentsHistory, TenureAmendmentForm, ValueAmendmentForm,
};
use crate::models::contract::{Contract, ContractWithCurrentInfo, CreateContract, UpdateContract};
use crate::models::payment::{
    CreatePaymentRecord, FundingSource, NewPaymentEntry, PaymentEntry, PaymentRecord,
};
use crate::models::period::{PeriodStatistics, PeriodSummary};
use crate::payments::aggregate::DashboardSummary;
use crate::payments::{bank_order_ledger, BankOrderLine, SortOrder};
use crate::periods;
use crate::projection;
use crate::store;
use crate::AppState;

/// Health check endpoint.
///
/// Returns a simple JSON response indicating the server is running.
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "contrack-core",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Database health check endpoint.
///
/// Verifies that the database connection is working by executing
/// a simple query.
async fn db_health_check(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    sqlx::query("SELECT 1").execute(&state.db).await.map_err(|e| {
        error!("Database health check failed: {}", e);
        StatusCode::SERVICE_UNAVAILABLE
    })?;

    Ok(Json(serde_json::json!({
        "status": "ok",
        "database": "connected"
    })))
}

fn reject(operation: &str, err: CoreError) -> StatusCode {
    error!("{} failed: {}", operation, err);
    err.status_code()
}

/// Contract registration endpoint.
///
/// Registers the contract and bootstraps its original vigência period.
/// A period bootstrap failure is logged but does not fail the
/// registration: read paths fall back to contract-level dates until an
/// extension re-opens period tracking.
async fn create_contract(
    State(state): State<AppState>,
    Json(request): Json<CreateContract>,
) -> Result<(StatusCode, Json<Contract>), StatusCode> {
    let contract = store::contracts::insert(&state.db, request)
        .await
        .map_err(|e| reject("contract registration", e))?;

    if let Err(e) = periods::bootstrap_period(&state.db, &contract).await {
        warn!(contract_id = %contract.id, error = %e, "original period bootstrap failed");
    }

    info!(contract_id = %contract.id, contract_number = %contract.contract_number, "contract registered");
    Ok((StatusCode::CREATED, Json(contract)))
}

/// Contract listing endpoint: every contract with its reconstructed
/// current state.
async fn list_contracts(
    State(state): State<AppState>,
) -> Result<Json<Vec<ContractWithCurrentInfo>>, StatusCode> {
    let overview = projection::contracts_overview(&state.db)
        .await
        .map_err(|e| reject("contract listing", e))?;
    Ok(Json(overview))
}

/// Single contract endpoint: the reconstructed current state.
async fn contract_info(
    State(state): State<AppState>,
    Path(contract_id): Path<Uuid>,
) -> Result<Json<ContractWithCurrentInfo>, StatusCode> {
    let info = projection::contract_with_current_info(&state.db, contract_id)
        .await
        .map_err(|e| reject("contract lookup", e))?;
    Ok(Json(info))
}

/// Administrative contract edit endpoint (descriptive fields only).
async fn update_contract(
    State(state): State<AppState>,
    Path(contract_id): Path<Uuid>,
    Json(request): Json<UpdateContract>,
) -> Result<Json<Contract>, StatusCode> {
    let contract = store::contracts::update_administrative(&state.db, contract_id, request)
        .await
        .map_err(|e| reject("contract update", e))?;
    Ok(Json(contract))
}

/// Amendment history endpoint: full ledger plus summary, newest first.
async fn amendments_history(
    State(state): State<AppState>,
    Path(contract_id): Path<Uuid>,
) -> Result<Json<AmendmentsHistory>, StatusCode> {
    let history = ledger::amendments_history(&state.db, contract_id)
        .await
        .map_err(|e| reject("amendment history", e))?;
    Ok(Json(history))
}

/// Tenure amendment submission.
#[derive(Debug, Deserialize)]
struct CreateTenureAmendment {
    created_by: Uuid,
    #[serde(flatten)]
    form: TenureAmendmentForm,
}

async fn create_tenure_amendment(
    State(state): State<AppState>,
    Path(contract_id): Path<Uuid>,
    Json(request): Json<CreateTenureAmendment>,
) -> Result<(StatusCode, Json<Amendment>), StatusCode> {
    let amendment =
        ledger::record_tenure_amendment(&state.db, contract_id, request.form, request.created_by)
            .await
            .map_err(|e| reject("tenure amendment", e))?;
    Ok((StatusCode::CREATED, Json(amendment)))
}

/// Value amendment submission.
#[derive(Debug, Deserialize)]
struct CreateValueAmendment {
    created_by: Uuid,
    #[serde(flatten)]
    form: ValueAmendmentForm,
}

async fn create_value_amendment(
    State(state): State<AppState>,
    Path(contract_id): Path<Uuid>,
    Json(request): Json<CreateValueAmendment>,
) -> Result<(StatusCode, Json<Amendment>), StatusCode> {
    let amendment =
        ledger::record_value_amendment(&state.db, contract_id, request.form, request.created_by)
            .await
            .map_err(|e| reject("value amendment", e))?;
    Ok((StatusCode::CREATED, Json(amendment)))
}

/// Amendment deactivation endpoint: the only supported "delete".
async fn deactivate_amendment(
    State(state): State<AppState>,
    Path(amendment_id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    ledger::deactivate_amendment(&state.db, amendment_id)
        .await
        .map_err(|e| reject("amendment deactivation", e))?;
    Ok(StatusCode::NO_CONTENT)
}

/// Period listing endpoint with freshly computed execution figures.
async fn contract_periods(
    State(state): State<AppState>,
    Path(contract_id): Path<Uuid>,
) -> Result<Json<Vec<PeriodSummary>>, StatusCode> {
    let summaries = periods::periods_summary(&state.db, contract_id)
        .await
        .map_err(|e| reject("period listing", e))?;
    Ok(Json(summaries))
}

/// Period statistics endpoint: execution aggregated over every period.
async fn contract_period_statistics(
    State(state): State<AppState>,
    Path(contract_id): Path<Uuid>,
) -> Result<Json<PeriodStatistics>, StatusCode> {
    let summaries = periods::periods_summary(&state.db, contract_id)
        .await
        .map_err(|e| reject("period statistics", e))?;
    Ok(Json(periods::period_statistics(&summaries)))
}

/// Payment listing endpoint for one contract, joined by contract number.
async fn contract_payments(
    State(state): State<AppState>,
    Path(contract_id): Path<Uuid>,
) -> Result<Json<Vec<PaymentRecord>>, StatusCode> {
    let contract = store::contracts::get(&state.db, contract_id)
        .await
        .map_err(|e| reject("payment listing", e))?;
    let payments = store::payments::by_contract_number(&state.db, &contract.contract_number)
        .await
        .map_err(|e| reject("payment listing", e))?;
    Ok(Json(payments))
}

/// Payment registration endpoint.
async fn create_payment(
    State(state): State<AppState>,
    Json(request): Json<CreatePaymentRecord>,
) -> Result<(StatusCode, Json<PaymentRecord>), StatusCode> {
    let record = store::payments::insert(&state.db, request)
        .await
        .map_err(|e| reject("payment registration", e))?;
    info!(payment_id = %record.id, contract_number = %record.contract_number, "payment registered");
    Ok((StatusCode::CREATED, Json(record)))
}

/// Bank order appended to an existing payment record.
#[derive(Debug, Deserialize)]
struct AppendEntryRequest {
    source: FundingSource,
    #[serde(flatten)]
    entry: NewPaymentEntry,
}

async fn append_payment_entry(
    State(state): State<AppState>,
    Path(payment_id): Path<Uuid>,
    Json(request): Json<AppendEntryRequest>,
) -> Result<(StatusCode, Json<PaymentEntry>), StatusCode> {
    let entry = store::payments::append_entry(&state.db, payment_id, request.source, request.entry)
        .await
        .map_err(|e| reject("payment entry", e))?;
    Ok((StatusCode::CREATED, Json(entry)))
}

#[derive(Debug, Deserialize)]
struct BankOrderQuery {
    #[serde(default)]
    order: SortOrder,
}

/// Bank-order ledger endpoint: every bank order of a contract flattened
/// and chronologically sorted.
async fn contract_bank_orders(
    State(state): State<AppState>,
    Path(contract_id): Path<Uuid>,
    Query(query): Query<BankOrderQuery>,
) -> Result<Json<Vec<BankOrderLine>>, StatusCode> {
    let contract = store::contracts::get(&state.db, contract_id)
        .await
        .map_err(|e| reject("bank order ledger", e))?;
    let payments = store::payments::by_contract_number(&state.db, &contract.contract_number)
        .await
        .map_err(|e| reject("bank order ledger", e))?;
    Ok(Json(bank_order_ledger(&payments, query.order)))
}

/// Dashboard endpoint: execution overview against the effective value.
async fn contract_dashboard(
    State(state): State<AppState>,
    Path(contract_id): Path<Uuid>,
) -> Result<Json<DashboardSummary>, StatusCode> {
    let contract = store::contracts::get(&state.db, contract_id)
        .await
        .map_err(|e| reject("dashboard", e))?;
    let delta = ledger::active_value_delta(&state.db, contract_id)
        .await
        .map_err(|e| reject("dashboard", e))?;
    let payments = store::payments::by_contract_number(&state.db, &contract.contract_number)
        .await
        .map_err(|e| reject("dashboard", e))?;
    Ok(Json(crate::payments::dashboard_summary(
        contract.original_value + delta,
        &payments,
    )))
}

/// Creates the main application router.
///
/// Sets up all routes and middleware for the Contrack API.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/db", get(db_health_check))
        .route("/api/contracts", get(list_contracts).post(create_contract))
        .route(
            "/api/contracts/:id",
            get(contract_info).patch(update_contract),
        )
        .route(
            "/api/contracts/:id/amendments",
            get(amendments_history),
        )
        .route(
            "/api/contracts/:id/amendments/tenure",
            post(create_tenure_amendment),
        )
        .route(
            "/api/contracts/:id/amendments/value",
            post(create_value_amendment),
        )
        .route(
            "/api/amendments/:id",
            axum::routing::delete(deactivate_amendment),
        )
        .route("/api/contracts/:id/periods", get(contract_periods))
        .route(
            "/api/contracts/:id/periods/statistics",
            get(contract_period_statistics),
        )
        .route("/api/contracts/:id/payments", get(contract_payments))
        .route("/api/payments", post(create_payment))
        .route("/api/payments/:id/entries", post(append_payment_entry))
        .route("/api/contracts/:id/bank-orders", get(contract_bank_orders))
        .route("/api/contracts/:id/dashboard", get(contract_dashboard))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
