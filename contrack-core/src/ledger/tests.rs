use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::ledger::history::summarize;
use crate::models::amendment::{Amendment, AmendmentCategory, AmendmentKind};
use crate::models::contract::Contract;

fn contract(original_value: i64) -> Contract {
    let now = Utc::now();
    Contract {
        id: Uuid::new_v4(),
        cnpj: "01.234.567/0001-89".to_string(),
        company_name: "Hospital das Clínicas".to_string(),
        contract_number: "120/SESAU/2023".to_string(),
        process_number: "0012.345678/2023-11".to_string(),
        nature: None,
        object: None,
        original_value: Decimal::from(original_value),
        original_start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        original_end_date: NaiveDate::from_ymd_opt(2024, 12, 31),
        created_at: now,
        updated_at: now,
    }
}

fn value_amendment(contract_id: Uuid, kind: AmendmentKind, delta: i64) -> Amendment {
    let now = Utc::now();
    Amendment {
        id: Uuid::new_v4(),
        contract_id,
        category: AmendmentCategory::Value,
        kind,
        amendment_date: now,
        is_active: true,
        previous_start_date: None,
        previous_end_date: None,
        new_start_date: None,
        new_end_date: None,
        previous_value: None,
        amendment_value: Some(Decimal::from(delta)),
        percentage_applied: None,
        index_used: None,
        reference_period: None,
        description: None,
        justification: "test".to_string(),
        legal_basis: None,
        created_by: Uuid::new_v4(),
        created_at: now,
        updated_at: now,
    }
}

fn tenure_amendment(contract_id: Uuid, kind: AmendmentKind) -> Amendment {
    let mut amendment = value_amendment(contract_id, kind, 0);
    amendment.category = AmendmentCategory::Tenure;
    amendment.amendment_value = None;
    amendment.new_start_date = NaiveDate::from_ymd_opt(2025, 1, 1);
    amendment.new_end_date = NaiveDate::from_ymd_opt(2025, 12, 31);
    amendment
}

#[test]
fn test_addition_raises_effective_value() {
    let contract = contract(100_000);
    let amendments = vec![value_amendment(contract.id, AmendmentKind::Addition, 15_000)];

    let summary = summarize(&contract, &amendments);
    assert_eq!(summary.total_amendments_value, Decimal::from(15_000));
    assert_eq!(summary.current_value, Decimal::from(115_000));
    assert_eq!(summary.total_value_amendments, 1);
    assert_eq!(summary.total_tenure_amendments, 0);
}

#[test]
fn test_suppression_lowers_effective_value() {
    let contract = contract(100_000);
    let amendments = vec![
        value_amendment(contract.id, AmendmentKind::Addition, 15_000),
        value_amendment(contract.id, AmendmentKind::Suppression, -5_000),
    ];

    let summary = summarize(&contract, &amendments);
    assert_eq!(summary.total_amendments_value, Decimal::from(10_000));
    assert_eq!(summary.current_value, Decimal::from(110_000));
}

#[test]
fn test_delta_is_order_independent() {
    let contract = contract(100_000);
    let a = value_amendment(contract.id, AmendmentKind::Addition, 15_000);
    let b = value_amendment(contract.id, AmendmentKind::Suppression, -5_000);
    let c = value_amendment(contract.id, AmendmentKind::Readjustment, 2_500);

    let forward = summarize(&contract, &[a.clone(), b.clone(), c.clone()]);
    let reversed = summarize(&contract, &[c, b, a]);
    assert_eq!(forward.total_amendments_value, reversed.total_amendments_value);
    assert_eq!(forward.current_value, reversed.current_value);
}

#[test]
fn test_deactivated_amendment_is_excluded_from_delta_but_counted() {
    let contract = contract(100_000);
    let mut addition = value_amendment(contract.id, AmendmentKind::Addition, 15_000);
    let suppression = value_amendment(contract.id, AmendmentKind::Suppression, -5_000);
    addition.is_active = false;

    let summary = summarize(&contract, &[addition, suppression]);
    // Only the suppression remains active.
    assert_eq!(summary.total_amendments_value, Decimal::from(-5_000));
    assert_eq!(summary.current_value, Decimal::from(95_000));
    assert_eq!(summary.total_value_amendments, 2);
}

#[test]
fn test_tenure_amendments_never_contribute_to_the_delta() {
    let contract = contract(100_000);
    let amendments = vec![
        tenure_amendment(contract.id, AmendmentKind::Extension),
        tenure_amendment(contract.id, AmendmentKind::EarlyTermination),
        value_amendment(contract.id, AmendmentKind::Renegotiation, 7_000),
    ];

    let summary = summarize(&contract, &amendments);
    assert_eq!(summary.total_amendments_value, Decimal::from(7_000));
    assert_eq!(summary.total_tenure_amendments, 2);
    assert_eq!(summary.total_value_amendments, 1);
}

#[test]
fn test_empty_history_keeps_the_baseline() {
    let contract = contract(100_000);
    let summary = summarize(&contract, &[]);
    assert_eq!(summary.total_amendments_value, Decimal::ZERO);
    assert_eq!(summary.current_value, Decimal::from(100_000));
}

/// Test helper to create a test database pool.
///
/// Requires `DATABASE_URL` pointing at a migrated test database.
async fn create_test_pool() -> Result<PgPool, anyhow::Error> {
    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL not set for tests"))?;
    let pool = PgPool::connect(&database_url).await?;
    Ok(pool)
}

async fn register_contract(pool: &PgPool, original_value: i64) -> Contract {
    use crate::models::contract::CreateContract;

    let request = CreateContract {
        cnpj: "01.234.567/0001-89".to_string(),
        company_name: "Hospital das Clínicas".to_string(),
        contract_number: format!("{}/SESAU/2024", Uuid::new_v4()),
        process_number: "0012.345678/2023-11".to_string(),
        nature: None,
        object: None,
        original_value: Decimal::from(original_value),
        original_start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        original_end_date: NaiveDate::from_ymd_opt(2024, 12, 31),
    };
    let contract = crate::store::contracts::insert(pool, request)
        .await
        .expect("contract should insert");
    crate::periods::bootstrap_period(pool, &contract)
        .await
        .expect("period should bootstrap");
    contract
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_extension_completes_prior_period_and_opens_next() {
    use crate::models::amendment::{TenureAmendmentForm, TenureKind};
    use crate::models::period::{PeriodKind, PeriodStatus};

    let pool = create_test_pool().await.expect("Failed to create test pool");
    let contract = register_contract(&pool, 100_000).await;

    crate::ledger::record_value_amendment(
        &pool,
        contract.id,
        crate::models::amendment::ValueAmendmentForm {
            kind: crate::models::amendment::ValueKind::Addition,
            amendment_value: Decimal::from(15_000),
            percentage_applied: None,
            index_used: None,
            reference_period: None,
            description: None,
            justification: "quantitative addition".to_string(),
            legal_basis: None,
        },
        Uuid::new_v4(),
    )
    .await
    .expect("value amendment should record");

    crate::ledger::record_tenure_amendment(
        &pool,
        contract.id,
        TenureAmendmentForm {
            kind: TenureKind::Extension,
            new_start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            new_end_date: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
            justification: "service continuity".to_string(),
            legal_basis: None,
        },
        Uuid::new_v4(),
    )
    .await
    .expect("tenure amendment should record");

    let periods = crate::store::periods::list_by_contract(&pool, contract.id)
        .await
        .expect("periods should load");
    assert_eq!(periods.len(), 2);
    assert_eq!(periods[0].status, PeriodStatus::Completed);
    assert_eq!(periods[1].status, PeriodStatus::Active);
    assert_eq!(periods[1].kind, PeriodKind::Extension);
    assert_eq!(periods[1].period_number, 2);
    // The new period inherits the full effective value at extension time.
    assert_eq!(periods[1].available_value, Decimal::from(115_000));
    assert_eq!(
        periods.iter().filter(|p| p.status == PeriodStatus::Active).count(),
        1
    );
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_early_termination_shrinks_without_spawning_a_period() {
    use crate::models::amendment::{TenureAmendmentForm, TenureKind};

    let pool = create_test_pool().await.expect("Failed to create test pool");
    let contract = register_contract(&pool, 100_000).await;
    let new_end = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();

    crate::ledger::record_tenure_amendment(
        &pool,
        contract.id,
        TenureAmendmentForm {
            kind: TenureKind::EarlyTermination,
            new_start_date: contract.original_start_date,
            new_end_date: new_end,
            justification: "mutual agreement".to_string(),
            legal_basis: None,
        },
        Uuid::new_v4(),
    )
    .await
    .expect("tenure amendment should record");

    let periods = crate::store::periods::list_by_contract(&pool, contract.id)
        .await
        .expect("periods should load");
    assert_eq!(periods.len(), 1);
    assert_eq!(periods[0].end_date, new_end);
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_projection_round_trips_the_extended_end_date() {
    use crate::models::amendment::{TenureAmendmentForm, TenureKind};

    let pool = create_test_pool().await.expect("Failed to create test pool");
    let contract = register_contract(&pool, 100_000).await;
    let new_end = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();

    crate::ledger::record_tenure_amendment(
        &pool,
        contract.id,
        TenureAmendmentForm {
            kind: TenureKind::Extension,
            new_start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            new_end_date: new_end,
            justification: "service continuity".to_string(),
            legal_basis: None,
        },
        Uuid::new_v4(),
    )
    .await
    .expect("tenure amendment should record");

    let info = crate::projection::contract_with_current_info(&pool, contract.id)
        .await
        .expect("projection should build");
    assert_eq!(info.current_end_date, new_end);
    assert_eq!(info.total_amendments, 1);
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_deactivation_is_idempotent_and_monotonic() {
    let pool = create_test_pool().await.expect("Failed to create test pool");
    let contract = register_contract(&pool, 100_000).await;

    let amendment = crate::ledger::record_value_amendment(
        &pool,
        contract.id,
        crate::models::amendment::ValueAmendmentForm {
            kind: crate::models::amendment::ValueKind::Addition,
            amendment_value: Decimal::from(15_000),
            percentage_applied: None,
            index_used: None,
            reference_period: None,
            description: None,
            justification: "quantitative addition".to_string(),
            legal_basis: None,
        },
        Uuid::new_v4(),
    )
    .await
    .expect("value amendment should record");

    crate::ledger::deactivate_amendment(&pool, amendment.id)
        .await
        .expect("deactivation should succeed");
    // Second deactivation is a no-op, not an error.
    crate::ledger::deactivate_amendment(&pool, amendment.id)
        .await
        .expect("repeat deactivation should succeed");

    let delta = crate::ledger::active_value_delta(&pool, contract.id)
        .await
        .expect("delta should load");
    assert_eq!(delta, Decimal::ZERO);
}
