pub mod db;
pub mod error;
pub mod ledger;
pub mod models;
pub mod payments;
pub mod periods;
pub mod projection;
pub mod routes;
pub mod store;

use sqlx::PgPool;

/// Application state containing shared resources.
///
/// Holds the database connection pool shared by every route handler.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub db: PgPool,
}
