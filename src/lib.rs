use std::sync::Arc;

use sqlx::SqlitePool;

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod testing;
pub mod utils;

use auth::{AuthError, TokenValidator};
use config::Config;

pub use router::build_router;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<Config>,
    pub validator: Arc<TokenValidator>,
}

impl AppState {
    /// Fails when the bearer settings cannot produce a validator.
    pub fn new(pool: SqlitePool, config: Config) -> Result<Self, AuthError> {
        let validator = TokenValidator::from_config(&config.bearer)?;
        Ok(Self {
            pool,
            config: Arc::new(config),
            validator: Arc::new(validator),
        })
    }
}
