//! In-process test host for the todo API.
//!
//! [`TestHost`] serves the real router on a loopback port against a private
//! in-memory database and a freshly generated signing key. [`TestClient`]
//! attaches a bearer token minted for a simulated user to every request.
//!
//! ```no_run
//! use todo_api::testing::TestHost;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let host = TestHost::start().await?;
//! let client = host.client_for("alice", false)?;
//! let response = client.get("/todos").send().await?;
//! assert!(response.status().is_success());
//! host.shutdown().await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod host;

use thiserror::Error;

use crate::auth::AuthError;

pub use client::{BearerAuth, TestClient};
pub use host::TestHost;

#[derive(Debug, Error)]
pub enum TestHostError {
    #[error("database: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("auth: {0}")]
    Auth(#[from] AuthError),
    #[error("http client: {0}")]
    Http(#[from] reqwest::Error),
    #[error("authorization header: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),
    #[error("server task: {0}")]
    Join(#[from] tokio::task::JoinError),
}
