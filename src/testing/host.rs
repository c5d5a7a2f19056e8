use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Once;
use std::time::Duration;

use sqlx::SqlitePool;
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};

use super::{BearerAuth, TestClient, TestHostError};
use crate::{
    AppState,
    auth::{ADMIN_ROLE, TokenDescriptor, TokenIssuer, generate_signing_key},
    build_router,
    config::Config,
    database,
};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

static TRACING: Once = Once::new();

/// A running instance of the API backed by a private in-memory database.
///
/// The database and the signing key exist only for the lifetime of the host.
/// Dropping the host stops the server; [`TestHost::shutdown`] additionally
/// waits for it and closes the database.
pub struct TestHost {
    addr: SocketAddr,
    base_url: String,
    config: Config,
    pool: SqlitePool,
    http: reqwest::Client,
    shutdown: Option<oneshot::Sender<()>>,
    server: Option<JoinHandle<std::io::Result<()>>>,
}

impl TestHost {
    pub async fn start() -> Result<Self, TestHostError> {
        Self::start_with(|_| {}).await
    }

    /// Starts a host after letting the caller adjust the configuration.
    ///
    /// The generated signing key is installed before `configure` runs, so a
    /// test may replace or remove it. The database URL is always replaced by
    /// the in-memory database.
    pub async fn start_with<F>(configure: F) -> Result<Self, TestHostError>
    where
        F: FnOnce(&mut Config),
    {
        init_tracing();

        let pool = database::connect_in_memory().await?;
        database::migrate(&pool).await?;

        let mut config = Config::for_testing();
        config.bearer.signing_key = Some(generate_signing_key());
        configure(&mut config);
        config.database_url = "sqlite::memory:".into();

        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await?;
        let addr = listener.local_addr()?;
        config.server_port = addr.port();
        let base_url = format!("http://{addr}{}", config.api_prefix());

        let state = AppState::new(pool.clone(), config.clone())?;
        let app = build_router(state);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        tracing::debug!(%base_url, "test host started");

        Ok(Self {
            addr,
            base_url,
            config,
            pool,
            http,
            shutdown: Some(shutdown_tx),
            server: Some(server),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The database the server is using, for seeding and inspection.
    pub fn db(&self) -> &SqlitePool {
        &self.pool
    }

    /// A client that sends no credentials.
    pub fn client(&self) -> TestClient {
        TestClient::new(self.http.clone(), self.base_url.clone(), None)
    }

    /// A client authenticated as `user_id`, carrying the admin role when
    /// `is_admin` is set.
    pub fn client_for(&self, user_id: &str, is_admin: bool) -> Result<TestClient, TestHostError> {
        let mut descriptor = TokenDescriptor::new(user_id);
        if is_admin {
            descriptor = descriptor.role(ADMIN_ROLE);
        }
        self.client_with(descriptor)
    }

    pub fn client_with(&self, descriptor: TokenDescriptor) -> Result<TestClient, TestHostError> {
        let scheme = descriptor.scheme.clone();
        let token = self.issue_token(descriptor)?;
        let auth = BearerAuth::new(&scheme, token)?;
        Ok(TestClient::new(
            self.http.clone(),
            self.base_url.clone(),
            Some(auth),
        ))
    }

    /// Signs a token with the host's current bearer configuration.
    pub fn issue_token(&self, descriptor: TokenDescriptor) -> Result<String, TestHostError> {
        let issuer = TokenIssuer::from_config(&self.config.bearer)?;
        Ok(issuer.issue(descriptor)?)
    }

    pub async fn shutdown(mut self) -> Result<(), TestHostError> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }

        if let Some(mut server) = self.server.take() {
            match tokio::time::timeout(SHUTDOWN_GRACE, &mut server).await {
                Ok(joined) => joined??,
                Err(_) => {
                    tracing::warn!(addr = %self.addr, "test server did not stop in time, aborting");
                    server.abort();
                }
            }
        }

        self.pool.close().await;
        tracing::debug!(addr = %self.addr, "test host stopped");
        Ok(())
    }
}

impl Drop for TestHost {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

fn init_tracing() {
    TRACING.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
