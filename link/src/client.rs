//! Backend client with builder pattern.
//!
//! The primary handle for the hosted table backend: query primitives,
//! change-feed subscriptions, and the configuration they share.

use crate::{
    auth::Credential,
    error::{FolioError, Result},
    feed::ChangeFeed,
    models::{QueryOptions, Record},
    query::TableExecutor,
};
use std::time::Duration;

/// Environment variable naming the backend's project URL.
pub const ENV_BACKEND_URL: &str = "BACKEND_URL";
/// Environment variable naming the backend's publishable anon key.
pub const ENV_BACKEND_ANON_KEY: &str = "BACKEND_ANON_KEY";

/// Client handle for the hosted table backend.
///
/// Cheap to clone: all configuration is fixed at construction, so clones
/// can be handed to every handle and task that needs one without
/// synchronization. There is no shared cache; concurrent consumers of the
/// same table issue independent requests.
///
/// # Examples
///
/// ```rust,no_run
/// use folio_link::{FolioClient, QueryOptions};
///
/// # async fn example() -> folio_link::Result<()> {
/// let client = FolioClient::builder()
///     .base_url("https://backend.example.com")
///     .anon_key("public-anon-key")
///     .build()?;
///
/// let projects = client.fetch_all("projects", &QueryOptions::new()).await?;
/// println!("{} projects", projects.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct FolioClient {
    base_url: String,
    credential: Credential,
    executor: TableExecutor,
}

impl FolioClient {
    /// Create a new builder for configuring the client
    pub fn builder() -> FolioClientBuilder {
        FolioClientBuilder::new()
    }

    /// Build a client from `BACKEND_URL` and `BACKEND_ANON_KEY`.
    ///
    /// Missing or empty variables are reported with a warning and replaced
    /// with empty strings: construction still succeeds, and requests then
    /// fail with the backend's own errors. A half-configured environment
    /// degrades instead of crashing at startup.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var(ENV_BACKEND_URL).unwrap_or_default();
        let anon_key = std::env::var(ENV_BACKEND_ANON_KEY).unwrap_or_default();
        if base_url.is_empty() || anon_key.is_empty() {
            log::warn!(
                "[CLIENT] Backend environment configuration is incomplete; requests will fail until {} and {} are set",
                ENV_BACKEND_URL,
                ENV_BACKEND_ANON_KEY
            );
        }
        Self::builder().base_url(base_url).anon_key(anon_key).build()
    }

    /// Fetch rows from `table`, shaped by `options`.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use folio_link::{FolioClient, OrderBy, QueryOptions};
    ///
    /// # async fn example() -> folio_link::Result<()> {
    /// # let client = FolioClient::builder().base_url("https://backend.example.com").build()?;
    /// let options = QueryOptions::new()
    ///     .with_order(OrderBy::new("created_at"))
    ///     .with_limit(10);
    /// let posts = client.fetch_all("blog_posts", &options).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn fetch_all(&self, table: &str, options: &QueryOptions) -> Result<Vec<Record>> {
        self.executor.fetch_all(table, options).await
    }

    /// Fetch the single row of `table` with id `id`.
    ///
    /// Exactly one row must match: zero rows is
    /// [`RowNotFound`](FolioError::RowNotFound), more than one is
    /// [`RowConflict`](FolioError::RowConflict).
    pub async fn fetch_by_id(&self, table: &str, id: &str) -> Result<Record> {
        self.executor.fetch_by_id(table, id).await
    }

    /// Insert `record` into `table` and return the stored row, server-side
    /// defaults included.
    pub async fn insert(&self, table: &str, record: &Record) -> Result<Record> {
        self.executor.insert(table, record).await
    }

    /// Apply `changes` to the row of `table` with id `id` and return the
    /// updated row. The single-row contract of [`fetch_by_id`](Self::fetch_by_id)
    /// applies.
    pub async fn update(&self, table: &str, id: &str, changes: &Record) -> Result<Record> {
        self.executor.update(table, id, changes).await
    }

    /// Delete the row of `table` with id `id`. Success carries no payload.
    pub async fn remove(&self, table: &str, id: &str) -> Result<bool> {
        self.executor.remove(table, id).await
    }

    /// Open a change feed on `table`.
    ///
    /// The feed is live until closed or dropped; there is no automatic
    /// reconnect.
    pub async fn subscribe(&self, table: &str) -> Result<ChangeFeed> {
        ChangeFeed::connect(&self.base_url, table, &self.credential).await
    }

    /// The configured project URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The configured credential.
    pub fn credential(&self) -> &Credential {
        &self.credential
    }
}

/// Builder for [`FolioClient`] instances.
pub struct FolioClientBuilder {
    base_url: Option<String>,
    credential: Credential,
    timeout: Duration,
    connect_timeout: Duration,
}

impl FolioClientBuilder {
    fn new() -> Self {
        Self {
            base_url: None,
            credential: Credential::none(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }

    /// Set the backend project URL (e.g. `https://backend.example.com`).
    ///
    /// Required, but may be empty: an explicitly empty URL builds a client
    /// whose requests fail with transport errors, mirroring the degraded
    /// construction of [`FolioClient::from_env`].
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the publishable anon key.
    pub fn anon_key(mut self, key: impl Into<String>) -> Self {
        self.credential = Credential::anon_key(key);
        self
    }

    /// Set the credential directly.
    pub fn credential(mut self, credential: Credential) -> Self {
        self.credential = credential;
        self
    }

    /// Set the whole-request timeout (default: 30 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the connection timeout for TCP + TLS handshake (default: 10 seconds).
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Build the client
    pub fn build(self) -> Result<FolioClient> {
        let base_url = self
            .base_url
            .ok_or_else(|| FolioError::Configuration("base_url is required".into()))?;
        let base_url = base_url.trim_end_matches('/').to_string();

        // Pooled keep-alive connections; the handles fire many small
        // requests against the same host.
        let http_client = reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| FolioError::Configuration(e.to_string()))?;

        let executor = TableExecutor::new(
            base_url.clone(),
            http_client,
            self.credential.clone(),
        );

        Ok(FolioClient {
            base_url,
            credential: self.credential,
            executor,
        })
    }
}
