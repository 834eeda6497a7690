//! # folio-link
//!
//! Client library for the folio hosted table backend.
//!
//! Three layers, smallest first:
//!
//! - **Query primitives**: five stateless operations over the backend's
//!   REST surface ([`fetch_all`](FolioClient::fetch_all),
//!   [`fetch_by_id`](FolioClient::fetch_by_id),
//!   [`insert`](FolioClient::insert), [`update`](FolioClient::update) and
//!   [`remove`](FolioClient::remove)). One round trip each; failures keep
//!   the backend's message verbatim and are logged before they propagate.
//! - **Change feeds**: [`FolioClient::subscribe`] opens a per-table
//!   realtime stream ([`ChangeFeed`]) of insert/update/delete events,
//!   released exactly once whether closed explicitly or dropped.
//! - **Data-bound handles**: [`QueryHandle`], [`RecordHandle`],
//!   [`RealtimeHandle`] and [`InsertHandle`] wrap the layers below in
//!   observable `{data, loading, error}` state for UI-shaped consumers.
//!
//! [`FormRelay`] sits beside the backend layers: an outbound contact-form
//! submitter for the third-party relay service.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use folio_link::{FolioClient, OrderBy, QueryOptions};
//!
//! # async fn example() -> folio_link::Result<()> {
//! let client = FolioClient::builder()
//!     .base_url("https://backend.example.com")
//!     .anon_key("public-anon-key")
//!     .build()?;
//!
//! // Stateless primitive: newest projects first (descending is the default
//! // direction when none is given).
//! let options = QueryOptions::new()
//!     .with_order(OrderBy::new("created_at"))
//!     .with_limit(6);
//! let projects = client.fetch_all("projects", &options).await?;
//! println!("{} projects", projects.len());
//!
//! // Live changes for the same table.
//! let mut feed = client.subscribe("projects").await?;
//! if let Some(event) = feed.next().await {
//!     println!("change: {:?}", event?);
//! }
//! feed.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! Configuration can also come from the environment
//! ([`FolioClient::from_env`] reads `BACKEND_URL` and `BACKEND_ANON_KEY`);
//! missing values degrade to a warning, never a crash.

pub mod auth;
pub mod client;
pub mod error;
pub mod feed;
pub mod hooks;
pub mod models;
mod query;
pub mod relay;

pub use auth::Credential;
pub use client::{FolioClient, FolioClientBuilder, ENV_BACKEND_ANON_KEY, ENV_BACKEND_URL};
pub use error::{FolioError, Result};
pub use feed::ChangeFeed;
pub use hooks::{
    InsertHandle, MutationState, QueryHandle, RealtimeHandle, RecordHandle, RequestState,
};
pub use models::{ChangeEvent, OrderBy, QueryOptions, Record};
pub use relay::{ContactMessage, FormRelay, DEFAULT_RELAY_ENDPOINT};
