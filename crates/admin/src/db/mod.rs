//! Product storage for the admin API.
//!
//! # Tables
//!
//! - `products` - Catalog products (images as hosted URLs, properties as JSONB)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/admin/migrations/` and run via:
//! ```bash
//! cargo run -p ecom-cli -- migrate
//! ```
//!
//! Handlers talk to storage through the [`ProductStore`] trait so the
//! router can be exercised against [`MemoryProductStore`] in tests.

pub mod memory;
pub mod products;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use ecom_core::{Product, ProductFields, ProductId, ProductUpdate};

pub use memory::MemoryProductStore;
pub use products::PgProductStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,
}

/// Find/create/update/delete of product records.
///
/// Each mutation is a single atomic write keyed by id; concurrent updates
/// to the same product are last-writer-wins.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Fetch one product.
    async fn find(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Fetch every product, newest first.
    async fn list(&self) -> Result<Vec<Product>, RepositoryError>;

    /// Insert a product and return the stored document.
    async fn create(&self, fields: ProductFields) -> Result<Product, RepositoryError>;

    /// Apply a partial update.
    ///
    /// Returns `RepositoryError::NotFound` if no product has this id.
    async fn update(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<Product, RepositoryError>;

    /// Delete a product. Returns whether a record was removed.
    async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError>;

    /// Cheap connectivity check for readiness probes.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
