//! Repository layer for book persistence

pub mod books;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{Book, CheckedPatch, LookupKey},
};

pub use books::PgBookStore;
pub use memory::InMemoryBookStore;

/// Persistence adapter for book records.
///
/// Implementations enforce `isbn` uniqueness themselves: a racing duplicate
/// insert must fail with `AppError::DuplicateKey`, never overwrite.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Insert a new record, rejecting a duplicate isbn
    async fn insert(&self, book: &Book) -> AppResult<Book>;

    /// All records in the store's natural order
    async fn list(&self) -> AppResult<Vec<Book>>;

    /// Records matching the key, in natural order
    async fn find(&self, key: &LookupKey) -> AppResult<Vec<Book>>;

    async fn find_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>>;

    /// Apply the patch's fields to the record with the patch's isbn in one
    /// atomic step; fields the patch leaves out keep their stored value.
    /// Returns `None` when no such record exists.
    async fn update(&self, patch: &CheckedPatch) -> AppResult<Option<Book>>;

    /// Returns whether a record was removed
    async fn delete_by_isbn(&self, isbn: &str) -> AppResult<bool>;

    /// Round-trip to the backing store
    async fn ping(&self) -> AppResult<()>;
}

/// Main repository struct holding the book store
#[derive(Clone)]
pub struct Repository {
    pub books: Arc<dyn BookStore>,
}

impl Repository {
    /// Create a PostgreSQL-backed repository with the given pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self::with_store(Arc::new(PgBookStore::new(pool)))
    }

    /// Create a repository that keeps records in process memory
    pub fn in_memory() -> Self {
        Self::with_store(Arc::new(InMemoryBookStore::default()))
    }

    pub fn with_store(books: Arc<dyn BookStore>) -> Self {
        Self { books }
    }
}
