//! In-memory book store, kept in insertion order.
//!
//! Each operation holds the lock for its whole read-check-write, so a duplicate
//! insert racing another insert is rejected just like the database constraint would.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::BookStore;
use crate::{
    error::{AppError, AppResult},
    models::{Book, CheckedPatch, LookupKey},
};

#[derive(Default)]
pub struct InMemoryBookStore {
    books: RwLock<Vec<Book>>,
}

#[async_trait]
impl BookStore for InMemoryBookStore {
    async fn insert(&self, book: &Book) -> AppResult<Book> {
        let mut books = self.books.write().await;
        if books.iter().any(|b| b.isbn == book.isbn) {
            return Err(AppError::DuplicateKey {
                isbn: book.isbn.clone(),
            });
        }
        books.push(book.clone());
        Ok(book.clone())
    }

    async fn list(&self) -> AppResult<Vec<Book>> {
        Ok(self.books.read().await.clone())
    }

    async fn find(&self, key: &LookupKey) -> AppResult<Vec<Book>> {
        let books = self.books.read().await;
        Ok(books.iter().filter(|b| key.matches(b)).cloned().collect())
    }

    async fn find_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>> {
        let books = self.books.read().await;
        Ok(books.iter().find(|b| b.isbn == isbn).cloned())
    }

    async fn update(&self, patch: &CheckedPatch) -> AppResult<Option<Book>> {
        let mut books = self.books.write().await;
        Ok(books.iter_mut().find(|b| b.isbn == patch.isbn).map(|stored| {
            patch.apply_to(stored);
            stored.clone()
        }))
    }

    async fn delete_by_isbn(&self, isbn: &str) -> AppResult<bool> {
        let mut books = self.books.write().await;
        match books.iter().position(|b| b.isbn == isbn) {
            Some(idx) => {
                books.remove(idx);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
