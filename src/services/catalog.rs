//! Catalog management service

use crate::{
    error::{AppError, AppResult},
    models::{Book, BookPatch, LookupKey, NewBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Validate and insert a new book. A duplicate isbn is reported by the store.
    pub async fn create_book(&self, candidate: NewBook) -> AppResult<Book> {
        let book = candidate.into_book()?;

        match self.repository.books.insert(&book).await {
            Ok(created) => {
                tracing::info!("Catalog create: isbn={} title={:?}", created.isbn, created.title);
                Ok(created)
            }
            Err(e @ AppError::DuplicateKey { .. }) => {
                tracing::warn!("Catalog create: isbn={} already exists", book.isbn);
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Every book, unpaginated
    pub async fn list_books(&self) -> AppResult<Vec<Book>> {
        self.repository.books.list().await
    }

    /// Books whose isbn and/or title equal the key
    pub async fn find_books(&self, key: &LookupKey) -> AppResult<Vec<Book>> {
        let books = self.repository.books.find(key).await?;
        if books.is_empty() {
            return Err(AppError::NotFound("Book not found".to_string()));
        }
        Ok(books)
    }

    /// Sparse update of the book identified by `patch.isbn`.
    /// The store applies the supplied fields in one step; omitted fields keep
    /// whatever value is stored at that moment.
    pub async fn update_book(&self, patch: BookPatch) -> AppResult<Book> {
        let patch = patch.check()?;
        let not_found = || AppError::NotFound("Book not found".to_string());

        if patch.is_empty() {
            tracing::debug!("Catalog update: isbn={} nothing to change", patch.isbn);
            return self.repository.books.find_by_isbn(&patch.isbn).await?.ok_or_else(not_found);
        }

        let updated = self.repository.books.update(&patch).await?.ok_or_else(not_found)?;
        tracing::info!("Catalog update: isbn={}", patch.isbn);
        Ok(updated)
    }

    /// Delete the single book matching the key.
    /// A key matching several books is refused rather than picking one.
    pub async fn delete_book(&self, key: &LookupKey) -> AppResult<Book> {
        let mut matches = self.repository.books.find(key).await?;

        let target = match matches.len() {
            0 => return Err(AppError::NotFound("Book not found".to_string())),
            1 => matches.remove(0),
            n => {
                tracing::warn!("Catalog delete: key {:?} matches {} books, refusing", key.value(), n);
                return Err(AppError::AmbiguousKey {
                    key: key.value().to_string(),
                    matches: n,
                });
            }
        };

        if !self.repository.books.delete_by_isbn(&target.isbn).await? {
            return Err(AppError::NotFound("Book not found".to_string()));
        }

        tracing::info!("Catalog delete: isbn={}", target.isbn);
        Ok(target)
    }

    /// Check the book store is reachable
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.books.ping().await
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::{
        models::{CheckedPatch, Genre, KeyField},
        repository::{BookStore, InMemoryBookStore, MockBookStore},
    };

    /// In-memory store whose reads and writes yield for a while first,
    /// so overlapping requests interleave.
    #[derive(Default)]
    struct SlowStore {
        inner: InMemoryBookStore,
    }

    impl SlowStore {
        async fn pause() {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    #[async_trait]
    impl BookStore for SlowStore {
        async fn insert(&self, book: &Book) -> AppResult<Book> {
            self.inner.insert(book).await
        }

        async fn list(&self) -> AppResult<Vec<Book>> {
            self.inner.list().await
        }

        async fn find(&self, key: &LookupKey) -> AppResult<Vec<Book>> {
            self.inner.find(key).await
        }

        async fn find_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>> {
            Self::pause().await;
            self.inner.find_by_isbn(isbn).await
        }

        async fn update(&self, patch: &CheckedPatch) -> AppResult<Option<Book>> {
            Self::pause().await;
            self.inner.update(patch).await
        }

        async fn delete_by_isbn(&self, isbn: &str) -> AppResult<bool> {
            self.inner.delete_by_isbn(isbn).await
        }

        async fn ping(&self) -> AppResult<()> {
            self.inner.ping().await
        }
    }

    fn service() -> CatalogService {
        CatalogService::new(Repository::in_memory())
    }

    fn new_book(title: &str, isbn: &str) -> NewBook {
        serde_json::from_value(json!({
            "title": title,
            "author": "Frank Herbert",
            "isbn": isbn,
            "publicationYear": "1965",
            "genre": "Science Fiction"
        }))
        .unwrap()
    }

    fn any(key: &str) -> LookupKey {
        LookupKey::new(key, KeyField::Any)
    }

    #[tokio::test]
    async fn test_create_then_find_returns_input() {
        let svc = service();
        let created = svc.create_book(new_book("Dune", "9780441013593")).await.unwrap();

        let found = svc.find_books(&any("9780441013593")).await.unwrap();
        assert_eq!(found, vec![created.clone()]);
        assert_eq!(created.title, "Dune");
        assert_eq!(created.genre, Genre::ScienceFiction);
    }

    #[tokio::test]
    async fn test_duplicate_isbn_leaves_store_unchanged() {
        let svc = service();
        svc.create_book(new_book("Dune", "9780441013593")).await.unwrap();

        let err = svc
            .create_book(new_book("Dune Messiah", "9780441013593"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateKey { ref isbn } if isbn == "9780441013593"));

        let all = svc.list_books().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "Dune");
    }

    #[tokio::test]
    async fn test_invalid_create_is_not_stored() {
        let svc = service();
        let err = svc.create_book(new_book("Dune", "97804410135")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(svc.list_books().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_genre_only() {
        let svc = service();
        svc.create_book(new_book("Dune", "9780000000001")).await.unwrap();

        let patch: BookPatch =
            serde_json::from_value(json!({ "isbn": "9780000000001", "genre": "Fantasy" })).unwrap();
        let updated = svc.update_book(patch).await.unwrap();

        assert_eq!(updated.genre, Genre::Fantasy);
        assert_eq!(updated.title, "Dune");
        assert_eq!(updated.author, "Frank Herbert");
        assert_eq!(updated.publication_year, "1965");
        assert_eq!(svc.find_books(&any("9780000000001")).await.unwrap(), vec![updated]);
    }

    #[tokio::test]
    async fn test_overlapping_updates_to_different_fields_both_persist() {
        let svc = CatalogService::new(Repository::with_store(Arc::new(SlowStore::default())));
        svc.create_book(new_book("Dune", "9780441013593")).await.unwrap();

        let genre: BookPatch =
            serde_json::from_value(json!({ "isbn": "9780441013593", "genre": "Fantasy" })).unwrap();
        let title: BookPatch =
            serde_json::from_value(json!({ "isbn": "9780441013593", "title": "Dune Messiah" }))
                .unwrap();
        let (a, b) = tokio::join!(svc.update_book(genre), svc.update_book(title));
        a.unwrap();
        b.unwrap();

        let stored = svc.find_books(&any("9780441013593")).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].genre, Genre::Fantasy);
        assert_eq!(stored[0].title, "Dune Messiah");
        assert_eq!(stored[0].author, "Frank Herbert");
    }

    #[tokio::test]
    async fn test_update_unknown_isbn_is_not_found() {
        let patch: BookPatch =
            serde_json::from_value(json!({ "isbn": "9780000000001", "title": "X" })).unwrap();
        assert!(matches!(
            service().update_book(patch).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_update_with_only_isbn_returns_stored() {
        let svc = service();
        let created = svc.create_book(new_book("Dune", "9780441013593")).await.unwrap();
        let patch: BookPatch = serde_json::from_value(json!({ "isbn": "9780441013593" })).unwrap();
        assert_eq!(svc.update_book(patch).await.unwrap(), created);
    }

    #[tokio::test]
    async fn test_find_missing_is_not_found() {
        assert!(matches!(
            service().find_books(&any("Nothing")).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_delete_then_find_is_not_found() {
        let svc = service();
        svc.create_book(new_book("Dune", "9780441013593")).await.unwrap();

        let deleted = svc.delete_book(&any("Dune")).await.unwrap();
        assert_eq!(deleted.isbn, "9780441013593");
        assert!(matches!(
            svc.find_books(&any("Dune")).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            svc.delete_book(&any("Dune")).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_delete_by_shared_title_is_refused() {
        let svc = service();
        svc.create_book(new_book("Emma", "1000000000001")).await.unwrap();
        svc.create_book(new_book("Emma", "1000000000002")).await.unwrap();

        let err = svc.delete_book(&any("Emma")).await.unwrap_err();
        assert!(matches!(err, AppError::AmbiguousKey { matches: 2, .. }));
        assert_eq!(svc.list_books().await.unwrap().len(), 2);

        svc.delete_book(&any("1000000000002")).await.unwrap();
        assert_eq!(svc.find_books(&any("Emma")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let mut store = MockBookStore::new();
        store
            .expect_list()
            .returning(|| Err(AppError::StoreUnavailable("connection refused".to_string())));
        store
            .expect_find()
            .returning(|_| Err(AppError::StoreUnavailable("pool timed out".to_string())));

        let svc = CatalogService::new(Repository::with_store(Arc::new(store)));
        assert!(matches!(
            svc.list_books().await.unwrap_err(),
            AppError::StoreUnavailable(_)
        ));
        assert!(matches!(
            svc.delete_book(&any("Dune")).await.unwrap_err(),
            AppError::StoreUnavailable(_)
        ));
    }

    #[tokio::test]
    async fn test_validation_happens_before_store_access() {
        // No expectations: any store call would panic
        let store = MockBookStore::new();
        let svc = CatalogService::new(Repository::with_store(Arc::new(store)));

        assert!(matches!(
            svc.create_book(NewBook::default()).await.unwrap_err(),
            AppError::Validation(_)
        ));
        assert!(matches!(
            svc.update_book(BookPatch::default()).await.unwrap_err(),
            AppError::Validation(_)
        ));
    }
}
