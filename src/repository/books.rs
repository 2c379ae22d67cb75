//! PostgreSQL book store.
//!
//! The `books.isbn` UNIQUE constraint is what rejects concurrent duplicate
//! inserts; no application-side locking is done.

use async_trait::async_trait;
use sqlx::{FromRow, Pool, Postgres};

use super::BookStore;
use crate::{
    error::{AppError, AppResult},
    models::{Book, CheckedPatch, Genre, LookupKey},
};

const BOOK_COLUMNS: &str = "title, author, isbn, publication_year, genre";

#[derive(Debug, FromRow)]
struct BookRow {
    title: String,
    author: String,
    isbn: String,
    publication_year: String,
    genre: String,
}

impl TryFrom<BookRow> for Book {
    type Error = AppError;

    fn try_from(row: BookRow) -> Result<Self, Self::Error> {
        let genre = row
            .genre
            .parse::<Genre>()
            .map_err(|e| AppError::Internal(format!("book {}: {}", row.isbn, e)))?;

        Ok(Book {
            title: row.title,
            author: row.author,
            isbn: row.isbn,
            publication_year: row.publication_year,
            genre,
        })
    }
}

fn into_books(rows: Vec<BookRow>) -> AppResult<Vec<Book>> {
    rows.into_iter().map(Book::try_from).collect()
}

#[derive(Clone)]
pub struct PgBookStore {
    pool: Pool<Postgres>,
}

impl PgBookStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookStore for PgBookStore {
    async fn insert(&self, book: &Book) -> AppResult<Book> {
        let query = format!(
            r#"
            INSERT INTO books ({BOOK_COLUMNS})
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {BOOK_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, BookRow>(&query)
            .bind(&book.title)
            .bind(&book.author)
            .bind(&book.isbn)
            .bind(&book.publication_year)
            .bind(book.genre.label())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    AppError::DuplicateKey {
                        isbn: book.isbn.clone(),
                    }
                }
                other => AppError::from_store(other),
            })?;

        row.try_into()
    }

    async fn list(&self) -> AppResult<Vec<Book>> {
        let query = format!("SELECT {BOOK_COLUMNS} FROM books ORDER BY id");
        let rows = sqlx::query_as::<_, BookRow>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::from_store)?;
        into_books(rows)
    }

    async fn find(&self, key: &LookupKey) -> AppResult<Vec<Book>> {
        let predicate = match key {
            LookupKey::Any(_) => "isbn = $1 OR title = $1",
            LookupKey::Isbn(_) => "isbn = $1",
            LookupKey::Title(_) => "title = $1",
        };
        let query = format!("SELECT {BOOK_COLUMNS} FROM books WHERE {predicate} ORDER BY id");

        let rows = sqlx::query_as::<_, BookRow>(&query)
            .bind(key.value())
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::from_store)?;
        into_books(rows)
    }

    async fn find_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>> {
        let query = format!("SELECT {BOOK_COLUMNS} FROM books WHERE isbn = $1");
        sqlx::query_as::<_, BookRow>(&query)
            .bind(isbn)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from_store)?
            .map(Book::try_from)
            .transpose()
    }

    async fn update(&self, patch: &CheckedPatch) -> AppResult<Option<Book>> {
        let query = format!(
            r#"
            UPDATE books
            SET title = COALESCE($1, title),
                author = COALESCE($2, author),
                publication_year = COALESCE($3, publication_year),
                genre = COALESCE($4, genre),
                updated_at = NOW()
            WHERE isbn = $5
            RETURNING {BOOK_COLUMNS}
            "#
        );

        sqlx::query_as::<_, BookRow>(&query)
            .bind(patch.title.as_deref())
            .bind(patch.author.as_deref())
            .bind(patch.publication_year.as_deref())
            .bind(patch.genre.map(|g| g.label()))
            .bind(&patch.isbn)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from_store)?
            .map(Book::try_from)
            .transpose()
    }

    async fn delete_by_isbn(&self, isbn: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM books WHERE isbn = $1")
            .bind(isbn)
            .execute(&self.pool)
            .await
            .map_err(AppError::from_store)?;
        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(AppError::from_store)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::KeyField;

    #[test]
    fn test_row_with_unknown_genre_is_internal_error() {
        let row = BookRow {
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            isbn: "9780441013593".to_string(),
            publication_year: "1965".to_string(),
            genre: "Poetry".to_string(),
        };
        assert!(matches!(Book::try_from(row), Err(AppError::Internal(_))));
    }

    #[test]
    fn test_row_converts() {
        let row = BookRow {
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            isbn: "9780441013593".to_string(),
            publication_year: "1965".to_string(),
            genre: "Science Fiction".to_string(),
        };
        let book = Book::try_from(row).unwrap();
        assert_eq!(book.genre, Genre::ScienceFiction);
    }

    // The tests below need a PostgreSQL server: set DATABASE_URL and run
    // `cargo test -- --ignored`. Each one gets a fresh migrated database.

    fn book(title: &str, isbn: &str) -> Book {
        Book {
            title: title.to_string(),
            author: "Some Author".to_string(),
            isbn: isbn.to_string(),
            publication_year: "2001".to_string(),
            genre: Genre::Other,
        }
    }

    fn patch(isbn: &str) -> CheckedPatch {
        CheckedPatch {
            isbn: isbn.to_string(),
            title: None,
            author: None,
            publication_year: None,
            genre: None,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore]
    async fn test_pg_duplicate_insert_is_duplicate_key(pool: Pool<Postgres>) {
        let store = PgBookStore::new(pool);
        store.insert(&book("A", "1000000000001")).await.unwrap();

        let err = store.insert(&book("B", "1000000000001")).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateKey { ref isbn } if isbn == "1000000000001"));

        let all = store.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "A");
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore]
    async fn test_pg_find_matches_isbn_or_title_in_insertion_order(pool: Pool<Postgres>) {
        let store = PgBookStore::new(pool);
        store.insert(&book("Emma", "1000000000002")).await.unwrap();
        store.insert(&book("Dune", "1000000000003")).await.unwrap();
        store.insert(&book("Emma", "1000000000001")).await.unwrap();

        let isbns: Vec<_> = store
            .find(&LookupKey::new("Emma", KeyField::Any))
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.isbn)
            .collect();
        assert_eq!(isbns, vec!["1000000000002", "1000000000001"]);

        let by_isbn = store.find(&LookupKey::new("1000000000003", KeyField::Any)).await.unwrap();
        assert_eq!(by_isbn, vec![book("Dune", "1000000000003")]);

        let none = store.find(&LookupKey::new("Dune", KeyField::Isbn)).await.unwrap();
        assert!(none.is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore]
    async fn test_pg_update_missing_isbn_is_none(pool: Pool<Postgres>) {
        let store = PgBookStore::new(pool);
        let mut change = patch("1000000000001");
        change.title = Some("A".to_string());

        assert_eq!(store.update(&change).await.unwrap(), None);
        assert!(store.list().await.unwrap().is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore]
    async fn test_pg_sparse_update_keeps_other_columns(pool: Pool<Postgres>) {
        let store = PgBookStore::new(pool);
        store.insert(&book("Dune", "1000000000001")).await.unwrap();

        let mut genre = patch("1000000000001");
        genre.genre = Some(Genre::Fantasy);
        let mut title = patch("1000000000001");
        title.title = Some("Dune Messiah".to_string());

        let (a, b) = tokio::join!(store.update(&genre), store.update(&title));
        assert!(a.unwrap().is_some());
        assert!(b.unwrap().is_some());

        let stored = store.find_by_isbn("1000000000001").await.unwrap().unwrap();
        assert_eq!(stored.title, "Dune Messiah");
        assert_eq!(stored.genre, Genre::Fantasy);
        assert_eq!(stored.author, "Some Author");
        assert_eq!(stored.publication_year, "2001");
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore]
    async fn test_pg_delete_by_isbn(pool: Pool<Postgres>) {
        let store = PgBookStore::new(pool);
        store.insert(&book("Dune", "1000000000001")).await.unwrap();

        assert!(store.delete_by_isbn("1000000000001").await.unwrap());
        assert!(!store.delete_by_isbn("1000000000001").await.unwrap());
        assert_eq!(store.find_by_isbn("1000000000001").await.unwrap(), None);
    }
}
