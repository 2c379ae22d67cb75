//! Book catalog endpoints

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{AppResult, ErrorResponse},
    models::{Book, BookPatch, LookupKey, LookupQuery, NewBook},
    AppState,
};

use super::{ApiJson, ApiPath, ApiQuery};

/// Acknowledgement returned by mutating endpoints
#[derive(Serialize, ToSchema)]
pub struct BookResponse {
    pub success: bool,
    pub message: String,
    /// The stored, updated or removed record
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book: Option<Book>,
}

impl BookResponse {
    fn ok(message: &str, book: Book) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            book: Some(book),
        }
    }
}

/// Create a new book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    request_body = NewBook,
    responses(
        (status = 201, description = "Book created", body = BookResponse),
        (status = 400, description = "Invalid field(s)", body = ErrorResponse),
        (status = 409, description = "ISBN already exists", body = ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    ApiJson(candidate): ApiJson<NewBook>,
) -> AppResult<(StatusCode, Json<BookResponse>)> {
    let created = state.services.catalog.create_book(candidate).await?;
    Ok((
        StatusCode::CREATED,
        Json(BookResponse::ok("Book added successfully", created)),
    ))
}

/// List every book
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    responses(
        (status = 200, description = "All books", body = Vec<Book>),
        (status = 500, description = "Store error", body = ErrorResponse)
    )
)]
pub async fn list_books(State(state): State<AppState>) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.catalog.list_books().await?;
    Ok(Json(books))
}

/// Find books by ISBN or title
#[utoipa::path(
    get,
    path = "/bookdetails/{searchKey}",
    tag = "books",
    params(
        ("searchKey" = String, Path, description = "ISBN or exact title"),
        LookupQuery
    ),
    responses(
        (status = 200, description = "Matching books", body = Vec<Book>),
        (status = 404, description = "No book matches", body = ErrorResponse)
    )
)]
pub async fn find_books(
    State(state): State<AppState>,
    ApiPath(search_key): ApiPath<String>,
    ApiQuery(query): ApiQuery<LookupQuery>,
) -> AppResult<Json<Vec<Book>>> {
    let key = LookupKey::new(&search_key, query.field.unwrap_or_default());
    let books = state.services.catalog.find_books(&key).await?;
    Ok(Json(books))
}

/// Update the supplied fields of a book
#[utoipa::path(
    put,
    path = "/editBook",
    tag = "books",
    request_body = BookPatch,
    responses(
        (status = 200, description = "Book updated", body = BookResponse),
        (status = 400, description = "Invalid field(s)", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    ApiJson(patch): ApiJson<BookPatch>,
) -> AppResult<Json<BookResponse>> {
    let updated = state.services.catalog.update_book(patch).await?;
    Ok(Json(BookResponse::ok("Book updated successfully", updated)))
}

/// Delete the book matching an ISBN or title
#[utoipa::path(
    delete,
    path = "/deleteBook/{searchKey}",
    tag = "books",
    params(
        ("searchKey" = String, Path, description = "ISBN or exact title"),
        LookupQuery
    ),
    responses(
        (status = 200, description = "Book deleted", body = BookResponse),
        (status = 404, description = "Book not found", body = ErrorResponse),
        (status = 409, description = "Key matches more than one book", body = ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    ApiPath(search_key): ApiPath<String>,
    ApiQuery(query): ApiQuery<LookupQuery>,
) -> AppResult<Json<BookResponse>> {
    let key = LookupKey::new(&search_key, query.field.unwrap_or_default());
    let deleted = state.services.catalog.delete_book(&key).await?;
    Ok(Json(BookResponse::ok("Book deleted successfully", deleted)))
}
