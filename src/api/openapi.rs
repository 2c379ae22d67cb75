//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, health};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Book Catalog API",
        version = "0.1.0",
        description = "Create, list, search, update and delete book records keyed by ISBN"
    ),
    servers(
        (url = "/api", description = "Catalog API")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::create_book,
        books::list_books,
        books::find_books,
        books::update_book,
        books::delete_book,
    ),
    components(
        schemas(
            crate::models::Book,
            crate::models::NewBook,
            crate::models::BookPatch,
            crate::models::Genre,
            crate::models::KeyField,
            books::BookResponse,
            health::HealthResponse,
            crate::error::ErrorResponse,
            crate::error::FieldError,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Book catalog management")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_book_operation() {
        let doc = ApiDoc::openapi();
        for path in [
            "/books",
            "/bookdetails/{searchKey}",
            "/editBook",
            "/deleteBook/{searchKey}",
            "/health",
            "/ready",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
