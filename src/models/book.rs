//! Book record model, request payloads and field validation.
//!
//! Validation runs on the server for every create and update; nothing the
//! client checked is trusted. Field errors are reported with their JSON names
//! so the UI can highlight the offending input.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use super::enums::Genre;
use crate::error::{AppError, AppResult, FieldError};

static NON_BLANK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S").unwrap());
static AUTHOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z\s]+$").unwrap());
/// 13 digits, value within 1000000000000..=9999999999999
static ISBN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[1-9][0-9]{12}$").unwrap());
static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{4}$").unwrap());

const FIELD_ORDER: [&str; 5] = ["title", "author", "isbn", "publicationYear", "genre"];

const TITLE_MSG: &str = "Please provide a title.";
const AUTHOR_MSG: &str = "Please provide a valid author name with only alphabetical characters.";
const ISBN_MSG: &str = "Please provide a valid ISBN number (13 digits).";
const YEAR_MSG: &str = "Please provide a valid publication year (4-digit year format).";
const GENRE_MSG: &str = "Please select a genre.";

/// A stored book record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub title: String,
    /// Letters and spaces only
    pub author: String,
    /// 13 digit ISBN, unique across the catalog
    #[schema(example = "9780441013593")]
    pub isbn: String,
    #[schema(example = "1965")]
    pub publication_year: String,
    pub genre: Genre,
}

/// Create book request. Every field is required; missing fields are reported
/// as validation errors rather than rejected by the decoder.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    #[serde(default)]
    #[validate(
        required(message = "Please provide a title."),
        regex(path = *NON_BLANK_RE, message = "Please provide a title.")
    )]
    pub title: Option<String>,
    #[serde(default)]
    #[validate(
        required(message = "Please provide a valid author name with only alphabetical characters."),
        regex(path = *AUTHOR_RE, message = "Please provide a valid author name with only alphabetical characters.")
    )]
    pub author: Option<String>,
    /// String or number
    #[serde(default, deserialize_with = "lenient_string")]
    #[validate(
        required(message = "Please provide a valid ISBN number (13 digits)."),
        regex(path = *ISBN_RE, message = "Please provide a valid ISBN number (13 digits).")
    )]
    pub isbn: Option<String>,
    /// String or number
    #[serde(default, deserialize_with = "lenient_string")]
    #[validate(
        required(message = "Please provide a valid publication year (4-digit year format)."),
        regex(path = *YEAR_RE, message = "Please provide a valid publication year (4-digit year format).")
    )]
    pub publication_year: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
}

/// Partial update request. `isbn` selects the record and is never changed;
/// any other field that is present and non-empty overwrites the stored value.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookPatch {
    #[serde(default, deserialize_with = "lenient_string")]
    #[validate(
        required(message = "Please provide a valid ISBN number (13 digits)."),
        regex(path = *ISBN_RE, message = "Please provide a valid ISBN number (13 digits).")
    )]
    pub isbn: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    #[validate(regex(
        path = *AUTHOR_RE,
        message = "Please provide a valid author name with only alphabetical characters."
    ))]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    #[validate(regex(
        path = *YEAR_RE,
        message = "Please provide a valid publication year (4-digit year format)."
    ))]
    pub publication_year: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
}

/// A patch that passed validation, ready to merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedPatch {
    pub isbn: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub publication_year: Option<String>,
    pub genre: Option<Genre>,
}

impl NewBook {
    /// Trim, validate and convert into a storable record
    pub fn into_book(self) -> AppResult<Book> {
        let candidate = NewBook {
            title: clean(self.title),
            author: clean(self.author),
            isbn: clean(self.isbn),
            publication_year: clean(self.publication_year),
            genre: clean(self.genre),
        };

        let mut errors = field_errors(candidate.validate());
        let genre = match candidate.genre.as_deref() {
            None => {
                errors.push(FieldError::new("genre", GENRE_MSG));
                None
            }
            Some(raw) => parse_genre(raw, &mut errors),
        };

        // A missing field always carries its own error, so only a clean,
        // complete candidate becomes a book
        match (
            candidate.title,
            candidate.author,
            candidate.isbn,
            candidate.publication_year,
            genre,
        ) {
            (Some(title), Some(author), Some(isbn), Some(publication_year), Some(genre))
                if errors.is_empty() =>
            {
                Ok(Book {
                    title,
                    author,
                    isbn,
                    publication_year,
                    genre,
                })
            }
            _ => Err(rejected(errors)),
        }
    }
}

impl BookPatch {
    /// Trim, drop empty fields and validate what remains
    pub fn check(self) -> AppResult<CheckedPatch> {
        let patch = BookPatch {
            isbn: clean(self.isbn),
            title: clean(self.title),
            author: clean(self.author),
            publication_year: clean(self.publication_year),
            genre: clean(self.genre),
        };

        let mut errors = field_errors(patch.validate());
        let genre = match patch.genre.as_deref() {
            None => None,
            Some(raw) => parse_genre(raw, &mut errors),
        };

        match patch.isbn {
            Some(isbn) if errors.is_empty() => Ok(CheckedPatch {
                isbn,
                title: patch.title,
                author: patch.author,
                publication_year: patch.publication_year,
                genre,
            }),
            _ => Err(rejected(errors)),
        }
    }
}

impl CheckedPatch {
    /// Overwrite only the fields this patch carries; `isbn` is left as stored
    pub fn apply_to(&self, book: &mut Book) {
        if let Some(title) = &self.title {
            book.title = title.clone();
        }
        if let Some(author) = &self.author {
            book.author = author.clone();
        }
        if let Some(year) = &self.publication_year {
            book.publication_year = year.clone();
        }
        if let Some(genre) = self.genre {
            book.genre = genre;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.publication_year.is_none()
            && self.genre.is_none()
    }
}

/// Trimmed value, or `None` when absent or blank
fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_genre(raw: &str, errors: &mut Vec<FieldError>) -> Option<Genre> {
    match raw.parse::<Genre>() {
        Ok(genre) => Some(genre),
        Err(e) => {
            errors.push(FieldError::new("genre", format!("{}. {}", e, GENRE_MSG)));
            None
        }
    }
}

fn wire_name(field: &str) -> &str {
    match field {
        "publication_year" => "publicationYear",
        other => other,
    }
}

fn field_errors(result: Result<(), ValidationErrors>) -> Vec<FieldError> {
    let Err(errors) = result else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for (field, errs) in errors.field_errors() {
        let name = wire_name(&field).to_string();
        // One message per field is enough for the form
        if let Some(err) = errs.first() {
            let message = err
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| default_message(&name).to_string());
            out.push(FieldError::new(name, message));
        }
    }
    out
}

fn default_message(field: &str) -> &'static str {
    match field {
        "title" => TITLE_MSG,
        "author" => AUTHOR_MSG,
        "isbn" => ISBN_MSG,
        "publicationYear" => YEAR_MSG,
        _ => GENRE_MSG,
    }
}

fn rejected(mut errors: Vec<FieldError>) -> AppError {
    errors.sort_by_key(|e| {
        FIELD_ORDER
            .iter()
            .position(|f| *f == e.field)
            .unwrap_or(FIELD_ORDER.len())
    });
    AppError::Validation(errors)
}

/// Accepts a JSON string or number and yields its text form
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    }))
}
