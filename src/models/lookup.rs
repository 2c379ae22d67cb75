//! Search key used by lookup and delete

use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use super::book::Book;

/// Which field(s) a raw key is matched against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum KeyField {
    /// ISBN or title
    #[default]
    Any,
    Isbn,
    Title,
}

/// Query parameters accepted next to a search key
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LookupQuery {
    /// `any` (default), `isbn` or `title`
    pub field: Option<KeyField>,
}

/// A key tagged with the field(s) it should match. `Any` keeps the
/// isbn-or-title ambiguity explicit: a title may collide with other titles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupKey {
    Any(String),
    Isbn(String),
    Title(String),
}

impl LookupKey {
    pub fn new(raw: &str, field: KeyField) -> Self {
        let key = raw.trim().to_string();
        match field {
            KeyField::Any => LookupKey::Any(key),
            KeyField::Isbn => LookupKey::Isbn(key),
            KeyField::Title => LookupKey::Title(key),
        }
    }

    pub fn value(&self) -> &str {
        match self {
            LookupKey::Any(k) | LookupKey::Isbn(k) | LookupKey::Title(k) => k,
        }
    }

    pub fn matches(&self, book: &Book) -> bool {
        match self {
            LookupKey::Any(k) => book.isbn == *k || book.title == *k,
            LookupKey::Isbn(k) => book.isbn == *k,
            LookupKey::Title(k) => book.title == *k,
        }
    }
}

impl std::fmt::Display for LookupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.value())
    }
}
