//! Data models for the book catalog

pub mod book;
pub mod enums;
pub mod lookup;

// Re-export commonly used types
pub use book::{Book, BookPatch, CheckedPatch, NewBook};
pub use enums::Genre;
pub use lookup::{KeyField, LookupKey, LookupQuery};
