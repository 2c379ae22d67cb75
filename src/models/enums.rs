//! Shared domain enums

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

// ---------------------------------------------------------------------------
// Genre
// ---------------------------------------------------------------------------

/// Book genre, one of a fixed set of labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Genre {
    Fiction,
    #[serde(rename = "Non-Fiction")]
    NonFiction,
    Mystery,
    #[serde(rename = "Science Fiction")]
    ScienceFiction,
    Fantasy,
    Romance,
    Thriller,
    Horror,
    Biography,
    #[serde(rename = "Self-Help")]
    SelfHelp,
    Other,
}

impl Genre {
    pub const ALL: [Genre; 11] = [
        Genre::Fiction,
        Genre::NonFiction,
        Genre::Mystery,
        Genre::ScienceFiction,
        Genre::Fantasy,
        Genre::Romance,
        Genre::Thriller,
        Genre::Horror,
        Genre::Biography,
        Genre::SelfHelp,
        Genre::Other,
    ];

    /// Canonical label, as stored and returned over the API
    pub fn label(&self) -> &'static str {
        match self {
            Genre::Fiction => "Fiction",
            Genre::NonFiction => "Non-Fiction",
            Genre::Mystery => "Mystery",
            Genre::ScienceFiction => "Science Fiction",
            Genre::Fantasy => "Fantasy",
            Genre::Romance => "Romance",
            Genre::Thriller => "Thriller",
            Genre::Horror => "Horror",
            Genre::Biography => "Biography",
            Genre::SelfHelp => "Self-Help",
            Genre::Other => "Other",
        }
    }
}

impl std::fmt::Display for Genre {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown genre '{0}'")]
pub struct UnknownGenre(pub String);

impl FromStr for Genre {
    type Err = UnknownGenre;

    /// Case-insensitive match against the canonical labels
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Genre::ALL
            .iter()
            .copied()
            .find(|g| g.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownGenre(s.to_string()))
    }
}
