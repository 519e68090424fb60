//! Core value types used by the feed engine.

use std::sync::Arc;

use chrono::NaiveDate;

/// Search text driving which listing is fetched.
///
/// Empty text means "no search": the default upcoming listing is browsed
/// instead. Two queries are equal when their raw text is equal; no trimming or
/// case folding is applied.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Query(String);

impl Query {
    /// What: Wrap raw search text as a query.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Raw search text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.0
    }

    /// `true` when this query browses the default listing.
    #[must_use]
    pub fn is_browse(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_browse() {
            f.write_str("<upcoming>")
        } else {
            write!(f, "{:?}", self.0)
        }
    }
}

/// Minimal movie record used in lists and search results.
///
/// Identity is `id`. The engine never deduplicates records, so overlapping
/// pages can yield the same movie twice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Movie {
    /// Catalog identifier.
    pub id: u64,
    /// Display title.
    pub title: String,
    /// Poster image path relative to the image base URL.
    pub poster_path: Option<String>,
    /// Backdrop image path, used when no poster exists.
    pub backdrop_path: Option<String>,
    /// Genre identifiers, resolvable through [`crate::sources::GenreStore`].
    pub genre_ids: Vec<u32>,
    /// Theatrical release date.
    pub release_date: NaiveDate,
}

impl Movie {
    /// What: Pick the path used for thumbnails.
    ///
    /// Output:
    /// - Poster path if present, otherwise the backdrop path, otherwise `None`.
    #[must_use]
    pub fn image_path(&self) -> Option<&str> {
        self.poster_path
            .as_deref()
            .or(self.backdrop_path.as_deref())
    }
}

/// Genre id/name pair as served by the genre list endpoint.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Genre {
    /// Genre identifier referenced by [`Movie::genre_ids`].
    pub id: u32,
    /// Human readable name.
    pub name: String,
}

/// One fetched page of results.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Page {
    /// Valid records in server order.
    pub movies: Vec<Movie>,
    /// Total number of pages the server declares for the query.
    pub total_pages: u32,
}

impl Page {
    /// What: Build a page from records and the declared page count.
    #[must_use]
    pub const fn new(movies: Vec<Movie>, total_pages: u32) -> Self {
        Self {
            movies,
            total_pages,
        }
    }
}

/// Published state of the active run.
///
/// `movies` is shared so that fanning a snapshot out to many observers does
/// not copy the list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// Run generation the snapshot belongs to (0 before the first run starts).
    pub generation: u64,
    /// Query of the run.
    pub query: Query,
    /// Pages successfully applied so far in this run.
    pub fetched_pages: u32,
    /// Accumulated movies in arrival order.
    pub movies: Arc<Vec<Movie>>,
    /// Whether a page request is in flight.
    pub is_loading: bool,
}
