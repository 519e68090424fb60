//! Network data retrieval split into submodules.
//!
//! The engine only sees the [`MovieGateway`] and [`ImageSource`] traits. The
//! TMDB client implements both over HTTP; the stub gateway implements both
//! from scripted data for tests and offline runs.

use std::future::Future;

use crate::error::FetchError;
use crate::state::{Movie, Page, Query};

mod decode;
mod genres;
mod images;
mod stub;
mod tmdb;

pub use decode::{decode_genres, decode_page};
pub use genres::GenreStore;
pub use images::{ImageData, image_url, validate_image};
pub use stub::{StubGateway, StubResponse, synthetic_page};
pub use tmdb::{DEFAULT_API_BASE_URL, DEFAULT_IMAGE_BASE_URL, TmdbClient, TmdbConfig};

/// One page of a listing, fetched with a single outbound call.
///
/// Implementations surface transport and decode failures untouched and never
/// retry; recovery is the paginator's job.
pub trait MovieGateway: Send + Sync + 'static {
    /// What: Fetch `page` of the listing selected by `query`.
    ///
    /// Inputs:
    /// - `query`: Empty query selects the default upcoming listing, anything else searches
    /// - `page`: 1-based page number
    ///
    /// Output:
    /// - The decoded page, or a [`FetchError`]
    fn fetch_page(
        &self,
        query: &Query,
        page: u32,
    ) -> impl Future<Output = Result<Page, FetchError>> + Send;
}

/// Thumbnail retrieval keyed by a movie's image path.
pub trait ImageSource: Send + Sync + 'static {
    /// What: Fetch the image of `movie` rendered at `width` pixels.
    ///
    /// Output:
    /// - Image bytes, or `FetchError::MissingResource` when the movie has no image path
    fn fetch_image(
        &self,
        width: u32,
        movie: &Movie,
    ) -> impl Future<Output = Result<ImageData, FetchError>> + Send;
}

/// What: Hide the `api_key` query parameter of a URL before logging it.
///
/// Inputs:
/// - `url`: Absolute URL, possibly carrying `api_key=...`
///
/// Output:
/// - The URL with the key's value replaced by `***`; unparsable input is returned unchanged
#[must_use]
pub fn redact_api_key(url: &str) -> String {
    let Ok(mut parsed) = reqwest::Url::parse(url) else {
        return url.to_string();
    };
    let pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "api_key" {
                "***".to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), v)
        })
        .collect();
    if pairs.is_empty() {
        return parsed.to_string();
    }
    parsed.query_pairs_mut().clear().extend_pairs(pairs);
    parsed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// What: API keys never reach the logs.
    ///
    /// Inputs:
    /// - URL with `api_key`, `query` and `page` parameters; URL without query; garbage.
    ///
    /// Output:
    /// - Key value masked, other parameters untouched; other inputs returned as-is.
    fn redacts_api_key_only() {
        let redacted =
            redact_api_key("https://api.themoviedb.org/3/search/movie?api_key=secret&query=abc&page=2");
        assert!(!redacted.contains("secret"));
        assert!(redacted.contains("api_key=***") || redacted.contains("api_key=%2A%2A%2A"));
        assert!(redacted.contains("query=abc"));
        assert!(redacted.contains("page=2"));
        assert_eq!(
            redact_api_key("https://image.tmdb.org/t/p/w185/a.jpg"),
            "https://image.tmdb.org/t/p/w185/a.jpg"
        );
        assert_eq!(redact_api_key("not a url"), "not a url");
    }
}
