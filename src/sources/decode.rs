//! Tolerant decoding of listing payloads.
//!
//! A page payload is `{ "results": [record], "total_pages": int }`. The
//! envelope must be well formed, but each record is decoded on its own and
//! invalid ones are dropped, so one bad entry never fails a page.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

use crate::error::FetchError;
use crate::state::{Genre, Movie, Page};

/// Envelope of a listing response; records stay raw until validated.
#[derive(Deserialize)]
struct RawPage {
    results: Vec<Value>,
    total_pages: u32,
}

/// Record as served by the API. Extra fields are ignored.
#[derive(Deserialize)]
struct RawMovie {
    id: u64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    original_title: Option<String>,
    #[serde(default)]
    poster_path: Option<String>,
    #[serde(default)]
    backdrop_path: Option<String>,
    genre_ids: Vec<u32>,
    release_date: String,
}

#[derive(Deserialize)]
struct RawGenres {
    genres: Vec<Genre>,
}

/// What: Decode a listing page, dropping malformed records.
///
/// Inputs:
/// - `body`: Raw JSON response body
///
/// Output:
/// - `Ok(Page)` with every valid record in server order
/// - `Err(FetchError::Decode)` when the envelope itself is malformed
///
/// Details:
/// - A record needs an integer `id`, a title (`title`, else `original_title`),
///   `genre_ids`, and a `YYYY-MM-DD` `release_date`.
pub fn decode_page(body: &[u8]) -> Result<Page, FetchError> {
    let raw: RawPage = serde_json::from_slice(body)?;
    let served = raw.results.len();
    let movies: Vec<Movie> = raw
        .results
        .into_iter()
        .filter_map(|value| match decode_movie(value) {
            Ok(movie) => Some(movie),
            Err(reason) => {
                tracing::debug!(reason = %reason, "[Decode] dropping malformed record");
                None
            }
        })
        .collect();
    if movies.len() < served {
        tracing::info!(
            served,
            kept = movies.len(),
            "[Decode] page contained malformed records"
        );
    }
    Ok(Page::new(movies, raw.total_pages))
}

fn decode_movie(value: Value) -> Result<Movie, String> {
    let raw: RawMovie = serde_json::from_value(value).map_err(|e| e.to_string())?;
    let title = raw
        .title
        .filter(|t| !t.is_empty())
        .or(raw.original_title)
        .ok_or_else(|| format!("record {} has no title", raw.id))?;
    let release_date = NaiveDate::parse_from_str(&raw.release_date, "%Y-%m-%d")
        .map_err(|e| format!("record {} has bad release_date {:?}: {e}", raw.id, raw.release_date))?;
    Ok(Movie {
        id: raw.id,
        title,
        poster_path: raw.poster_path.filter(|p| !p.is_empty()),
        backdrop_path: raw.backdrop_path.filter(|p| !p.is_empty()),
        genre_ids: raw.genre_ids,
        release_date,
    })
}

/// What: Decode the genre list payload `{ "genres": [{ "id", "name" }] }`.
///
/// Output:
/// - `Err(FetchError::Decode)` when the payload does not have that shape
pub fn decode_genres(body: &[u8]) -> Result<Vec<Genre>, FetchError> {
    let raw: RawGenres = serde_json::from_slice(body)?;
    Ok(raw.genres)
}

#[cfg(test)]
mod tests {
    use super::*;

    const IT: &str = r#"{"vote_count":213,"id":346364,"video":false,"vote_average":7.2,"title":"It","popularity":139.429699,"poster_path":"/9E2y5Q7WlCVNEhP5GiVTjhEhx1o.jpg","original_language":"en","original_title":"It","genre_ids":[27],"backdrop_path":"/tcheoA2nPATCm2vvXw2hVQoaEFD.jpg","overview":"","release_date":"2017-08-17"}"#;

    #[test]
    /// What: Decode a realistic record with all fields.
    fn decodes_full_record() {
        let body = format!(r#"{{"page":1,"results":[{IT}],"total_pages":7,"total_results":140}}"#);
        let page = decode_page(body.as_bytes()).expect("valid page");
        assert_eq!(page.total_pages, 7);
        let movie = &page.movies[0];
        assert_eq!(movie.id, 346_364);
        assert_eq!(movie.title, "It");
        assert_eq!(movie.poster_path.as_deref(), Some("/9E2y5Q7WlCVNEhP5GiVTjhEhx1o.jpg"));
        assert_eq!(movie.genre_ids, vec![27]);
        assert_eq!(
            movie.release_date,
            NaiveDate::from_ymd_opt(2017, 8, 17).expect("valid date")
        );
    }

    #[test]
    /// What: Malformed records are dropped individually.
    ///
    /// Inputs:
    /// - Five records: valid, missing id, empty release date, non-array genres, valid.
    ///
    /// Output:
    /// - Two movies, in server order.
    fn drops_only_malformed_records() {
        let body = format!(
            r#"{{"results":[
                {IT},
                {{"title":"No id","genre_ids":[],"release_date":"2018-01-01"}},
                {{"id":2,"title":"No date","genre_ids":[],"release_date":""}},
                {{"id":3,"title":"Bad genres","genre_ids":"action","release_date":"2018-01-01"}},
                {{"id":4,"original_title":"Fallback title","genre_ids":[12,16],"release_date":"2018-05-04","poster_path":null}}
            ],"total_pages":1}}"#
        );
        let page = decode_page(body.as_bytes()).expect("envelope is valid");
        let ids: Vec<u64> = page.movies.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![346_364, 4]);
        assert_eq!(page.movies[1].title, "Fallback title");
        assert_eq!(page.movies[1].image_path(), None);
    }

    #[test]
    /// What: A broken envelope is a decode error.
    fn malformed_envelope_fails() {
        assert!(matches!(
            decode_page(br#"{"results":[]}"#),
            Err(FetchError::Decode(_))
        ));
        assert!(matches!(
            decode_page(b"<html>502</html>"),
            Err(FetchError::Decode(_))
        ));
    }

    #[test]
    /// What: Decode the genre list payload.
    fn decodes_genres() {
        let genres =
            decode_genres(br#"{"genres":[{"id":28,"name":"Action"},{"id":27,"name":"Horror"}]}"#)
                .expect("valid genres");
        assert_eq!(genres.len(), 2);
        assert_eq!(genres[1].name, "Horror");
        assert!(decode_genres(br#"{"genre":[]}"#).is_err());
    }
}
