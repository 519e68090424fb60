//! TMDB HTTP client: upcoming listing, search, genre list and images.

use std::time::Duration;

use crate::error::FetchError;
use crate::sources::decode::{decode_genres, decode_page};
use crate::sources::images::{ImageData, image_url, validate_image};
use crate::sources::{GenreStore, ImageSource, MovieGateway, redact_api_key};
use crate::state::{Genre, Movie, Page, Query};

/// Default TMDB API root.
pub const DEFAULT_API_BASE_URL: &str = "https://api.themoviedb.org/3";
/// Default TMDB image CDN root.
pub const DEFAULT_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";

/// Connection settings for [`TmdbClient`].
#[derive(Clone, Debug)]
pub struct TmdbConfig {
    /// API key sent as the `api_key` query parameter.
    pub api_key: String,
    /// API root, without trailing slash.
    pub api_base_url: String,
    /// Image CDN root, without trailing slash.
    pub image_base_url: String,
    /// TCP/TLS connect timeout.
    pub connect_timeout: Duration,
    /// Whole-request timeout.
    pub request_timeout: Duration,
}

impl TmdbConfig {
    /// What: Build a config for `api_key` with default endpoints and timeouts.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            image_base_url: DEFAULT_IMAGE_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// HTTP gateway to a TMDB-compatible API.
///
/// Connection pooling comes from the shared `reqwest::Client`. Every decoded
/// page is checked against the [`GenreStore`]; unknown genre ids trigger one
/// genre-list refresh before the page is returned.
#[derive(Clone, Debug)]
pub struct TmdbClient {
    http: reqwest::Client,
    config: TmdbConfig,
    genres: GenreStore,
}

impl TmdbClient {
    /// What: Build a client with the configured timeouts.
    ///
    /// Inputs:
    /// - `config`: Endpoints, key and timeouts
    /// - `genres`: Genre table refreshed by this client
    ///
    /// Output:
    /// - `Err` only when the underlying HTTP client cannot be constructed
    ///
    /// # Errors
    /// - Returns `Err` when the TLS backend fails to initialise
    pub fn new(config: TmdbConfig, genres: GenreStore) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(format!("cinefeed/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            config,
            genres,
        })
    }

    /// Genre table maintained by this client.
    #[must_use]
    pub const fn genres(&self) -> &GenreStore {
        &self.genres
    }

    fn endpoint(&self, path: &str, params: &[(&str, String)]) -> Result<reqwest::Url, FetchError> {
        let base = format!("{}{path}", self.config.api_base_url.trim_end_matches('/'));
        let mut all: Vec<(&str, &str)> = vec![("api_key", self.config.api_key.as_str())];
        all.extend(params.iter().map(|(k, v)| (*k, v.as_str())));
        reqwest::Url::parse_with_params(&base, &all)
            .map_err(|e| FetchError::Transport(format!("invalid request URL {base}: {e}")))
    }

    async fn get(&self, url: reqwest::Url) -> Result<(Vec<u8>, Option<String>), FetchError> {
        let shown = redact_api_key(url.as_str());
        tracing::debug!(url = %shown, "[Tmdb] GET");
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            tracing::debug!(url = %shown, status = status.as_u16(), "[Tmdb] non-success status");
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: shown,
            });
        }
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp.bytes().await?;
        Ok((body.to_vec(), content_type))
    }

    /// What: Fetch one page of the upcoming-movies listing.
    ///
    /// # Errors
    /// - `InvalidPage` for page 0, transport/status errors, or a malformed envelope
    pub async fn upcoming(&self, page: u32) -> Result<Page, FetchError> {
        let url = self.endpoint("/movie/upcoming", &[("page", page.to_string())])?;
        self.fetch_listing(url, page).await
    }

    /// What: Fetch one page of search results for `text`.
    ///
    /// # Errors
    /// - `InvalidPage` for page 0, transport/status errors, or a malformed envelope
    pub async fn search(&self, text: &str, page: u32) -> Result<Page, FetchError> {
        let url = self.endpoint(
            "/search/movie",
            &[("query", text.to_string()), ("page", page.to_string())],
        )?;
        self.fetch_listing(url, page).await
    }

    /// What: Fetch the full genre list.
    ///
    /// # Errors
    /// - Transport/status errors or a malformed payload
    pub async fn genre_list(&self) -> Result<Vec<Genre>, FetchError> {
        let url = self.endpoint("/genre/movie/list", &[])?;
        let (body, _) = self.get(url).await?;
        decode_genres(&body)
    }

    async fn fetch_listing(&self, url: reqwest::Url, page: u32) -> Result<Page, FetchError> {
        if page == 0 {
            return Err(FetchError::InvalidPage(page));
        }
        let (body, _) = self.get(url).await?;
        let decoded = decode_page(&body)?;
        self.refresh_genres_if_needed(&decoded).await;
        Ok(decoded)
    }

    /// What: Refresh the genre table when a page references unknown genres.
    ///
    /// Details:
    /// - A failed refresh is logged and does not fail the page; names for the unknown
    ///   ids simply stay unresolved until a later page triggers another refresh.
    async fn refresh_genres_if_needed(&self, page: &Page) {
        if !self.genres.has_unknown(&page.movies) {
            return;
        }
        match self.genre_list().await {
            Ok(list) => {
                tracing::debug!(count = list.len(), "[Tmdb] genre table refreshed");
                self.genres.replace(list);
            }
            Err(err) => {
                tracing::warn!(error = %err, "[Tmdb] genre refresh failed; keeping page");
            }
        }
    }
}

impl MovieGateway for TmdbClient {
    async fn fetch_page(&self, query: &Query, page: u32) -> Result<Page, FetchError> {
        if query.is_browse() {
            self.upcoming(page).await
        } else {
            self.search(query.text(), page).await
        }
    }
}

impl ImageSource for TmdbClient {
    async fn fetch_image(&self, width: u32, movie: &Movie) -> Result<ImageData, FetchError> {
        let raw = image_url(&self.config.image_base_url, width, movie)?;
        let url = reqwest::Url::parse(&raw)
            .map_err(|e| FetchError::Transport(format!("invalid image URL {raw}: {e}")))?;
        let (body, content_type) = self.get(url).await?;
        validate_image(body, content_type)
    }
}
