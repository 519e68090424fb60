//! Self-mockable gateway for tests and offline runs.
//!
//! Responses are scripted per `(query, page)`; requests without a script use
//! the fallback (a synthetic listing by default). Every call is recorded so
//! tests can assert on the exact network traffic the engine produced.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::NaiveDate;

use crate::error::FetchError;
use crate::sources::images::{ImageData, image_url};
use crate::sources::{ImageSource, MovieGateway};
use crate::state::{Movie, Page, Query};

/// Scripted outcome of one stubbed request.
#[derive(Clone, Debug)]
pub enum StubResponse {
    /// Return this page.
    Page(Page),
    /// Fail with this error.
    Fail(FetchError),
    /// Panic inside the fetch future, as an unexpected bug would.
    Panic(String),
    /// Generate `per_page` movies per page for a listing of `total_pages` pages.
    Synthetic {
        /// Movies per generated page.
        per_page: usize,
        /// Declared total page count.
        total_pages: u32,
    },
}

#[derive(Clone, Debug)]
struct Scripted {
    response: StubResponse,
    delay: Duration,
}

/// Gateway answering from scripted responses.
#[derive(Debug)]
pub struct StubGateway {
    scripts: HashMap<(Query, u32), Scripted>,
    fallback: Scripted,
    calls: Mutex<Vec<(Query, u32)>>,
}

impl Default for StubGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl StubGateway {
    /// What: Create a stub whose unscripted requests fail with a transport error.
    #[must_use]
    pub fn new() -> Self {
        Self {
            scripts: HashMap::new(),
            fallback: Scripted {
                response: StubResponse::Fail(FetchError::Transport("no stub scripted".into())),
                delay: Duration::ZERO,
            },
            calls: Mutex::new(Vec::new()),
        }
    }

    /// What: Stub used by `--offline`: three upcoming pages and two pages per search.
    #[must_use]
    pub fn sample() -> Self {
        Self::new()
            .with_response(
                Query::default(),
                1,
                StubResponse::Synthetic {
                    per_page: 20,
                    total_pages: 3,
                },
            )
            .with_response(
                Query::default(),
                2,
                StubResponse::Synthetic {
                    per_page: 20,
                    total_pages: 3,
                },
            )
            .with_response(
                Query::default(),
                3,
                StubResponse::Synthetic {
                    per_page: 7,
                    total_pages: 3,
                },
            )
            .with_fallback(StubResponse::Synthetic {
                per_page: 18,
                total_pages: 2,
            })
    }

    /// What: Script `page` of `query` to return `result` immediately.
    #[must_use]
    pub fn with_page(self, query: impl Into<String>, page: u32, result: Page) -> Self {
        self.with_response(Query::new(query), page, StubResponse::Page(result))
    }

    /// What: Script `page` of `query` to fail with `err`.
    #[must_use]
    pub fn with_failure(self, query: impl Into<String>, page: u32, err: FetchError) -> Self {
        self.with_response(Query::new(query), page, StubResponse::Fail(err))
    }

    /// What: Script an arbitrary response for `page` of `query`.
    #[must_use]
    pub fn with_response(mut self, query: Query, page: u32, response: StubResponse) -> Self {
        self.scripts.insert(
            (query, page),
            Scripted {
                response,
                delay: Duration::ZERO,
            },
        );
        self
    }

    /// What: Delay the scripted response of `page` of `query`.
    ///
    /// Details:
    /// - Has no effect for requests that are not scripted yet; script first.
    #[must_use]
    pub fn with_delay(mut self, query: impl Into<String>, page: u32, delay: Duration) -> Self {
        if let Some(entry) = self.scripts.get_mut(&(Query::new(query), page)) {
            entry.delay = delay;
        }
        self
    }

    /// What: Response used for every unscripted request.
    #[must_use]
    pub fn with_fallback(mut self, response: StubResponse) -> Self {
        self.fallback = Scripted {
            response,
            delay: Duration::ZERO,
        };
        self
    }

    /// Every `(query, page)` requested so far, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<(Query, u32)> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of requests made so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// What: Generate a deterministic page for offline listings.
///
/// Inputs:
/// - `query`: Query whose text titles the movies (`Upcoming` for the default listing)
/// - `page`: 1-based page number, used to keep ids unique across pages
/// - `per_page`, `total_pages`: Shape of the generated listing
///
/// Output:
/// - A page of `per_page` movies (none past `total_pages`) declaring `total_pages`
#[must_use]
pub fn synthetic_page(query: &Query, page: u32, per_page: usize, total_pages: u32) -> Page {
    let label = if query.is_browse() {
        "Upcoming"
    } else {
        query.text()
    };
    let count = if page > total_pages { 0 } else { per_page };
    let base = u64::from(page.saturating_sub(1)) * 1_000;
    let release = NaiveDate::from_ymd_opt(2018, 4, 23).unwrap_or_default();
    let movies = (0..count)
        .map(|i| {
            let n = base + i as u64 + 1;
            Movie {
                id: n,
                title: format!("{label} #{n}"),
                poster_path: (n % 5 != 0).then(|| format!("/poster-{n}.jpg")),
                backdrop_path: Some(format!("/backdrop-{n}.jpg")),
                genre_ids: vec![28 + u32::try_from(n % 3).unwrap_or_default()],
                release_date: release,
            }
        })
        .collect();
    Page::new(movies, total_pages)
}

impl MovieGateway for StubGateway {
    async fn fetch_page(&self, query: &Query, page: u32) -> Result<Page, FetchError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((query.clone(), page));
        if page == 0 {
            return Err(FetchError::InvalidPage(page));
        }
        let scripted = self
            .scripts
            .get(&(query.clone(), page))
            .unwrap_or(&self.fallback)
            .clone();
        if !scripted.delay.is_zero() {
            tokio::time::sleep(scripted.delay).await;
        }
        match scripted.response {
            StubResponse::Page(p) => Ok(p),
            StubResponse::Fail(err) => Err(err),
            StubResponse::Panic(msg) => panic!("{msg}"),
            StubResponse::Synthetic {
                per_page,
                total_pages,
            } => Ok(synthetic_page(query, page, per_page, total_pages)),
        }
    }
}

/// Minimal PNG signature served as every stubbed image.
const STUB_PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

impl ImageSource for StubGateway {
    async fn fetch_image(&self, width: u32, movie: &Movie) -> Result<ImageData, FetchError> {
        let url = image_url("stub://image", width, movie)?;
        tracing::debug!(url = %url, "[Stub] image");
        Ok(ImageData {
            bytes: STUB_PNG.to_vec(),
            content_type: Some("image/png".into()),
        })
    }
}
