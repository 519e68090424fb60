use crate::state::{Movie, Page};

/// What: Fold a freshly fetched page into the movies accumulated so far.
///
/// Inputs:
/// - `previous`: Movies accumulated by earlier pages of the same run
/// - `page`: Newly fetched page
///
/// Output:
/// - `previous` followed by the page's movies, in arrival order
///
/// Details:
/// - No deduplication: a movie served on two overlapping pages appears twice.
#[must_use]
pub fn accumulate(mut previous: Vec<Movie>, page: Page) -> Vec<Movie> {
    previous.extend(page.movies);
    previous
}

/// What: Decide whether another page can be requested.
///
/// Inputs:
/// - `fetched_pages`: Pages successfully applied in the run
/// - `declared_total_pages`: Total declared by the server, `None` until the first page lands
///
/// Output:
/// - `true` while `fetched_pages < declared_total_pages`; always `true` for an unknown total
#[must_use]
pub const fn has_more_pages(fetched_pages: u32, declared_total_pages: Option<u32>) -> bool {
    match declared_total_pages {
        Some(total) => fetched_pages < total,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn movie(id: u64) -> Movie {
        Movie {
            id,
            title: format!("Movie {id}"),
            poster_path: None,
            backdrop_path: None,
            genre_ids: Vec::new(),
            release_date: NaiveDate::from_ymd_opt(2018, 4, 23).expect("valid date"),
        }
    }

    #[test]
    /// What: Accumulation appends in arrival order and keeps duplicates.
    ///
    /// Inputs:
    /// - Previous movies `[1, 2]` and a page `[2, 3]`.
    ///
    /// Output:
    /// - `[1, 2, 2, 3]`.
    fn accumulate_appends_without_dedup() {
        let merged = accumulate(
            vec![movie(1), movie(2)],
            Page::new(vec![movie(2), movie(3)], 4),
        );
        let ids: Vec<u64> = merged.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2, 2, 3]);
    }

    #[test]
    /// What: An empty page leaves the accumulation unchanged.
    fn accumulate_empty_page() {
        let merged = accumulate(vec![movie(7)], Page::default());
        assert_eq!(merged.len(), 1);
    }

    #[test]
    /// What: Page availability against known and unknown totals.
    ///
    /// Details:
    /// - A server declaring zero pages (empty search) is immediately exhausted.
    fn has_more_pages_boundaries() {
        assert!(has_more_pages(0, None));
        assert!(has_more_pages(100, None));
        assert!(has_more_pages(1, Some(2)));
        assert!(!has_more_pages(2, Some(2)));
        assert!(!has_more_pages(1, Some(0)));
    }
}
