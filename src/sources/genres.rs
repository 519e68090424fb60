use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::state::{Genre, Movie};

/// Shared genre id → name table.
///
/// Cloning yields another handle to the same table. The composition root
/// creates one store and hands it to the gateway that refreshes it and to
/// whatever renders genre names.
#[derive(Clone, Debug, Default)]
pub struct GenreStore {
    inner: Arc<RwLock<HashMap<u32, String>>>,
}

impl GenreStore {
    /// What: Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// What: Create a store pre-filled with `genres`.
    #[must_use]
    pub fn with_genres(genres: Vec<Genre>) -> Self {
        let store = Self::new();
        store.replace(genres);
        store
    }

    /// What: Replace the whole table with a freshly fetched genre list.
    pub fn replace(&self, genres: Vec<Genre>) {
        let mut table = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        table.clear();
        table.extend(genres.into_iter().map(|g| (g.id, g.name)));
    }

    /// Name of genre `id`, if known.
    #[must_use]
    pub fn name(&self, id: u32) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    /// Number of known genres.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// `true` when no genre is known yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// What: Check whether any movie references a genre missing from the table.
    ///
    /// Output:
    /// - `true` when a refresh of the genre list is warranted
    #[must_use]
    pub fn has_unknown(&self, movies: &[Movie]) -> bool {
        let table = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        movies
            .iter()
            .flat_map(|m| m.genre_ids.iter())
            .any(|id| !table.contains_key(id))
    }

    /// What: Resolve the genre names of `movie`.
    ///
    /// Output:
    /// - Names in the order of `movie.genre_ids`; unknown ids are skipped
    #[must_use]
    pub fn genre_names(&self, movie: &Movie) -> Vec<String> {
        let table = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        movie
            .genre_ids
            .iter()
            .filter_map(|id| table.get(id).cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn genre(id: u32, name: &str) -> Genre {
        Genre {
            id,
            name: name.into(),
        }
    }

    fn movie_with_genres(ids: &[u32]) -> Movie {
        Movie {
            id: 1,
            title: "Deadpool 2".into(),
            poster_path: None,
            backdrop_path: None,
            genre_ids: ids.to_vec(),
            release_date: NaiveDate::from_ymd_opt(2018, 5, 15).expect("valid date"),
        }
    }

    #[test]
    /// What: Names resolve in id order and unknown ids are skipped.
    fn resolves_names_in_order() {
        let store = GenreStore::with_genres(vec![genre(28, "Action"), genre(35, "Comedy")]);
        let movie = movie_with_genres(&[35, 99, 28]);
        assert_eq!(store.genre_names(&movie), vec!["Comedy", "Action"]);
        assert!(store.has_unknown(std::slice::from_ref(&movie)));
        assert!(!store.has_unknown(&[movie_with_genres(&[28])]));
    }

    #[test]
    /// What: Clones share the table and `replace` drops stale entries.
    fn clones_share_state() {
        let store = GenreStore::new();
        assert!(store.is_empty());
        let handle = store.clone();
        handle.replace(vec![genre(12, "Adventure")]);
        assert_eq!(store.name(12).as_deref(), Some("Adventure"));
        handle.replace(vec![genre(16, "Animation")]);
        assert_eq!(store.name(12), None);
        assert_eq!(store.len(), 1);
    }
}
