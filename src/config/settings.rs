use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::app::{DEFAULT_DEBOUNCE, DEFAULT_PUBLISH_CAPACITY, FeedConfig};
use crate::error::AppError;
use crate::logic::FailurePolicy;
use crate::sources::{DEFAULT_API_BASE_URL, DEFAULT_IMAGE_BASE_URL, TmdbConfig};

/// User settings loaded from `settings.conf`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// TMDB API key; required unless running offline.
    pub api_key: Option<String>,
    /// API root.
    pub api_base_url: String,
    /// Image CDN root.
    pub image_base_url: String,
    /// Search debounce in milliseconds.
    pub debounce_ms: u64,
    /// Failed page handling.
    pub failure_policy: FailurePolicy,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Whole-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Buffered emissions per subscriber.
    pub publish_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            image_base_url: DEFAULT_IMAGE_BASE_URL.to_string(),
            debounce_ms: u64::try_from(DEFAULT_DEBOUNCE.as_millis()).unwrap_or(500),
            failure_policy: FailurePolicy::default(),
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            publish_capacity: DEFAULT_PUBLISH_CAPACITY,
        }
    }
}

impl Settings {
    /// Engine tuning derived from these settings.
    #[must_use]
    pub const fn feed_config(&self) -> FeedConfig {
        FeedConfig {
            debounce: Duration::from_millis(self.debounce_ms),
            failure_policy: self.failure_policy,
            publish_capacity: self.publish_capacity,
        }
    }

    /// What: Build the HTTP gateway configuration.
    ///
    /// # Errors
    /// - `AppError::MissingApiKey` when no non-empty API key is configured
    pub fn tmdb_config(&self) -> Result<TmdbConfig, AppError> {
        let key = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(AppError::MissingApiKey)?;
        Ok(TmdbConfig {
            api_key: key.to_string(),
            api_base_url: self.api_base_url.clone(),
            image_base_url: self.image_base_url.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        })
    }
}

/// What: Check if a line should be skipped (empty or comment).
///
/// Details:
/// - Skips empty lines and lines starting with `#`, `//`, or `;`
fn skip_comment_or_empty(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty()
        || trimmed.starts_with('#')
        || trimmed.starts_with("//")
        || trimmed.starts_with(';')
}

/// What: Drop a trailing ` # comment` from a value.
///
/// Details:
/// - Only a `#` preceded by whitespace starts a comment, so URL fragments survive.
fn strip_inline_comment(value: &str) -> &str {
    let cut = value
        .char_indices()
        .find(|&(i, c)| {
            c == '#' && value[..i].ends_with(char::is_whitespace)
        })
        .map_or(value.len(), |(i, _)| i);
    value[..cut].trim()
}

fn parse_positive(key: &str, val: &str) -> Option<u64> {
    match val.parse::<u64>() {
        Ok(v) if v > 0 => Some(v),
        _ => {
            tracing::warn!(key, value = val, "[Settings] expected a positive integer; ignored");
            None
        }
    }
}

/// What: Apply `settings.conf` content on top of `settings`.
///
/// Inputs:
/// - `content`: File content
/// - `settings`: Settings to update in place
///
/// Details:
/// - Keys are case-insensitive and `.`, `-` and spaces are read as `_`.
/// - Unknown keys and invalid values are logged and ignored; the previous value stays.
pub fn parse_settings(content: &str, settings: &mut Settings) {
    for line in content.lines() {
        if skip_comment_or_empty(line) {
            continue;
        }
        let Some((raw_key, raw_val)) = line.trim().split_once('=') else {
            tracing::warn!(line = line.trim(), "[Settings] line without '='; ignored");
            continue;
        };
        let key = raw_key.trim().to_lowercase().replace(['.', '-', ' '], "_");
        let val = strip_inline_comment(raw_val.trim());
        match key.as_str() {
            "api_key" | "tmdb_api_key" => {
                settings.api_key = (!val.is_empty()).then(|| val.to_string());
            }
            "api_base_url" => {
                if val.is_empty() {
                    tracing::warn!(key = %key, "[Settings] empty URL; ignored");
                } else {
                    settings.api_base_url = val.trim_end_matches('/').to_string();
                }
            }
            "image_base_url" => {
                if val.is_empty() {
                    tracing::warn!(key = %key, "[Settings] empty URL; ignored");
                } else {
                    settings.image_base_url = val.trim_end_matches('/').to_string();
                }
            }
            "debounce_ms" => match val.parse::<u64>() {
                Ok(v) => settings.debounce_ms = v,
                Err(_) => tracing::warn!(key = %key, value = val, "[Settings] invalid number; ignored"),
            },
            "failure_policy" => match FailurePolicy::from_config_key(val) {
                Some(policy) => settings.failure_policy = policy,
                None => tracing::warn!(key = %key, value = val, "[Settings] unknown policy; ignored"),
            },
            "connect_timeout_secs" => {
                if let Some(v) = parse_positive(&key, val) {
                    settings.connect_timeout_secs = v;
                }
            }
            "request_timeout_secs" => {
                if let Some(v) = parse_positive(&key, val) {
                    settings.request_timeout_secs = v;
                }
            }
            "publish_capacity" => {
                if let Some(v) = parse_positive(&key, val).and_then(|v| usize::try_from(v).ok()) {
                    settings.publish_capacity = v;
                }
            }
            _ => tracing::warn!(key = %key, "[Settings] unknown key; ignored"),
        }
    }
}

/// What: Load settings from `path`, or from the resolved default location.
///
/// Inputs:
/// - `path`: Explicit settings file (`--config`), or `None` to search the config roots
///
/// Output:
/// - Parsed settings and the file they came from (`None` when defaults were used)
///
/// # Errors
/// - `AppError::Io` when an explicitly given file cannot be read
///
/// Details:
/// - A missing default file is not an error; defaults are returned.
pub fn load_settings(path: Option<&Path>) -> Result<(Settings, Option<PathBuf>), AppError> {
    let mut settings = Settings::default();
    let resolved = match path {
        Some(p) => Some(p.to_path_buf()),
        None => super::paths::resolve_settings_config_path(),
    };
    let Some(file) = resolved else {
        tracing::debug!("[Settings] no settings.conf found; using defaults");
        return Ok((settings, None));
    };
    let content = std::fs::read_to_string(&file)?;
    parse_settings(&content, &mut settings);
    tracing::debug!(path = %file.display(), "[Settings] loaded");
    Ok((settings, Some(file)))
}
