use std::env;
use std::path::{Path, PathBuf};

/// Directory name used under the user's config roots.
const APP_DIR: &str = "cinefeed";
/// Settings file name.
const SETTINGS_FILE: &str = "settings.conf";

/// What: List candidate settings files in priority order.
///
/// Inputs:
/// - `home`: Value of `$HOME`, if set
/// - `xdg_config`: Value of `$XDG_CONFIG_HOME`, if set
///
/// Output:
/// - `$HOME/.config/cinefeed/settings.conf`, then `$XDG_CONFIG_HOME/cinefeed/settings.conf`
pub fn settings_candidates(home: Option<&Path>, xdg_config: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Some(h) = home {
        candidates.push(h.join(".config").join(APP_DIR).join(SETTINGS_FILE));
    }
    if let Some(x) = xdg_config {
        candidates.push(x.join(APP_DIR).join(SETTINGS_FILE));
    }
    candidates
}

/// Determine the settings file to load: the first existing candidate.
pub fn resolve_settings_config_path() -> Option<PathBuf> {
    let home = env::var_os("HOME").map(PathBuf::from);
    let xdg_config = env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from);
    settings_candidates(home.as_deref(), xdg_config.as_deref())
        .into_iter()
        .find(|p| p.is_file())
}

/// Resolve an XDG base directory from environment or default to `$HOME` + segments.
///
/// Inputs:
/// - `var`: Environment variable to check (e.g., `XDG_CONFIG_HOME`).
/// - `home_default`: Fallback path segments relative to `$HOME` if `var` is unset/empty.
///
/// Output: Resolved base directory path.
fn xdg_base_dir(var: &str, home_default: &[&str]) -> PathBuf {
    if let Ok(p) = env::var(var)
        && !p.trim().is_empty()
    {
        return PathBuf::from(p);
    }
    let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
    let mut base = PathBuf::from(home);
    for seg in home_default {
        base = base.join(seg);
    }
    base
}

/// Config directory for cinefeed: `$HOME/.config/cinefeed` when `HOME` is set,
/// otherwise under `$XDG_CONFIG_HOME`. Creation is attempted, not required.
pub fn config_dir() -> PathBuf {
    let dir = env::var("HOME").map_or_else(
        |_| xdg_base_dir("XDG_CONFIG_HOME", &[".config"]).join(APP_DIR),
        |home| Path::new(&home).join(".config").join(APP_DIR),
    );
    let _ = std::fs::create_dir_all(&dir);
    dir
}

/// Logs directory under config: `<config_dir>/logs` (creation attempted).
pub fn logs_dir() -> PathBuf {
    let dir = config_dir().join("logs");
    let _ = std::fs::create_dir_all(&dir);
    dir
}
