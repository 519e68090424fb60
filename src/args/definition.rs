//! Command-line argument definition.

use clap::Parser;

/// cinefeed - browse upcoming movies and search a TMDB-style catalog from the terminal
#[derive(Parser, Debug, Default)]
#[command(name = "cinefeed")]
#[command(version)]
#[command(about = "Browse upcoming movies and search a TMDB-style catalog from the terminal", long_about = None)]
pub struct Args {
    /// TMDB API key (overrides `api_key` in settings.conf)
    #[arg(long, env = "TMDB_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Path to a settings file (default: ~/.config/cinefeed/settings.conf)
    #[arg(long)]
    pub config: Option<std::path::PathBuf>,

    /// Search debounce in milliseconds (overrides `debounce_ms`)
    #[arg(long)]
    pub debounce_ms: Option<u64>,

    /// Serve generated listings instead of calling the API
    #[arg(long)]
    pub offline: bool,

    /// Set the logging level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Enable verbose output (equivalent to --log-level debug)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// What: Apply command-line overrides on top of file settings.
    ///
    /// Inputs:
    /// - `settings`: Settings loaded from `settings.conf` (or defaults)
    ///
    /// Details:
    /// - Only flags that were given replace file values.
    pub fn apply_to(&self, settings: &mut crate::config::Settings) {
        if let Some(key) = self.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            settings.api_key = Some(key.trim().to_string());
        }
        if let Some(ms) = self.debounce_ms {
            settings.debounce_ms = ms;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    #[test]
    /// What: Flags parse and override file settings only when present.
    fn cli_overrides_settings() {
        let args = Args::try_parse_from([
            "cinefeed",
            "--api-key",
            "cli-key",
            "--debounce-ms",
            "2000",
            "--offline",
        ])
        .expect("valid args");
        assert!(args.offline);
        let mut s = Settings {
            api_key: Some("file-key".into()),
            debounce_ms: 300,
            ..Settings::default()
        };
        args.apply_to(&mut s);
        assert_eq!(s.api_key.as_deref(), Some("cli-key"));
        assert_eq!(s.debounce_ms, 2000);

        let mut untouched = Settings {
            api_key: Some("file-key".into()),
            ..Settings::default()
        };
        Args::default().apply_to(&mut untouched);
        assert_eq!(untouched.api_key.as_deref(), Some("file-key"));
    }
}
