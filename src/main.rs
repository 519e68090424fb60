//! cinefeed binary: wires settings, logging and a gateway to the feed engine and
//! drives it from stdin.

use std::fmt;
use std::process::ExitCode;
use std::sync::{Arc, OnceLock};

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use cinefeed::app::{FeedConfig, MovieFeed, MovieList, Subscription};
use cinefeed::args::{Args, determine_log_level};
use cinefeed::config::{load_settings, logs_dir};
use cinefeed::error::AppError;
use cinefeed::sources::{GenreStore, ImageSource, MovieGateway, StubGateway, TmdbClient};

struct CinefeedTimer;

impl tracing_subscriber::fmt::time::FormatTime for CinefeedTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> fmt::Result {
        let ts = chrono::Local::now().format("%Y-%m-%d-T %H:%M:%S").to_string();
        w.write_str(&ts)
    }
}

static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// Default thumbnail width for `:image` without an explicit width.
const DEFAULT_IMAGE_WIDTH: u32 = 185;
/// Titles printed per `movies` emission.
const PREVIEW_TITLES: usize = 5;

/// What: Initialise tracing to `<config_dir>/logs/cinefeed.log`, falling back to stderr.
///
/// Inputs:
/// - `level`: Default filter when `RUST_LOG` is not set
fn init_logging(level: &str) {
    let mut log_path = logs_dir();
    log_path.push("cinefeed.log");
    let env_filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level))
    };
    match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_target(false)
                .with_ansi(false)
                .with_writer(non_blocking)
                .with_timer(CinefeedTimer)
                .init();
            let _ = LOG_GUARD.set(guard);
            tracing::info!(path = %log_path.display(), "logging initialized");
        }
        Err(e) => {
            // Fallback: stderr logger so startup never blocks on the log file
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_target(false)
                .with_ansi(true)
                .with_writer(std::io::stderr)
                .with_timer(CinefeedTimer)
                .init();
            tracing::warn!(error = %e, "failed to open log file; using stderr");
        }
    }
}

/// One line of user input.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    /// `:more`
    More,
    /// `:image <index> [width]`
    Image { index: usize, width: u32 },
    /// `:quit`
    Quit,
    /// Anything else is search text, typed as-is.
    Search(String),
    /// A `:` command with bad arguments.
    Invalid(String),
}

fn parse_command(line: &str) -> Command {
    let mut parts = line.split_whitespace();
    match parts.next() {
        Some(":more") => Command::More,
        Some(":quit" | ":q") => Command::Quit,
        Some(":image") => {
            let Some(index) = parts.next().and_then(|s| s.parse::<usize>().ok()) else {
                return Command::Invalid("usage: :image <index> [width]".into());
            };
            match parts.next().map(str::parse::<u32>) {
                None => Command::Image {
                    index,
                    width: DEFAULT_IMAGE_WIDTH,
                },
                Some(Ok(width)) if width > 0 => Command::Image { index, width },
                Some(_) => Command::Invalid("width must be a positive integer".into()),
            }
        }
        _ => Command::Search(line.to_string()),
    }
}

fn print_movies(movies: &MovieList, genres: Option<&GenreStore>) {
    println!("movies: {}", movies.len());
    let start = movies.len().saturating_sub(PREVIEW_TITLES);
    for (i, movie) in movies.iter().enumerate().skip(start) {
        let genre_names = genres
            .map(|g| g.genre_names(movie).join(", "))
            .unwrap_or_default();
        println!(
            "  [{i}] {} ({}) {genre_names}",
            movie.title,
            movie.release_date.format("%Y-%m-%d")
        );
    }
}

fn spawn_printer(
    mut movies: Subscription<MovieList>,
    mut loading: Subscription<bool>,
    genres: Option<GenreStore>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut movies_open = true;
        let mut loading_open = true;
        while movies_open || loading_open {
            tokio::select! {
                biased;
                list = movies.next(), if movies_open => match list {
                    Some(list) => print_movies(&list, genres.as_ref()),
                    None => movies_open = false,
                },
                flag = loading.next(), if loading_open => match flag {
                    Some(true) => println!("loading..."),
                    Some(false) => println!("idle"),
                    None => loading_open = false,
                },
            }
        }
    })
}

async fn drive<G: MovieGateway + ImageSource>(
    gateway: Arc<G>,
    config: &FeedConfig,
    genres: Option<GenreStore>,
) -> Result<(), AppError> {
    let feed = MovieFeed::spawn(gateway, config);
    let printer = spawn_printer(feed.movies(), feed.loading(), genres);
    println!("type to search, :more for the next page, :image <index> [width], :quit to exit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_command(&line) {
            Command::More => feed.request_page(),
            Command::Quit => break,
            Command::Search(text) => feed.set_search_text(text),
            Command::Invalid(msg) => println!("{msg}"),
            Command::Image { index, width } => {
                let snapshot = feed.snapshot();
                let Some(movie) = snapshot.movies.get(index) else {
                    println!("no movie at index {index}");
                    continue;
                };
                match feed.image(width, movie).await {
                    Ok(img) => println!(
                        "image for {}: {} bytes ({})",
                        movie.title,
                        img.bytes.len(),
                        img.content_type.as_deref().unwrap_or("unknown type")
                    ),
                    Err(err) => println!("image for {} failed: {err}", movie.title),
                }
            }
        }
    }
    feed.shutdown().await;
    if let Err(err) = printer.await {
        tracing::warn!(error = %err, "printer task ended abnormally");
    }
    Ok(())
}

async fn run(args: Args) -> Result<(), AppError> {
    let (mut settings, settings_path) = load_settings(args.config.as_deref())?;
    args.apply_to(&mut settings);
    let source = settings_path.map_or_else(|| "<defaults>".to_string(), |p| p.display().to_string());
    tracing::info!(
        settings = %source,
        offline = args.offline,
        "cinefeed starting"
    );
    let feed_config = settings.feed_config();
    if args.offline {
        return drive(Arc::new(StubGateway::sample()), &feed_config, None).await;
    }
    let genres = GenreStore::new();
    let client = TmdbClient::new(settings.tmdb_config()?, genres.clone()).map_err(AppError::HttpClient)?;
    drive(Arc::new(client), &feed_config, Some(genres)).await
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&determine_log_level(&args));
    let code = match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "cinefeed failed");
            eprintln!("cinefeed: {err}");
            ExitCode::FAILURE
        }
    };
    tracing::info!("cinefeed exited");
    code
}
