/*!
 * Logging Module
 * Subscriber setup (console plus rolling files) and request middleware
 */
pub mod middleware;

use std::{io, path::PathBuf};
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
    Registry,
};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

#[derive(Debug, Clone)]
pub struct LogSettings {
    /// JSON everywhere instead of a pretty console
    pub json: bool,
    pub level: String,
    pub dir: PathBuf,
}

impl LogSettings {
    /// `LOG_LEVEL` and `LOG_DIR`, defaulting to JSON at `info` in production.
    pub fn from_env(production: bool) -> Self {
        let json = production;
        let default_level = if json { "info" } else { "debug" };
        Self {
            json,
            level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| default_level.to_string()),
            dir: std::env::var("LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("logs")),
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "panel_backend={},tower_http=debug,axum=debug,sqlx=warn",
                self.level
            ))
        })
    }
}

/// Installs the global subscriber: everything to `app.log`, errors also to
/// `error.log`, and the console.
///
/// The returned guards flush the background writers when dropped.
pub fn init(settings: &LogSettings) -> Vec<WorkerGuard> {
    if let Err(e) = std::fs::create_dir_all(&settings.dir) {
        eprintln!("cannot create log dir {}: {}", settings.dir.display(), e);
    }

    let (file_writer, file_guard) = non_blocking(rolling::daily(&settings.dir, "app.log"));
    let (error_writer, error_guard) = non_blocking(rolling::daily(&settings.dir, "error.log"));
    let (console_writer, console_guard) = non_blocking(io::stdout());

    let layers: Vec<BoxedLayer> = if settings.json {
        vec![
            fmt::layer()
                .json()
                .with_writer(file_writer)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .boxed(),
            fmt::layer()
                .json()
                .with_writer(error_writer)
                .with_file(true)
                .with_line_number(true)
                .with_filter(LevelFilter::ERROR)
                .boxed(),
            fmt::layer()
                .json()
                .with_writer(console_writer)
                .with_target(false)
                .boxed(),
        ]
    } else {
        vec![
            fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true)
                .boxed(),
            fmt::layer()
                .with_writer(error_writer)
                .with_ansi(false)
                .with_filter(LevelFilter::ERROR)
                .boxed(),
            fmt::layer().with_writer(console_writer).pretty().boxed(),
        ]
    };

    let installed = tracing_subscriber::registry()
        .with(layers)
        .with(settings.filter())
        .try_init();

    match installed {
        Ok(()) => tracing::info!(json = settings.json, level = %settings.level, "logging initialized"),
        Err(e) => eprintln!("logging already initialized: {e}"),
    }

    vec![file_guard, error_guard, console_guard]
}
