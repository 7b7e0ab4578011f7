//! Logging setup
//!
//! Tracing with two layers: stdout (suppressed when running from cron) and
//! an append-only log file. The returned guards must stay alive until the
//! process exits or buffered log lines are lost.

use crate::config::LogSettings;
use std::path::Path;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_log::LogTracer;
use tracing_subscriber::{fmt::Layer, prelude::*, EnvFilter, Registry};

pub fn init(settings: &LogSettings, verbose: bool) -> Vec<WorkerGuard> {
    let mut guards = Vec::new();

    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));

    // Stdout layer, skipped under cron where output would be mailed around
    let stdout_layer = (!settings.from_cron).then(|| {
        let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
        guards.push(guard);
        Layer::new().with_writer(writer)
    });

    // File layer; an unwritable log location degrades to stdout-only
    let file_layer = match file_appender(&settings.file) {
        Ok(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            guards.push(guard);
            Some(Layer::new().with_writer(writer).with_ansi(false))
        }
        Err(e) => {
            eprintln!(
                "cannot open log file {}: {} (continuing without file logging)",
                settings.file.display(),
                e
            );
            None
        }
    };

    let subscriber = Registry::default()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer);

    if let Err(e) = LogTracer::init() {
        eprintln!("logging bridge initialization failed (continuing): {}", e);
    }

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("global logger initialization failed: {}", e);
    }

    guards
}

fn file_appender(
    path: &Path,
) -> std::result::Result<RollingFileAppender, tracing_appender::rolling::InitError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "vigil.log".to_string());

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(dir)
}
