//! Logging initialization

use super::config::{LogConfig, DEFAULT_FILTER, LOG_FILE_PREFIX};
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize the logging system
///
/// Sets up:
/// - Compact stderr output filtered by `RUST_LOG`
/// - Daily-rotated file log under `VAULT_LOG_DIR`, when set
/// - Panic hook that records the panic before the default handler runs
///
/// The returned guard flushes the file log when dropped; keep it alive for
/// the lifetime of the program.
pub fn init(config: &LogConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|e| {
        eprintln!("Warning: invalid log filter '{}': {}", config.log_level, e);
        EnvFilter::new(DEFAULT_FILTER)
    });

    let (file_layer, guard) = match file_layer(config) {
        Some((layer, guard)) => (Some(layer), Some(guard)),
        None => (None, None),
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .compact();

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .with(env_filter)
        .try_init()?;

    tracing::debug!(
        log_level = %config.log_level,
        log_file = ?config.log_file(),
        "Logging initialized"
    );

    setup_panic_hook();

    Ok(guard)
}

fn file_layer(config: &LogConfig) -> Option<(BoxedLayer, WorkerGuard)> {
    let dir = config.log_dir.as_ref()?;

    if let Err(e) = fs::create_dir_all(dir) {
        eprintln!("Warning: Failed to create log directory: {}", e);
        return None;
    }

    let file_appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let layer = fmt::layer()
        .with_writer(non_blocking)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI codes in log files

    let layer: BoxedLayer = if config.json {
        layer.json().boxed()
    } else {
        layer.boxed()
    };

    Some((layer, guard))
}

/// Log panics with location and message, then defer to the default hook
fn setup_panic_hook() {
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown location".to_string());

        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic message".to_string()
        };

        tracing::error!(location = %location, message = %message, "Application panic");

        default_panic(panic_info);
    }));
}
