//! Tracing subscriber bootstrap: a console layer honoring `--log-level`
//! (with `--json` switching it to JSON lines on stderr) plus an optional
//! non-blocking file layer when `logging.debug_log` is set in the config.

use std::path::Path;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::FILE_GUARD;

/// Initializes the global tracing subscriber. Safe to call once per
/// process; a second call is a no-op since `try_init` swallows the error.
pub fn init_tracing(json: bool, log_level: &str, debug_log: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    let console_layer = if json {
        fmt::layer().json().with_target(false).boxed()
    } else {
        fmt::layer().with_target(false).boxed()
    };

    let registry = tracing_subscriber::registry().with(filter).with(console_layer);

    if let Some(path) = debug_log {
        let path = Path::new(path);
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
        let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| "skin.log".to_string());
        let appender = tracing_appender::rolling::never(dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        let file_layer = fmt::layer().with_ansi(false).with_writer(non_blocking);
        let _ = registry.with(file_layer).try_init();
    } else {
        let _ = registry.try_init();
    }
}
