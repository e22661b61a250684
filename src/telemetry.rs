//! JSON trace log for `--logs`; the serial line and stdout never carry it.

use crate::config::AppConfig;
use std::env;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::Level;
use tracing_subscriber::fmt::time::UtcTime;

const TRACE_LOG_ENV: &str = "VTMENU_TRACE_LOG";
const DEFAULT_TRACE_FILE: &str = "vtmenu_trace.jsonl";

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// `$VTMENU_TRACE_LOG` when set and non-blank, else a file in the temp dir.
pub fn tracing_log_path() -> PathBuf {
    match env::var(TRACE_LOG_ENV) {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path.trim()),
        _ => env::temp_dir().join(DEFAULT_TRACE_FILE),
    }
}

fn tracing_enabled(config: &AppConfig) -> bool {
    config.logs && !config.no_logs
}

fn install_subscriber(config: &AppConfig, once: &OnceLock<()>) {
    if !tracing_enabled(config) {
        return;
    }

    once.get_or_init(|| {
        let path = tracing_log_path();
        let file = match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => file,
            Err(err) => {
                eprintln!("vtmenu: trace log {} unavailable: {err}", path.display());
                return;
            }
        };
        // Editor rejections and resolved input are logged at debug.
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_max_level(Level::DEBUG)
            .with_timer(UtcTime::rfc_3339())
            .with_ansi(false)
            .with_writer(file)
            .with_current_span(false)
            .with_span_list(false)
            .finish();
        if tracing::subscriber::set_global_default(subscriber).is_ok() {
            tracing::info!(
                path = %path.display(),
                port = %config.port.display(),
                "trace logging started"
            );
        }
    });
}

/// Install the trace subscriber once per process, if logging is on.
pub fn init_tracing(config: &AppConfig) {
    install_subscriber(config, &TRACING_INIT);
}
