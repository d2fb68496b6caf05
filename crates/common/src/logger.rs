use crate::error::AiAdapterError;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    reload,
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

/// Crates whose debug output the plugin's debug flag turns on
const PLUGIN_TARGETS: [&str; 3] = ["aiadapter_llm", "aiadapter_plugin", "aiadapter"];

type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Switches plugin debug logging on and off at runtime
///
/// Mirrors the `debug` setting: when on, plugin crates log at debug level
/// on top of the configured base level.
#[derive(Clone, Default)]
pub struct DebugToggle {
    handle: Option<FilterHandle>,
    base_level: String,
}

impl DebugToggle {
    /// Toggle that does nothing, for hosts without a subscriber
    pub fn noop() -> Self {
        Self::default()
    }

    /// Apply the debug flag
    pub fn set_debug(&self, debug: bool) {
        let Some(handle) = &self.handle else {
            return;
        };

        if let Err(e) = handle.reload(build_filter(&self.base_level, debug)) {
            tracing::warn!("Failed to switch log level: {}", e);
        }
    }
}

impl std::fmt::Debug for DebugToggle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebugToggle")
            .field("active", &self.handle.is_some())
            .field("base_level", &self.base_level)
            .finish()
    }
}

fn build_filter(base_level: &str, debug: bool) -> EnvFilter {
    if !debug {
        return EnvFilter::new(base_level);
    }

    let mut directives = base_level.to_string();
    for target in PLUGIN_TARGETS {
        directives.push_str(&format!(",{}=debug", target));
    }
    EnvFilter::new(directives)
}

/// Initialize logging system
///
/// Sets up logging to both console (stderr) and file
///
/// # Arguments
/// * `log_dir` - Directory where log files will be stored
/// * `log_level` - Log level (trace, debug, info, warn, error)
pub fn setup_logging(log_dir: &Path, log_level: &str) -> Result<DebugToggle, AiAdapterError> {
    // Create log directory
    if !log_dir.exists() {
        std::fs::create_dir_all(log_dir).map_err(|e| {
            AiAdapterError::config(format!(
                "Failed to create log directory {}: {}",
                log_dir.display(),
                e
            ))
        })?;
    }

    // Log file path
    let log_file_path = log_dir.join("aiadapter.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)
        .map_err(|e| {
            AiAdapterError::config(format!(
                "Failed to open log file {}: {}",
                log_file_path.display(),
                e
            ))
        })?;

    // Environment filter setup (RUST_LOG env var takes precedence)
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));
    let (filter_layer, handle) = reload::Layer::new(env_filter);

    // Console output layer
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE);

    // File output layer
    let file_layer = fmt::layer()
        .with_writer(Arc::new(log_file))
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_ansi(false) // Remove ANSI color codes in files
        .with_span_events(FmtSpan::FULL);

    // Initialize subscriber
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(console_layer)
        .with(file_layer)
        .init();

    tracing::info!(
        "Logging initialized: level={}, log_file={}",
        log_level,
        log_file_path.display()
    );

    Ok(DebugToggle {
        handle: Some(handle),
        base_level: log_level.to_string(),
    })
}
