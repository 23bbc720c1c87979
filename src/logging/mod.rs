//! Structured Logging & Tracing
//!
//! Structured logging via the `tracing` crate with:
//! - Level-based filtering (TRACE/DEBUG/INFO/WARN/ERROR)
//! - Per-module filters, `RUST_LOG` overrides
//! - Spans for operation timing
//! - Idempotent initialization (first call wins)

use serde::{Deserialize, Serialize};
use std::sync::Once;
use tracing_subscriber::EnvFilter;

/// Log level for the round core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Unknown names fall back to `Info`
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "trace" => LogLevel::Trace,
            "debug" => LogLevel::Debug,
            "warn" | "warning" => LogLevel::Warn,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

/// Configuration for tracing initialization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    pub default_level: LogLevel,
    pub module_filters: Vec<(String, LogLevel)>,
    pub show_targets: bool,
    pub show_thread_ids: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_level: LogLevel::Info,
            module_filters: vec![
                ("wordround_core::cache".to_string(), LogLevel::Warn),
                ("wordround_core::categories".to_string(), LogLevel::Info),
                ("wordround_core::letters".to_string(), LogLevel::Info),
                ("wordround_core::generation".to_string(), LogLevel::Info),
            ],
            show_targets: true,
            show_thread_ids: false,
        }
    }
}

impl TracingConfig {
    pub fn to_env_filter_string(&self) -> String {
        let mut parts = vec![self.default_level.as_str().to_string()];
        for (module, level) in &self.module_filters {
            parts.push(format!("{}={}", module, level.as_str()));
        }
        parts.join(",")
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn from_json(json: &str) -> Option<Self> {
        serde_json::from_str(json).ok()
    }
}

static TRACING_INIT: Once = Once::new();

/// Initialize tracing with default settings (idempotent)
pub fn init_tracing_default() {
    init_tracing(&TracingConfig::default());
}

/// Initialize tracing with custom config (idempotent, first call wins)
pub fn init_tracing(config: &TracingConfig) {
    let filter_str = config.to_env_filter_string();
    let show_targets = config.show_targets;
    let show_thread_ids = config.show_thread_ids;

    TRACING_INIT.call_once(move || {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(show_targets)
            .with_thread_ids(show_thread_ids)
            .with_file(false)
            .with_line_number(false)
            .with_writer(std::io::stderr)
            .compact();

        // A host (e.g. Bevy's LogPlugin) may already own the global subscriber
        let _ = subscriber.try_init();
    });
}

/// Span guard for timing an operation; closes on drop
pub struct TimingSpan {
    _span: tracing::span::EnteredSpan,
}

impl TimingSpan {
    pub fn new(name: &str) -> Self {
        let span = tracing::info_span!("operation", name = name);
        Self {
            _span: span.entered(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_from_name() {
        assert_eq!(LogLevel::from_name("trace"), LogLevel::Trace);
        assert_eq!(LogLevel::from_name("DEBUG"), LogLevel::Debug);
        assert_eq!(LogLevel::from_name("warning"), LogLevel::Warn);
        assert_eq!(LogLevel::from_name("error"), LogLevel::Error);
        assert_eq!(LogLevel::from_name("loud"), LogLevel::Info); // fallback
    }

    #[test]
    fn test_log_level_as_str() {
        assert_eq!(LogLevel::Trace.as_str(), "trace");
        assert_eq!(LogLevel::Info.as_str(), "info");
        assert_eq!(LogLevel::Error.as_str(), "error");
    }

    #[test]
    fn test_env_filter_string() {
        let config = TracingConfig::default();
        let filter = config.to_env_filter_string();
        assert!(filter.starts_with("info"));
        assert!(filter.contains("wordround_core::cache=warn"));
        assert!(filter.contains("wordround_core::generation=info"));
    }

    #[test]
    fn test_tracing_config_json_roundtrip() {
        let config = TracingConfig {
            default_level: LogLevel::Debug,
            module_filters: vec![("wordround_core::letters".into(), LogLevel::Trace)],
            show_targets: false,
            show_thread_ids: true,
        };
        let json = config.to_json();
        assert_eq!(TracingConfig::from_json(&json), Some(config));
        assert_eq!(TracingConfig::from_json("garbage"), None);
    }

    #[test]
    fn test_init_tracing_idempotent() {
        init_tracing_default();
        init_tracing_default();
        init_tracing(&TracingConfig::default());
    }

    #[test]
    fn test_timing_span() {
        let _span = TimingSpan::new("generate_batch");
    }
}
