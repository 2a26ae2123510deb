//! Integration tests for logging system

use bridge_traits::{LogEntry, LogLevel, LoggerSink};
use core_runtime::logging::{build_dispatch, LogFormat, LoggingConfig};
use core_runtime::FetchConfig;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct RecordingSink {
    entries: Mutex<Vec<LogEntry>>,
}

impl LoggerSink for RecordingSink {
    fn log(&self, entry: LogEntry) -> bridge_traits::error::Result<()> {
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }

    fn min_level(&self) -> LogLevel {
        LogLevel::Trace
    }
}

fn messages(sink: &RecordingSink) -> Vec<String> {
    sink.entries
        .lock()
        .unwrap()
        .iter()
        .map(|e| e.message.clone())
        .collect()
}

#[test]
fn test_every_format_builds() {
    for format in [LogFormat::Pretty, LogFormat::Compact, LogFormat::Json] {
        let config = LoggingConfig::default().with_format(format).with_ansi(false);
        assert!(build_dispatch(&config).is_ok(), "format {:?}", format);
    }
}

#[test]
fn test_level_applies_to_workspace_crates() {
    let sink = Arc::new(RecordingSink::default());
    let dispatch = build_dispatch(
        &LoggingConfig::default()
            .with_level(LogLevel::Warn)
            .with_ansi(false)
            .with_logger_sink(sink.clone()),
    )
    .unwrap();

    tracing::dispatcher::with_default(&dispatch, || {
        tracing::info!(target: "core_sync::orchestrator", "Skipping, genre is blacklisted");
        tracing::warn!(target: "core_sync::orchestrator", "Skipping, track has no title");
        tracing::error!(target: "core_sync::orchestrator", "No lyrics found");
    });

    assert_eq!(
        messages(&sink),
        vec!["Skipping, track has no title", "No lyrics found"]
    );
}

#[test]
fn test_dependencies_held_at_warn() {
    let sink = Arc::new(RecordingSink::default());
    let dispatch = build_dispatch(
        &LoggingConfig::default()
            .with_level(LogLevel::Debug)
            .with_ansi(false)
            .with_logger_sink(sink.clone()),
    )
    .unwrap();

    tracing::dispatcher::with_default(&dispatch, || {
        tracing::debug!(target: "core_metadata::lyrics", "Attempting to fetch lyrics");
        tracing::info!(target: "hyper::client", "connection opened");
        tracing::warn!(target: "lofty::id3", "odd frame");
    });

    assert_eq!(
        messages(&sink),
        vec!["Attempting to fetch lyrics", "odd frame"]
    );
}

#[test]
fn test_two_dispatches_are_independent() {
    let quiet_sink = Arc::new(RecordingSink::default());
    let chatty_sink = Arc::new(RecordingSink::default());

    let quiet = build_dispatch(
        &LoggingConfig::default()
            .with_level(LogLevel::Error)
            .with_ansi(false)
            .with_logger_sink(quiet_sink.clone()),
    )
    .unwrap();
    let chatty = build_dispatch(
        &LoggingConfig::default()
            .with_level(LogLevel::Trace)
            .with_ansi(false)
            .with_logger_sink(chatty_sink.clone()),
    )
    .unwrap();

    tracing::dispatcher::with_default(&quiet, || {
        tracing::info!(target: "core_sync", "one");
    });
    tracing::dispatcher::with_default(&chatty, || {
        tracing::info!(target: "core_sync", "two");
    });

    assert!(messages(&quiet_sink).is_empty());
    assert_eq!(messages(&chatty_sink), vec!["two"]);
}

#[test]
fn test_config_carries_logging() {
    let config = FetchConfig::builder()
        .root("/music")
        .logging(LoggingConfig::default().with_level(LogLevel::Error))
        .build()
        .unwrap();

    assert_eq!(config.logging.level, LogLevel::Error);
    assert_eq!(config.logging.format, LogFormat::Compact);
}
