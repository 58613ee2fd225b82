//! # arsene-observability
//!
//! Structured Logging fuer den Arsene-Daemon via tracing-subscriber
//! (Text oder JSON, Filter per Umgebungsvariable).

pub mod logging;

pub use logging::{log_format_gueltig, log_level_gueltig, logging_initialisieren, LogFormat};
