//! Structured Logging Setup via tracing-subscriber
//!
//! Konfigurierbar per Umgebungsvariable:
//! - `AC_LOG_LEVEL`: Filter-Direktive (trace/debug/info/warn/error oder
//!   `arsene_crypto=debug`), Standard: Wert aus der Konfiguration
//! - `AC_LOG_FORMAT`: Format (text/json), Standard: Wert aus der Konfiguration
//!
//! Logs gehen nach stderr, stdout bleibt fuer Schluesselausgaben frei.

use std::fmt;
use std::str::FromStr;

use tracing_subscriber::{fmt as tfmt, EnvFilter};

pub const ENV_LOG_LEVEL: &str = "AC_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "AC_LOG_FORMAT";

/// Ausgabeformat des Loggings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(anyhow::anyhow!("Unbekanntes Log-Format: '{other}'")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Initialisiert das Logging-System.
///
/// Umgebungsvariablen haben Vorrang vor `level` und `format`. Ein
/// ungueltiger Filter faellt auf `info` zurueck, ein zweiter Aufruf ist
/// ein Fehler.
pub fn logging_initialisieren(level: &str, format: LogFormat) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_env(ENV_LOG_LEVEL)
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let format = match std::env::var(ENV_LOG_FORMAT) {
        Ok(wert) => wert.parse()?,
        Err(_) => format,
    };

    let ergebnis = match format {
        LogFormat::Json => tfmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_current_span(true)
            .try_init(),
        LogFormat::Text => tfmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .try_init(),
    };
    ergebnis.map_err(|e| anyhow::anyhow!("Logging bereits initialisiert: {e}"))
}

/// Validiert ob ein Log-Level-String gueltig ist.
pub fn log_level_gueltig(level: &str) -> bool {
    matches!(level, "trace" | "debug" | "info" | "warn" | "error")
}

/// Validiert ob ein Log-Format-String gueltig ist.
pub fn log_format_gueltig(format: &str) -> bool {
    format.parse::<LogFormat>().is_ok()
}
