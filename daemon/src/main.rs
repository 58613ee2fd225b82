//! acd – Einstiegspunkt
//!
//! Laedt die Konfiguration, initialisiert das Logging und fuehrt genau einen
//! Befehl aus.

use anyhow::{Context, Result};
use arsene_daemon::{befehle, cli::Cli, config::DaemonConfig};
use clap::Parser;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Konfiguration laden (Standardwerte falls Datei fehlt)
    let (config, gefunden) = DaemonConfig::laden(&cli.config)?;

    let level = if cli.debug {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    arsene_observability::logging_initialisieren(level, config.logging.log_format()?)?;

    if !gefunden {
        tracing::warn!(
            pfad = %cli.config,
            "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
        );
    }
    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config,
        "acd gestartet"
    );

    let befehl = cli
        .befehl_aufloesen()
        .context("Kein Befehl angegeben, siehe `acd --help`")?;
    befehle::ausfuehren(befehl, &config, &mut std::io::stdout().lock())
}
