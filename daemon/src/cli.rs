//! Kommandozeile von `acd`
//!
//! Die Flags `--rsagen`, `--ecgen` und `--ec25gen` sind Kurzformen fuer
//! `keygen --algorithm ...` mit dem konfigurierten Pfad.

use std::path::PathBuf;

use arsene_crypto::derivation::MAX_AUSGABE;
use arsene_crypto::KeyAlgorithm;
use clap::builder::RangedU64ValueParser;
use clap::{Parser, Subcommand};

use crate::config::{ENV_CONFIG, STANDARD_CONFIG_PFAD};

/// Arsene-Daemon
#[derive(Parser, Debug)]
#[command(name = "acd")]
#[command(about = "Identitaetsschluessel und Sitzungsschluessel fuer verschluesselte Kanaele")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// RSA-Identitaet erzeugen
    #[arg(long, group = "generieren")]
    pub rsagen: bool,

    /// ECDSA-Identitaet (NIST P-384) erzeugen
    #[arg(long, group = "generieren")]
    pub ecgen: bool,

    /// Ed25519-Identitaet erzeugen
    #[arg(long, group = "generieren")]
    pub ec25gen: bool,

    /// Debug-Logging aktivieren
    #[arg(long, global = true)]
    pub debug: bool,

    /// Pfad zur Konfigurationsdatei
    #[arg(long, global = true, env = ENV_CONFIG, default_value = STANDARD_CONFIG_PFAD)]
    pub config: String,

    #[command(subcommand)]
    pub befehl: Option<Befehl>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Befehl {
    /// Neue Identitaet erzeugen und verschluesselt speichern
    Keygen {
        /// rsa, ecdsa oder ed25519 (Standard aus der Konfiguration)
        #[arg(long)]
        algorithm: Option<KeyAlgorithm>,
        /// Dateipraefix (Standard aus der Konfiguration)
        #[arg(long)]
        prefix: Option<PathBuf>,
    },
    /// Gespeicherte Identitaet laden und die oeffentliche Zeile ausgeben
    Show {
        #[arg(long)]
        prefix: Option<PathBuf>,
    },
    /// Sitzungsschluessel ableiten und Base64-kodiert ausgeben
    Derive {
        /// Geteiltes Geheimnis (Base64); ohne wird ein Zufalls-Seed gezogen
        #[arg(long)]
        secret_b64: Option<String>,
        #[arg(long)]
        channel: Option<String>,
        #[arg(long)]
        nick: Option<String>,
        #[arg(long)]
        server: Option<String>,
        /// Bytes pro Schluessel (1 bis 8160)
        #[arg(
            long,
            default_value_t = 32,
            value_parser = RangedU64ValueParser::<usize>::new().range(1..=MAX_AUSGABE as u64)
        )]
        length: usize,
        /// Anzahl der Schluessel
        #[arg(long, default_value_t = 1)]
        count: usize,
    },
}

impl Cli {
    /// Uebersetzt die Generierungs-Flags in einen `keygen`-Befehl
    pub fn befehl_aufloesen(&self) -> Option<Befehl> {
        let algorithm = if self.rsagen {
            Some(KeyAlgorithm::Rsa)
        } else if self.ecgen {
            Some(KeyAlgorithm::EcdsaP384)
        } else if self.ec25gen {
            Some(KeyAlgorithm::Ed25519)
        } else {
            None
        };

        match algorithm {
            Some(algorithm) => Some(Befehl::Keygen {
                algorithm: Some(algorithm),
                prefix: None,
            }),
            None => self.befehl.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parsen(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("acd").chain(args.iter().copied()))
    }

    #[test]
    fn cli_definition_ist_konsistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn generierungs_flags() {
        let cli = parsen(&["--ecgen"]).unwrap();
        assert_eq!(
            cli.befehl_aufloesen(),
            Some(Befehl::Keygen {
                algorithm: Some(KeyAlgorithm::EcdsaP384),
                prefix: None
            })
        );

        let cli = parsen(&["--rsagen", "--debug"]).unwrap();
        assert!(cli.debug);
        assert!(matches!(
            cli.befehl_aufloesen(),
            Some(Befehl::Keygen {
                algorithm: Some(KeyAlgorithm::Rsa),
                ..
            })
        ));
    }

    #[test]
    fn generierungs_flags_schliessen_sich_aus() {
        assert!(parsen(&["--rsagen", "--ec25gen"]).is_err());
        assert!(parsen(&["--ecgen", "show"]).is_err());
    }

    #[test]
    fn ohne_befehl() {
        let cli = parsen(&[]).unwrap();
        assert_eq!(cli.befehl_aufloesen(), None);
    }

    #[test]
    fn keygen_mit_algorithmus() {
        let cli = parsen(&["keygen", "--algorithm", "ecdsa-p384", "--prefix", "/tmp/id"]).unwrap();
        assert_eq!(
            cli.befehl_aufloesen(),
            Some(Befehl::Keygen {
                algorithm: Some(KeyAlgorithm::EcdsaP384),
                prefix: Some(PathBuf::from("/tmp/id"))
            })
        );
        assert!(parsen(&["keygen", "--algorithm", "dsa"]).is_err());
    }

    #[test]
    fn derive_laenge_ist_begrenzt() {
        assert!(parsen(&["derive", "--length", "8160"]).is_ok());
        assert!(parsen(&["derive", "--length", "8161"]).is_err());
        assert!(parsen(&["derive", "--length", "0"]).is_err());
        assert!(parsen(&["derive", "--length", "18446744073709551615"]).is_err());
    }

    #[test]
    fn derive_standardwerte() {
        let cli = parsen(&["derive", "--channel", "#chan"]).unwrap();
        match cli.befehl_aufloesen() {
            Some(Befehl::Derive {
                channel,
                length,
                count,
                secret_b64,
                ..
            }) => {
                assert_eq!(channel.as_deref(), Some("#chan"));
                assert_eq!(length, 32);
                assert_eq!(count, 1);
                assert!(secret_b64.is_none());
            }
            other => panic!("Derive erwartet, erhalten: {other:?}"),
        }
    }
}
