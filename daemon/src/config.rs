//! Daemon-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Daemon ohne Konfigurationsdatei
//! lauffaehig ist.

use std::path::PathBuf;

use arsene_crypto::container::{MAX_M_COST_KIB, MAX_P_COST, MAX_T_COST};
use arsene_crypto::{ContainerParams, KeyAlgorithm};
use arsene_observability::{log_format_gueltig, log_level_gueltig, LogFormat};
use serde::{Deserialize, Serialize};

/// Umgebungsvariable fuer den Konfigurationspfad
pub const ENV_CONFIG: &str = "AC_CONFIG";
pub const STANDARD_CONFIG_PFAD: &str = "ac.toml";

/// Vollstaendige Daemon-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Identitaetsschluessel
    pub identitaet: IdentitaetEinstellungen,
    /// Argon2id-Parameter fuer neu geschriebene Container
    pub container: ContainerEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
}

/// Identitaets-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentitaetEinstellungen {
    /// Dateipraefix; `~/` wird zum Home-Verzeichnis aufgeloest
    pub pfad: String,
    /// Algorithmus fuer `keygen` ohne `--algorithm`
    pub algorithmus: KeyAlgorithm,
}

impl Default for IdentitaetEinstellungen {
    fn default() -> Self {
        Self {
            pfad: "~/.ac/ac_id".into(),
            algorithmus: KeyAlgorithm::default(),
        }
    }
}

/// Argon2id-Kosten
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerEinstellungen {
    pub argon2_m_cost_kib: u32,
    pub argon2_t_cost: u32,
    pub argon2_p_cost: u32,
}

impl Default for ContainerEinstellungen {
    fn default() -> Self {
        let params = ContainerParams::default();
        Self {
            argon2_m_cost_kib: params.m_cost_kib,
            argon2_t_cost: params.t_cost,
            argon2_p_cost: params.p_cost,
        }
    }
}

impl ContainerEinstellungen {
    pub fn params(&self) -> ContainerParams {
        ContainerParams {
            m_cost_kib: self.argon2_m_cost_kib,
            t_cost: self.argon2_t_cost,
            p_cost: self.argon2_p_cost,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl LoggingEinstellungen {
    pub fn log_format(&self) -> anyhow::Result<LogFormat> {
        self.format.parse()
    }
}

impl DaemonConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    ///
    /// Wird vor dem Logging aufgerufen; der Hinweis auf eine fehlende Datei
    /// kommt daher als zweiter Rueckgabewert.
    pub fn laden(pfad: &str) -> anyhow::Result<(Self, bool)> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                config
                    .validieren()
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                Ok((config, true))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok((Self::default(), false)),
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Prueft Werte, die serde allein nicht abfangen kann
    pub fn validieren(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            log_level_gueltig(&self.logging.level),
            "Ungueltiger Log-Level '{}' (trace/debug/info/warn/error)",
            self.logging.level
        );
        anyhow::ensure!(
            log_format_gueltig(&self.logging.format),
            "Ungueltiges Log-Format '{}' (text/json)",
            self.logging.format
        );
        let c = &self.container;
        anyhow::ensure!(
            c.argon2_m_cost_kib <= MAX_M_COST_KIB
                && c.argon2_t_cost <= MAX_T_COST
                && c.argon2_p_cost <= MAX_P_COST,
            "Argon2-Parameter ueber der Obergrenze ({MAX_M_COST_KIB} KiB, t={MAX_T_COST}, p={MAX_P_COST})"
        );
        Ok(())
    }

    /// Identitaetspraefix mit aufgeloestem `~/`
    pub fn identitaet_pfad(&self) -> PathBuf {
        home_aufloesen(&self.identitaet.pfad, std::env::var_os("HOME").map(PathBuf::from))
    }
}

fn home_aufloesen(pfad: &str, home: Option<PathBuf>) -> PathBuf {
    match (pfad.strip_prefix("~/"), home) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(pfad),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
