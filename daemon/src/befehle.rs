//! Ausfuehrung der CLI-Befehle
//!
//! Jeder Befehl schreibt sein Ergebnis zeilenweise nach `out`; Logs gehen
//! ueber `tracing` nach stderr.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use arsene_crypto::derivation::MAX_AUSGABE;
use arsene_crypto::encoding::{b64_decode, b64_encode};
use arsene_crypto::{ContainerParams, IdentityKey, KeyAlgorithm, SecretBytes, SecretDerivationEngine};
use zeroize::Zeroizing;

use crate::cli::Befehl;
use crate::config::DaemonConfig;

/// Umgebungsvariable mit der Passphrase fuer den privaten Schluessel
pub const ENV_PASSPHRASE: &str = "AC_PASSPHRASE";

/// Fuehrt einen Befehl mit der gegebenen Konfiguration aus
pub fn ausfuehren(befehl: Befehl, config: &DaemonConfig, out: &mut impl Write) -> Result<()> {
    match befehl {
        Befehl::Keygen { algorithm, prefix } => {
            let algorithm = algorithm.unwrap_or(config.identitaet.algorithmus);
            let prefix = prefix.unwrap_or_else(|| config.identitaet_pfad());
            let passphrase = passphrase_aus_env()?;
            keygen(
                algorithm,
                &prefix,
                passphrase.as_bytes(),
                &config.container.params(),
                out,
            )
        }
        Befehl::Show { prefix } => {
            let prefix = prefix.unwrap_or_else(|| config.identitaet_pfad());
            let passphrase = passphrase_aus_env()?;
            show(&prefix, passphrase.as_bytes(), out)
        }
        Befehl::Derive {
            secret_b64,
            channel,
            nick,
            server,
            length,
            count,
        } => {
            let secret = secret_b64
                .as_deref()
                .map(b64_decode)
                .transpose()
                .context("--secret-b64 ist kein gueltiges Base64")?
                .map(SecretBytes::new);
            derive(
                secret.as_ref().map(SecretBytes::as_bytes),
                channel.as_deref().map(str::as_bytes),
                nick.as_deref().map(str::as_bytes),
                server.as_deref().map(str::as_bytes),
                length,
                count,
                out,
            )
        }
    }
}

/// Erzeugt eine Identitaet, speichert sie unter `prefix` und gibt die
/// oeffentliche Zeile aus
pub fn keygen(
    algorithm: KeyAlgorithm,
    prefix: &Path,
    passphrase: &[u8],
    params: &ContainerParams,
    out: &mut impl Write,
) -> Result<()> {
    if let Some(verzeichnis) = prefix.parent().filter(|p| !p.as_os_str().is_empty()) {
        verzeichnis_anlegen(verzeichnis)?;
    }

    let key = IdentityKey::generate(algorithm)
        .with_context(|| format!("{algorithm}-Schluessel konnte nicht erzeugt werden"))?;
    key.persist(prefix, passphrase, params)
        .with_context(|| format!("Identitaet nicht speicherbar unter '{}'", prefix.display()))?;

    tracing::info!(algorithmus = %algorithm, pfad = %prefix.display(), "Neue Identitaet erzeugt");
    writeln!(out, "{}", key.encode_public()?)?;
    Ok(())
}

/// Laedt die Identitaet unter `prefix` und gibt die oeffentliche Zeile aus
pub fn show(prefix: &Path, passphrase: &[u8], out: &mut impl Write) -> Result<()> {
    let key = IdentityKey::restore(prefix, passphrase)
        .with_context(|| format!("Identitaet '{}' nicht ladbar", prefix.display()))?;
    writeln!(out, "{}", key.encode_public()?)?;
    Ok(())
}

/// Initialisiert eine Ableitungs-Engine und gibt `count` Schluessel zu je
/// `length` Bytes Base64-kodiert aus
pub fn derive(
    secret: Option<&[u8]>,
    channel: Option<&[u8]>,
    nick: Option<&[u8]>,
    server: Option<&[u8]>,
    length: usize,
    count: usize,
    out: &mut impl Write,
) -> Result<()> {
    anyhow::ensure!(
        length <= MAX_AUSGABE,
        "Schluessellaenge {length} ueber dem Maximum von {MAX_AUSGABE} Bytes"
    );

    let mut engine = SecretDerivationEngine::new();
    engine
        .init(secret, channel, nick, server)
        .context("Ableitung konnte nicht initialisiert werden")?;

    let mut puffer = SecretBytes::zeroed(length);
    for _ in 0..count {
        engine.derive(puffer.as_mut_bytes())?;
        writeln!(out, "{}", b64_encode(puffer.as_bytes()))?;
    }
    tracing::debug!(anzahl = count, laenge = length, "Sitzungsschluessel abgeleitet");
    Ok(())
}

fn passphrase_aus_env() -> Result<Zeroizing<String>> {
    std::env::var(ENV_PASSPHRASE)
        .map(Zeroizing::new)
        .with_context(|| format!("{ENV_PASSPHRASE} ist nicht gesetzt"))
}

fn verzeichnis_anlegen(pfad: &Path) -> Result<()> {
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder
        .create(pfad)
        .with_context(|| format!("Verzeichnis '{}' nicht anlegbar", pfad.display()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
