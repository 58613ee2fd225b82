//! Fehlertypen fuer den Krypto-Kern
//!
//! Jede Variante entspricht genau einer Fehlerart, die der Aufrufer
//! (Daemon, Protokoll-Handler) unterscheiden koennen muss.

use std::path::PathBuf;

use thiserror::Error;

/// Fehler im Krypto-Kern
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Schluessel-Generierung fehlgeschlagen: {0}")]
    SchluesselGenerierung(String),

    #[error("Kodierung fehlgeschlagen: {0}")]
    Kodierung(String),

    #[error("Verschluesselung fehlgeschlagen: {0}")]
    Verschluesselung(String),

    /// Falsche Passphrase, manipulierter oder kaputter Container.
    /// Traegt absichtlich keine Details.
    #[error("Authentifizierung fehlgeschlagen")]
    Authentifizierung,

    #[error("Zufallsquelle fehlgeschlagen: {0}")]
    Zufall(String),

    #[error("Schluesselableitung nicht initialisiert")]
    NichtInitialisiert,

    #[error("Datei nicht gefunden: {}", .0.display())]
    NichtGefunden(PathBuf),

    #[error("Ungueltiger Schluessel-Algorithmus: {0}")]
    UngueltigerAlgorithmus(String),

    #[error("Key Derivation fehlgeschlagen: {0}")]
    KeyDerivation(String),

    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),
}

pub type CryptoResult<T> = Result<T, CryptoError>;
