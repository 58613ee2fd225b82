//! Gemeinsame Typen fuer den Krypto-Kern

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::error::CryptoError;

/// Algorithmus eines Identitaetsschluessels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyAlgorithm {
    Rsa,
    #[serde(rename = "ecdsa")]
    EcdsaP384,
    #[default]
    Ed25519,
}

impl KeyAlgorithm {
    pub const ALLE: [KeyAlgorithm; 3] = [Self::Rsa, Self::EcdsaP384, Self::Ed25519];

    /// Label am Anfang der oeffentlichen Schluesselzeile
    pub fn public_label(self) -> &'static str {
        match self {
            Self::Rsa => "ac-rsa",
            Self::EcdsaP384 => "ac-ecdsa",
            Self::Ed25519 => "ac-25519",
        }
    }

    /// PEM-Tag des verschluesselten privaten Schluessels
    pub fn pem_label(self) -> &'static str {
        match self {
            Self::Rsa => "RSA PRIVATE KEY",
            Self::EcdsaP384 => "ECDSA PRIVATE KEY",
            Self::Ed25519 => "EC25519 PRIVATE KEY",
        }
    }

    /// Liest das Label einer oeffentlichen Schluesselzeile
    pub fn from_public_label(label: &str) -> Result<Self, CryptoError> {
        match label {
            "ac-rsa" => Ok(Self::Rsa),
            "ac-ecdsa" => Ok(Self::EcdsaP384),
            "ac-25519" | "ac-ec25519" => Ok(Self::Ed25519),
            other => Err(CryptoError::UngueltigerAlgorithmus(other.to_string())),
        }
    }

    /// Liest den PEM-Tag eines privaten Schluessels
    pub fn from_pem_label(tag: &str) -> Result<Self, CryptoError> {
        Self::ALLE
            .into_iter()
            .find(|alg| alg.pem_label() == tag)
            .ok_or_else(|| CryptoError::UngueltigerAlgorithmus(tag.to_string()))
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Rsa => "rsa",
            Self::EcdsaP384 => "ecdsa-p384",
            Self::Ed25519 => "ed25519",
        };
        f.write_str(name)
    }
}

impl FromStr for KeyAlgorithm {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rsa" | "ac-rsa" => Ok(Self::Rsa),
            "ecdsa" | "ecdsa-p384" | "p384" | "ac-ecdsa" => Ok(Self::EcdsaP384),
            "ed25519" | "ec25519" | "25519" | "ac-25519" | "ac-ec25519" => Ok(Self::Ed25519),
            _ => Err(CryptoError::UngueltigerAlgorithmus(s.to_string())),
        }
    }
}

/// Numerische Tags wie im alten Protokoll (0 = RSA, 1 = ECDSA, 2 = Ed25519)
impl TryFrom<u8> for KeyAlgorithm {
    type Error = CryptoError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(Self::Rsa),
            1 => Ok(Self::EcdsaP384),
            2 => Ok(Self::Ed25519),
            other => Err(CryptoError::UngueltigerAlgorithmus(format!("Tag {other}"))),
        }
    }
}

/// Sicherer Schluessel-Container (wird beim Drop genullt)
#[derive(Clone, PartialEq, Eq)]
pub struct SecretBytes(Vec<u8>);

impl Drop for SecretBytes {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretBytes([REDACTED] {} bytes)", self.0.len())
    }
}

impl SecretBytes {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Erzeugt einen genullten Puffer der Laenge `len`
    pub fn zeroed(len: usize) -> Self {
        Self(vec![0u8; len])
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        &mut self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&[u8]> for SecretBytes {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
