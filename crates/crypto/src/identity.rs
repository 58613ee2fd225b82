//! Langzeit-Identitaetsschluessel (RSA, ECDSA P-384, Ed25519)
//!
//! Jede Identitaet liegt als Datei-Paar auf der Platte:
//! - `<prefix>.pub`: eine Zeile `<label> <base64(zlib(DER-PKIX))>`
//! - `<prefix>`: PEM-Block mit dem verschluesselten privaten Schluessel
//!   (siehe [`crate::container`])
//!
//! Beide Dateien sind nur fuer den Besitzer lesbar.

use std::fmt;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::{OsRng, StdRng};
use rand::{CryptoRng, RngCore, SeedableRng};
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey};
// rsa, p384 und ed25519-dalek teilen sich dieselbe pkcs8/spki-Version
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};
use zeroize::Zeroize;

use crate::container::{self, ContainerParams, EncryptedContainer};
use crate::encoding::{b64_decode, b64_encode, compress, decompress};
use crate::error::{CryptoError, CryptoResult};
use crate::types::{KeyAlgorithm, SecretBytes};

/// Modulus-Groesse fuer neue RSA-Schluessel
pub const RSA_MODULUS_BITS: usize = 2048;
const RSA_SEED_LEN: usize = 32;
const ED25519_SEED_LEN: usize = 32;
const P384_SCALAR_LEN: usize = 48;
// Wahrscheinlichkeit eines ungueltigen P-384-Skalars ist ~2^-190
const P384_MAX_VERSUCHE: usize = 8;

const PUB_MODUS: u32 = 0o600;
const PRIV_MODUS: u32 = 0o700;

/// Identitaetsschluessel, genau ein privater Schluessel pro Algorithmus
pub enum IdentityKey {
    Rsa(Box<RsaPrivateKey>),
    EcdsaP384(p384::SecretKey),
    Ed25519(SigningKey),
}

impl IdentityKey {
    /// Generiert einen neuen Schluessel mit der OS-Zufallsquelle
    pub fn generate(algorithm: KeyAlgorithm) -> CryptoResult<Self> {
        Self::generate_with_rng(algorithm, &mut OsRng)
    }

    pub fn generate_with_rng<R: RngCore + CryptoRng>(
        algorithm: KeyAlgorithm,
        rng: &mut R,
    ) -> CryptoResult<Self> {
        let key = match algorithm {
            KeyAlgorithm::Rsa => Self::Rsa(Box::new(generate_rsa(rng)?)),
            KeyAlgorithm::EcdsaP384 => Self::EcdsaP384(generate_p384(rng)?),
            KeyAlgorithm::Ed25519 => {
                let mut seed = [0u8; ED25519_SEED_LEN];
                rng.try_fill_bytes(&mut seed)
                    .map_err(|e| CryptoError::SchluesselGenerierung(e.to_string()))?;
                let key = SigningKey::from_bytes(&seed);
                seed.zeroize();
                Self::Ed25519(key)
            }
        };
        tracing::debug!(algorithmus = %algorithm, "Identitaetsschluessel generiert");
        Ok(key)
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            Self::Rsa(_) => KeyAlgorithm::Rsa,
            Self::EcdsaP384(_) => KeyAlgorithm::EcdsaP384,
            Self::Ed25519(_) => KeyAlgorithm::Ed25519,
        }
    }

    /// Oeffentlicher Schluessel als DER (PKIX SubjectPublicKeyInfo)
    pub fn public_der(&self) -> CryptoResult<Vec<u8>> {
        let doc = match self {
            Self::Rsa(key) => key.to_public_key().to_public_key_der(),
            Self::EcdsaP384(key) => key.public_key().to_public_key_der(),
            Self::Ed25519(key) => key.verifying_key().to_public_key_der(),
        }
        .map_err(|e| CryptoError::Kodierung(format!("PKIX: {e}")))?;
        Ok(doc.as_bytes().to_vec())
    }

    /// Privater Schluessel im algorithmus-spezifischen DER
    ///
    /// RSA: PKCS#1, ECDSA: SEC1, Ed25519: PKCS#8.
    pub fn private_der(&self) -> CryptoResult<SecretBytes> {
        let der = match self {
            Self::Rsa(key) => key
                .to_pkcs1_der()
                .map(|doc| SecretBytes::from(doc.as_bytes()))
                .map_err(|e| e.to_string()),
            Self::EcdsaP384(key) => key
                .to_sec1_der()
                .map(|der| SecretBytes::from(der.as_slice()))
                .map_err(|e| e.to_string()),
            Self::Ed25519(key) => key
                .to_pkcs8_der()
                .map(|doc| SecretBytes::from(doc.as_bytes()))
                .map_err(|e| e.to_string()),
        };
        der.map_err(CryptoError::Kodierung)
    }

    /// Baut einen Schluessel aus seinem privaten DER wieder auf
    pub fn from_private_der(algorithm: KeyAlgorithm, der: &[u8]) -> CryptoResult<Self> {
        let key = match algorithm {
            KeyAlgorithm::Rsa => <RsaPrivateKey as DecodeRsaPrivateKey>::from_pkcs1_der(der)
                .map(|key| Self::Rsa(Box::new(key)))
                .map_err(|e| e.to_string()),
            KeyAlgorithm::EcdsaP384 => p384::SecretKey::from_sec1_der(der)
                .map(Self::EcdsaP384)
                .map_err(|e| e.to_string()),
            KeyAlgorithm::Ed25519 => <SigningKey as DecodePrivateKey>::from_pkcs8_der(der)
                .map(Self::Ed25519)
                .map_err(|e| e.to_string()),
        };
        key.map_err(|e| CryptoError::Kodierung(format!("{algorithm}: {e}")))
    }

    pub fn public_record(&self) -> CryptoResult<PublicKeyRecord> {
        Ok(PublicKeyRecord {
            algorithm: self.algorithm(),
            der: self.public_der()?,
        })
    }

    /// Oeffentliche Schluesselzeile `<label> <base64(zlib(DER))>`
    pub fn encode_public(&self) -> CryptoResult<String> {
        self.public_record()?.encode()
    }

    /// Verschluesselter privater Schluessel als PEM-Block
    pub fn encode_private(
        &self,
        passphrase: &[u8],
        params: &ContainerParams,
    ) -> CryptoResult<String> {
        self.encode_private_with_rng(&mut OsRng, passphrase, params)
    }

    pub fn encode_private_with_rng<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        passphrase: &[u8],
        params: &ContainerParams,
    ) -> CryptoResult<String> {
        let der = self.private_der()?;
        let container = container::encrypt(
            rng,
            self.algorithm().pem_label(),
            der.as_bytes(),
            passphrase,
            params,
        )?;
        Ok(container.to_pem())
    }

    /// Entschluesselt einen PEM-Block aus [`IdentityKey::encode_private`]
    pub fn decode_private(pem_text: &str, passphrase: &[u8]) -> CryptoResult<Self> {
        let container = EncryptedContainer::from_pem(pem_text)?;
        let algorithm = KeyAlgorithm::from_pem_label(container.label())?;
        let der = container::decrypt(&container, passphrase)?;
        Self::from_private_der(algorithm, der.as_bytes())
    }

    /// Schreibt `<prefix>.pub` und `<prefix>`
    ///
    /// Beide Dateien werden angelegt bzw. abgeschnitten. Schlaegt das
    /// Schreiben der zweiten Datei fehl, bleibt die erste liegen.
    pub fn persist(
        &self,
        prefix: impl AsRef<Path>,
        passphrase: &[u8],
        params: &ContainerParams,
    ) -> CryptoResult<()> {
        let prefix = prefix.as_ref();
        let public = self.encode_public()?;
        let private = self.encode_private(passphrase, params)?;

        let pub_pfad = pub_path(prefix);
        datei_schreiben(&pub_pfad, public.as_bytes(), PUB_MODUS)?;
        datei_schreiben(prefix, private.as_bytes(), PRIV_MODUS)?;

        tracing::debug!(
            algorithmus = %self.algorithm(),
            pfad = %prefix.display(),
            "Identitaet gespeichert"
        );
        Ok(())
    }

    /// Laedt `<prefix>.pub` und `<prefix>` und entschluesselt den privaten Schluessel
    pub fn restore(prefix: impl AsRef<Path>, passphrase: &[u8]) -> CryptoResult<Self> {
        let prefix = prefix.as_ref();
        let public = datei_lesen(&pub_path(prefix))?;
        let private = datei_lesen(prefix)?;

        let record = PublicKeyRecord::parse(&public)?;
        let container = EncryptedContainer::from_pem(&private)?;
        let algorithm = KeyAlgorithm::from_pem_label(container.label())?;
        if algorithm != record.algorithm {
            return Err(CryptoError::Kodierung(format!(
                "Algorithmus passt nicht: {} (pub) vs. {} (privat)",
                record.algorithm, algorithm
            )));
        }

        let der = container::decrypt(&container, passphrase)?;
        let key = Self::from_private_der(algorithm, der.as_bytes())?;
        if key.public_der()? != record.der {
            return Err(CryptoError::Kodierung(
                "Oeffentlicher Schluessel passt nicht zum privaten".to_string(),
            ));
        }

        tracing::debug!(algorithmus = %algorithm, pfad = %prefix.display(), "Identitaet geladen");
        Ok(key)
    }
}

impl fmt::Debug for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdentityKey {{ algorithm: {}, key: [REDACTED] }}", self.algorithm())
    }
}

/// Oeffentliche Form einer Identitaet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyRecord {
    pub algorithm: KeyAlgorithm,
    /// PKIX SubjectPublicKeyInfo
    pub der: Vec<u8>,
}

impl PublicKeyRecord {
    pub fn encode(&self) -> CryptoResult<String> {
        let packed = compress(&self.der)?;
        Ok(format!("{} {}", self.algorithm.public_label(), b64_encode(&packed)))
    }

    /// Parst eine Schluesselzeile und prueft das DER gegen den Algorithmus
    pub fn parse(line: &str) -> CryptoResult<Self> {
        let (label, body) = line
            .trim()
            .split_once(' ')
            .ok_or_else(|| CryptoError::Kodierung("Schluesselzeile ohne Trenner".to_string()))?;
        let algorithm = KeyAlgorithm::from_public_label(label)?;
        let der = decompress(&b64_decode(body)?)?;

        let record = Self { algorithm, der };
        record.validate()?;
        Ok(record)
    }

    fn validate(&self) -> CryptoResult<()> {
        let ergebnis = match self.algorithm {
            KeyAlgorithm::Rsa => RsaPublicKey::from_public_key_der(&self.der).map(|_| ()),
            KeyAlgorithm::EcdsaP384 => p384::PublicKey::from_public_key_der(&self.der).map(|_| ()),
            KeyAlgorithm::Ed25519 => VerifyingKey::from_public_key_der(&self.der).map(|_| ()),
        };
        ergebnis.map_err(|e| CryptoError::Kodierung(format!("{}: {e}", self.algorithm)))
    }
}

/// RSA mit fehlbarer Zufallsquelle
///
/// `RsaPrivateKey::new` kann Fehler der Quelle nicht melden; nur der Seed
/// kommt aus `rng`, die Primzahlsuche laeuft auf einem daraus geseedeten
/// CSPRNG.
fn generate_rsa<R: RngCore + CryptoRng>(rng: &mut R) -> CryptoResult<RsaPrivateKey> {
    let mut seed = [0u8; RSA_SEED_LEN];
    rng.try_fill_bytes(&mut seed)
        .map_err(|e| CryptoError::SchluesselGenerierung(e.to_string()))?;
    let mut csprng = StdRng::from_seed(seed);
    seed.zeroize();

    RsaPrivateKey::new(&mut csprng, RSA_MODULUS_BITS)
        .map_err(|e| CryptoError::SchluesselGenerierung(e.to_string()))
}

fn generate_p384<R: RngCore + CryptoRng>(rng: &mut R) -> CryptoResult<p384::SecretKey> {
    let mut scalar = [0u8; P384_SCALAR_LEN];
    for _ in 0..P384_MAX_VERSUCHE {
        rng.try_fill_bytes(&mut scalar)
            .map_err(|e| CryptoError::SchluesselGenerierung(e.to_string()))?;
        // Null oder >= Gruppenordnung: neu ziehen
        if let Ok(key) = p384::SecretKey::from_slice(&scalar) {
            scalar.zeroize();
            return Ok(key);
        }
    }
    scalar.zeroize();
    Err(CryptoError::SchluesselGenerierung(
        "Kein gueltiger P-384-Skalar gezogen".to_string(),
    ))
}

fn pub_path(prefix: &Path) -> PathBuf {
    let mut pfad = prefix.as_os_str().to_owned();
    pfad.push(".pub");
    PathBuf::from(pfad)
}

#[cfg_attr(not(unix), allow(unused_variables))]
fn datei_schreiben(pfad: &Path, inhalt: &[u8], modus: u32) -> CryptoResult<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(modus);
    }

    let mut datei = options.open(pfad)?;
    // mode() greift nur beim Anlegen
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        datei.set_permissions(std::fs::Permissions::from_mode(modus))?;
    }
    datei.write_all(inhalt)?;
    datei.sync_all()?;
    Ok(())
}

fn datei_lesen(pfad: &Path) -> CryptoResult<String> {
    std::fs::read_to_string(pfad).map_err(|e| match e.kind() {
        ErrorKind::NotFound => CryptoError::NichtGefunden(pfad.to_path_buf()),
        ErrorKind::InvalidData => {
            CryptoError::Kodierung(format!("{} ist keine Textdatei", pfad.display()))
        }
        _ => CryptoError::Io(e),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
