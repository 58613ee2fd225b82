//! Ableitung von Sitzungsschluesseln aus einem geteilten Geheimnis
//!
//! ## Ablauf
//! 1. `init`: Seed (geteiltes Geheimnis oder 8192 Zufallsbytes) per
//!    PBKDF2-HMAC-SHA3-256 (32768 Runden, 256 Byte Zufalls-Salt) auf 32 Bytes
//!    strecken, dazu den Binding-Digest `SHA3-256(server ':' nick ':' channel)`
//!    bilden.
//! 2. `derive`: pro Aufruf frisches 256-Byte-Salt, HKDF-SHA3-256 mit dem
//!    gestreckten Schluessel als IKM und dem Binding-Digest als Info.
//!
//! Beide Salts werden nach Gebrauch verworfen. Zwei Engines leiten daher nie
//! dasselbe Material ab, auch nicht bei gleichem Geheimnis und Kontext; die
//! Engine ist ein lokaler Zufalls-Strecker, kein Schluesselaustausch.

use std::fmt;
use std::io::{self, Read};

use hkdf::Hkdf;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use sha3::Sha3_256;

use crate::encoding::{hash_sha3, SHA3_LEN};
use crate::error::{CryptoError, CryptoResult};
use crate::types::SecretBytes;

/// Groesse des Zufalls-Seeds ohne geteiltes Geheimnis
pub const SEED_LEN: usize = 8192;
pub const SALT_LEN: usize = 256;
pub const PBKDF2_ITERATIONEN: u32 = 32768;
pub const STRETCHED_KEY_LEN: usize = 32;
/// HKDF liefert hoechstens 255 Bloecke pro Expand
pub const MAX_AUSGABE: usize = 255 * SHA3_LEN;

/// Kontext einer initialisierten Engine
struct DerivationContext {
    // Wird nach dem Strecken nicht mehr gelesen, lebt aber so lange wie der Kontext
    _seed: SecretBytes,
    channel: Option<Vec<u8>>,
    nick: Option<Vec<u8>>,
    server: Option<Vec<u8>>,
    stretched_key: SecretBytes,
    binding_digest: [u8; SHA3_LEN],
}

/// Engine fuer Sitzungsschluessel
///
/// Zustaende: nicht initialisiert -> initialisiert (nach erfolgreichem
/// `init`). Nicht fuer gleichzeitige Nutzung ohne externe Sperre gedacht.
#[derive(Default)]
pub struct SecretDerivationEngine {
    context: Option<DerivationContext>,
}

impl SecretDerivationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.context.is_some()
    }

    /// Initialisiert die Engine mit der OS-Zufallsquelle
    ///
    /// Ohne `shared_secret` wird ein Seed aus 8192 Zufallsbytes gezogen.
    /// Schlaegt `init` fehl, bleibt der bisherige Zustand erhalten.
    pub fn init(
        &mut self,
        shared_secret: Option<&[u8]>,
        channel: Option<&[u8]>,
        nick: Option<&[u8]>,
        server: Option<&[u8]>,
    ) -> CryptoResult<()> {
        self.init_with_rng(&mut OsRng, shared_secret, channel, nick, server)
    }

    pub fn init_with_rng<R: RngCore + CryptoRng>(
        &mut self,
        rng: &mut R,
        shared_secret: Option<&[u8]>,
        channel: Option<&[u8]>,
        nick: Option<&[u8]>,
        server: Option<&[u8]>,
    ) -> CryptoResult<()> {
        let seed = match shared_secret {
            Some(secret) => SecretBytes::from(secret),
            None => {
                let mut seed = SecretBytes::zeroed(SEED_LEN);
                zufall(rng, seed.as_mut_bytes())?;
                seed
            }
        };

        let mut salt = [0u8; SALT_LEN];
        zufall(rng, &mut salt)?;

        let mut stretched_key = SecretBytes::zeroed(STRETCHED_KEY_LEN);
        pbkdf2::pbkdf2_hmac::<Sha3_256>(
            seed.as_bytes(),
            &salt,
            PBKDF2_ITERATIONEN,
            stretched_key.as_mut_bytes(),
        );

        let binding_digest = binding_digest(server, nick, channel);

        tracing::debug!(
            geteiltes_geheimnis = shared_secret.is_some(),
            seed_len = seed.len(),
            "Schluesselableitung initialisiert"
        );

        self.context = Some(DerivationContext {
            _seed: seed,
            channel: channel.map(<[u8]>::to_vec),
            nick: nick.map(<[u8]>::to_vec),
            server: server.map(<[u8]>::to_vec),
            stretched_key,
            binding_digest,
        });
        Ok(())
    }

    /// Fuellt `out` vollstaendig mit frisch abgeleitetem Schluesselmaterial
    pub fn derive(&self, out: &mut [u8]) -> CryptoResult<()> {
        self.derive_with_rng(&mut OsRng, out)
    }

    pub fn derive_with_rng<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        out: &mut [u8],
    ) -> CryptoResult<()> {
        let context = self.context.as_ref().ok_or(CryptoError::NichtInitialisiert)?;
        if out.len() > MAX_AUSGABE {
            return Err(CryptoError::KeyDerivation(format!(
                "Angefordert {} Bytes, maximal {MAX_AUSGABE}",
                out.len()
            )));
        }

        let mut salt = [0u8; SALT_LEN];
        zufall(rng, &mut salt)?;

        let hk = Hkdf::<Sha3_256>::new(Some(&salt), context.stretched_key.as_bytes());
        hk.expand(&context.binding_digest, out)
            .map_err(|e| CryptoError::KeyDerivation(e.to_string()))
    }

    pub fn binding_digest(&self) -> CryptoResult<&[u8; SHA3_LEN]> {
        self.context
            .as_ref()
            .map(|c| &c.binding_digest)
            .ok_or(CryptoError::NichtInitialisiert)
    }

    pub fn channel(&self) -> Option<&[u8]> {
        self.context.as_ref()?.channel.as_deref()
    }

    pub fn nick(&self) -> Option<&[u8]> {
        self.context.as_ref()?.nick.as_deref()
    }

    pub fn server(&self) -> Option<&[u8]> {
        self.context.as_ref()?.server.as_deref()
    }
}

/// Jeder `read` liefert frisches Material, hoechstens [`MAX_AUSGABE`] Bytes
impl Read for SecretDerivationEngine {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(MAX_AUSGABE);
        self.derive(&mut buf[..n]).map_err(io::Error::other)?;
        Ok(n)
    }
}

impl fmt::Debug for SecretDerivationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretDerivationEngine")
            .field("initialisiert", &self.is_initialized())
            .finish_non_exhaustive()
    }
}

/// `SHA3-256(server ':' nick ':' channel)`, fehlende Felder zaehlen als leer
pub fn binding_digest(
    server: Option<&[u8]>,
    nick: Option<&[u8]>,
    channel: Option<&[u8]>,
) -> [u8; SHA3_LEN] {
    let server = server.unwrap_or_default();
    let nick = nick.unwrap_or_default();
    let channel = channel.unwrap_or_default();

    let mut input = Vec::with_capacity(server.len() + nick.len() + channel.len() + 2);
    input.extend_from_slice(server);
    input.push(b':');
    input.extend_from_slice(nick);
    input.push(b':');
    input.extend_from_slice(channel);
    hash_sha3(&input)
}

fn zufall<R: RngCore + CryptoRng>(rng: &mut R, dest: &mut [u8]) -> CryptoResult<()> {
    rng.try_fill_bytes(dest)
        .map_err(|e| CryptoError::Zufall(e.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
