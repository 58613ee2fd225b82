//! # arsene-crypto
//!
//! Krypto-Kern des Arsene-Daemons: Identitaetsschluessel und
//! Sitzungsschluessel-Ableitung fuer verschluesselte Chat-Kanaele.
//!
//! ## Module
//! - `container` - Passphrasen-geschuetzter Container (Argon2id + XChaCha20-Poly1305)
//! - `identity` - RSA/ECDSA-P384/Ed25519 Identitaetsschluessel, Datei-Persistenz
//! - `derivation` - PBKDF2/HKDF-Ableitung gebunden an Server, Nick und Channel
//! - `encoding` - zlib, Base64, SHA3-256
//! - `types` - Gemeinsame Typen (KeyAlgorithm, SecretBytes)
//! - `error` - Fehlertypen
//!
//! Alle Operationen sind synchron; der Kern haelt keinen globalen Zustand.

pub mod container;
pub mod derivation;
pub mod encoding;
pub mod error;
pub mod identity;
pub mod types;

#[cfg(test)]
mod test_rng;

// Bequeme Re-Exports
pub use container::{ContainerParams, EncryptedContainer};
pub use derivation::SecretDerivationEngine;
pub use error::{CryptoError, CryptoResult};
pub use identity::{IdentityKey, PublicKeyRecord, RSA_MODULUS_BITS};
pub use types::{KeyAlgorithm, SecretBytes};
