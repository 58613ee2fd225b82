//! Passphrasen-geschuetzter Container fuer private Schluessel
//!
//! Der Schluessel wird per Argon2id aus der Passphrase und einem frischen
//! Salt abgeleitet, der Inhalt mit XChaCha20-Poly1305 verschluesselt. Das
//! PEM-Label geht als AAD in den Auth-Tag ein.
//!
//! ## Format (PEM-Body, big-endian)
//! ```text
//! [version(1)] [m_cost(4)] [t_cost(4)] [p_cost(4)] [salt(16)] [nonce(24)] [ciphertext + auth_tag(16)]
//! ```
//!
//! Jede Verschluesselung zieht ein neues Salt und damit einen neuen
//! Schluessel; eine Nonce wiederholt sich unter demselben Schluessel nie.

use argon2::{Algorithm, Argon2, Params, Version};
use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    Key, XChaCha20Poly1305, XNonce,
};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::error::{CryptoError, CryptoResult};
use crate::types::SecretBytes;

pub const CONTAINER_VERSION: u8 = 1;
pub const SALT_LEN: usize = 16;
pub const NONCE_LEN: usize = 24;
pub const TAG_LEN: usize = 16;
const KEY_LEN: usize = 32;
const HEADER_LEN: usize = 1 + 4 + 4 + 4 + SALT_LEN + NONCE_LEN;

// Obergrenzen fuer Argon2id; die Werte beim Entschluesseln stammen aus der Datei
pub const MAX_M_COST_KIB: u32 = 256 * 1024;
pub const MAX_T_COST: u32 = 16;
pub const MAX_P_COST: u32 = 16;

/// Argon2id-Parameter eines Containers
///
/// Standardwerte wie beim Passwort-Hashing (OWASP):
/// - Speicher: 64 MiB
/// - Iterationen: 3
/// - Parallelismus: 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerParams {
    pub m_cost_kib: u32,
    pub t_cost: u32,
    pub p_cost: u32,
}

impl Default for ContainerParams {
    fn default() -> Self {
        Self {
            m_cost_kib: 64 * 1024,
            t_cost: 3,
            p_cost: 1,
        }
    }
}

impl ContainerParams {
    fn argon2(&self) -> Result<Argon2<'static>, argon2::Error> {
        let params = Params::new(self.m_cost_kib, self.t_cost, self.p_cost, Some(KEY_LEN))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    fn innerhalb_grenzen(&self) -> bool {
        self.m_cost_kib <= MAX_M_COST_KIB && self.t_cost <= MAX_T_COST && self.p_cost <= MAX_P_COST
    }
}

/// Verschluesselter Container (Label + Salt + Nonce + Ciphertext)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedContainer {
    label: String,
    params: ContainerParams,
    salt: [u8; SALT_LEN],
    nonce: [u8; NONCE_LEN],
    /// Ciphertext inkl. 16 Bytes Auth-Tag (angehaengt)
    ciphertext: Vec<u8>,
}

impl EncryptedContainer {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn params(&self) -> &ContainerParams {
        &self.params
    }

    pub fn nonce(&self) -> &[u8; NONCE_LEN] {
        &self.nonce
    }

    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    /// Serialisiert den Body (ohne Label)
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.ciphertext.len());
        out.push(CONTAINER_VERSION);
        out.extend_from_slice(&self.params.m_cost_kib.to_be_bytes());
        out.extend_from_slice(&self.params.t_cost.to_be_bytes());
        out.extend_from_slice(&self.params.p_cost.to_be_bytes());
        out.extend_from_slice(&self.salt);
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Deserialisiert einen Body. Jeder Formatfehler ist `Authentifizierung`.
    pub fn from_bytes(label: &str, bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() < HEADER_LEN + TAG_LEN || bytes[0] != CONTAINER_VERSION {
            return Err(CryptoError::Authentifizierung);
        }
        let be_u32 = |at: usize| {
            let mut buf = [0u8; 4];
            buf.copy_from_slice(&bytes[at..at + 4]);
            u32::from_be_bytes(buf)
        };
        let params = ContainerParams {
            m_cost_kib: be_u32(1),
            t_cost: be_u32(5),
            p_cost: be_u32(9),
        };

        let mut salt = [0u8; SALT_LEN];
        salt.copy_from_slice(&bytes[13..13 + SALT_LEN]);
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&bytes[13 + SALT_LEN..HEADER_LEN]);

        Ok(Self {
            label: label.to_string(),
            params,
            salt,
            nonce,
            ciphertext: bytes[HEADER_LEN..].to_vec(),
        })
    }

    /// PEM-Block mit dem Label als Tag
    pub fn to_pem(&self) -> String {
        pem::encode(&pem::Pem::new(self.label.clone(), self.to_bytes()))
    }

    pub fn from_pem(text: &str) -> CryptoResult<Self> {
        let block = pem::parse(text).map_err(|_| CryptoError::Authentifizierung)?;
        Self::from_bytes(block.tag(), block.contents())
    }
}

/// Verschluesselt `plaintext` mit einem aus `passphrase` abgeleiteten Schluessel
pub fn encrypt<R: RngCore + CryptoRng>(
    rng: &mut R,
    label: &str,
    plaintext: &[u8],
    passphrase: &[u8],
    params: &ContainerParams,
) -> CryptoResult<EncryptedContainer> {
    if !params.innerhalb_grenzen() {
        return Err(CryptoError::Verschluesselung(format!(
            "Argon2-Parameter ueber der Obergrenze ({MAX_M_COST_KIB} KiB, t={MAX_T_COST}, p={MAX_P_COST})"
        )));
    }

    let mut salt = [0u8; SALT_LEN];
    rng.try_fill_bytes(&mut salt)
        .map_err(|e| CryptoError::Verschluesselung(format!("Salt: {e}")))?;
    let mut nonce = [0u8; NONCE_LEN];
    rng.try_fill_bytes(&mut nonce)
        .map_err(|e| CryptoError::Verschluesselung(format!("Nonce: {e}")))?;

    let argon2 = params
        .argon2()
        .map_err(|e| CryptoError::Verschluesselung(format!("Argon2-Parameter: {e}")))?;
    let mut key = SecretBytes::zeroed(KEY_LEN);
    argon2
        .hash_password_into(passphrase, &salt, key.as_mut_bytes())
        .map_err(|e| CryptoError::Verschluesselung(format!("Argon2: {e}")))?;

    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
    let ciphertext = cipher
        .encrypt(
            XNonce::from_slice(&nonce),
            Payload {
                msg: plaintext,
                aad: label.as_bytes(),
            },
        )
        .map_err(|e| CryptoError::Verschluesselung(e.to_string()))?;

    Ok(EncryptedContainer {
        label: label.to_string(),
        params: *params,
        salt,
        nonce,
        ciphertext,
    })
}

/// Entschluesselt einen Container
///
/// Falsche Passphrase, manipulierte Daten und unsinnige Parameter liefern
/// alle denselben Fehler.
pub fn decrypt(container: &EncryptedContainer, passphrase: &[u8]) -> CryptoResult<SecretBytes> {
    if !container.params.innerhalb_grenzen() {
        return Err(CryptoError::Authentifizierung);
    }
    let argon2 = container
        .params
        .argon2()
        .map_err(|_| CryptoError::Authentifizierung)?;

    let mut key = SecretBytes::zeroed(KEY_LEN);
    argon2
        .hash_password_into(passphrase, &container.salt, key.as_mut_bytes())
        .map_err(|_| CryptoError::Authentifizierung)?;

    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
    let mut plaintext = cipher
        .decrypt(
            XNonce::from_slice(&container.nonce),
            Payload {
                msg: &container.ciphertext,
                aad: container.label.as_bytes(),
            },
        )
        .map_err(|_| CryptoError::Authentifizierung)?;

    let secret = SecretBytes::from(plaintext.as_slice());
    plaintext.zeroize();
    Ok(secret)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_rng::KaputteQuelle;
    use rand::rngs::OsRng;

    const LEICHT: ContainerParams = ContainerParams {
        m_cost_kib: 64,
        t_cost: 1,
        p_cost: 1,
    };

    fn verschluesselt(text: &[u8]) -> EncryptedContainer {
        encrypt(&mut OsRng, "EC25519 PRIVATE KEY", text, b"correct", &LEICHT).unwrap()
    }

    #[test]
    fn verschluesseln_und_entschluesseln() {
        let container = verschluesselt(b"geheimer Schluessel");
        assert_eq!(container.label(), "EC25519 PRIVATE KEY");

        let klartext = decrypt(&container, b"correct").unwrap();
        assert_eq!(klartext.as_bytes(), b"geheimer Schluessel");
    }

    #[test]
    fn falsche_passphrase_wird_abgelehnt() {
        let container = verschluesselt(b"geheim");
        let err = decrypt(&container, b"wrong").unwrap_err();
        assert!(matches!(err, CryptoError::Authentifizierung));
    }

    #[test]
    fn salt_und_nonce_sind_frisch() {
        let a = verschluesselt(b"geheim");
        let b = verschluesselt(b"geheim");
        assert_ne!(a.salt(), b.salt());
        assert_ne!(a.nonce(), b.nonce());
        assert_ne!(a.to_bytes(), b.to_bytes());
    }

    #[test]
    fn manipulierter_ciphertext_schlaegt_fehl() {
        let container = verschluesselt(b"geheim");
        let mut body = container.to_bytes();
        let last = body.len() - 1;
        body[last] ^= 0x01;

        let kaputt = EncryptedContainer::from_bytes(container.label(), &body).unwrap();
        assert!(matches!(
            decrypt(&kaputt, b"correct"),
            Err(CryptoError::Authentifizierung)
        ));
    }

    #[test]
    fn anderes_label_schlaegt_fehl() {
        let container = verschluesselt(b"geheim");
        let umetikettiert =
            EncryptedContainer::from_bytes("RSA PRIVATE KEY", &container.to_bytes()).unwrap();
        assert!(matches!(
            decrypt(&umetikettiert, b"correct"),
            Err(CryptoError::Authentifizierung)
        ));
    }

    #[test]
    fn zu_kurzer_body_ist_authentifizierungsfehler() {
        let err = EncryptedContainer::from_bytes("X", &[CONTAINER_VERSION; 20]).unwrap_err();
        assert!(matches!(err, CryptoError::Authentifizierung));
    }

    #[test]
    fn falsche_version_ist_authentifizierungsfehler() {
        let mut body = verschluesselt(b"geheim").to_bytes();
        body[0] = 9;
        let err = EncryptedContainer::from_bytes("EC25519 PRIVATE KEY", &body).unwrap_err();
        assert!(matches!(err, CryptoError::Authentifizierung));
    }

    #[test]
    fn ueberzogene_parameter_werden_abgelehnt() {
        let mut body = verschluesselt(b"geheim").to_bytes();
        body[1..5].copy_from_slice(&u32::MAX.to_be_bytes());
        let container = EncryptedContainer::from_bytes("EC25519 PRIVATE KEY", &body).unwrap();
        assert!(matches!(
            decrypt(&container, b"correct"),
            Err(CryptoError::Authentifizierung)
        ));
    }

    #[test]
    fn parameter_knapp_ueber_der_grenze_werden_abgelehnt() {
        let body = verschluesselt(b"geheim").to_bytes();
        for (offset, wert) in [(1, MAX_M_COST_KIB + 1), (5, MAX_T_COST + 1), (9, MAX_P_COST + 1)] {
            let mut body = body.clone();
            body[offset..offset + 4].copy_from_slice(&wert.to_be_bytes());
            let container = EncryptedContainer::from_bytes("EC25519 PRIVATE KEY", &body).unwrap();
            assert!(matches!(
                decrypt(&container, b"correct"),
                Err(CryptoError::Authentifizierung)
            ));
        }
    }

    #[test]
    fn verschluesseln_mit_ueberzogenen_parametern() {
        let params = ContainerParams {
            t_cost: MAX_T_COST + 1,
            ..LEICHT
        };
        let err = encrypt(&mut OsRng, "X", b"geheim", b"pw", &params).unwrap_err();
        assert!(matches!(err, CryptoError::Verschluesselung(_)));
    }

    #[test]
    fn pem_roundtrip() {
        let container = verschluesselt(b"geheim");
        let pem = container.to_pem();
        assert!(pem.starts_with("-----BEGIN EC25519 PRIVATE KEY-----"));

        let geparst = EncryptedContainer::from_pem(&pem).unwrap();
        assert_eq!(geparst, container);
        assert_eq!(decrypt(&geparst, b"correct").unwrap().as_bytes(), b"geheim");
    }

    #[test]
    fn kaputtes_pem_ist_authentifizierungsfehler() {
        let err = EncryptedContainer::from_pem("kein pem").unwrap_err();
        assert!(matches!(err, CryptoError::Authentifizierung));
    }

    #[test]
    fn kaputte_zufallsquelle_gibt_verschluesselungsfehler() {
        let err = encrypt(&mut KaputteQuelle, "X", b"geheim", b"pw", &LEICHT).unwrap_err();
        assert!(matches!(err, CryptoError::Verschluesselung(_)));
    }

    #[test]
    fn standard_parameter_funktionieren() {
        let params = ContainerParams::default();
        let container = encrypt(&mut OsRng, "X", b"geheim", b"pw", &params).unwrap();
        assert_eq!(container.params().m_cost_kib, 64 * 1024);
        assert_eq!(decrypt(&container, b"pw").unwrap().as_bytes(), b"geheim");
    }
}
