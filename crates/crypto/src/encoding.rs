//! Kodierungs-Hilfsfunktionen
//!
//! Kompression (zlib), Base64 und SHA3-256. Alle Funktionen sind rein und
//! ohne Seiteneffekte.

use std::io::{Read, Write};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use sha3::{Digest, Sha3_256};

use crate::error::{CryptoError, CryptoResult};

/// Obergrenze fuer dekomprimierte Daten (oeffentliche Schluessel sind klein)
pub const MAX_DEKOMPRIMIERT: usize = 64 * 1024;

/// Laenge eines SHA3-256 Digests
pub const SHA3_LEN: usize = 32;

/// Komprimiert Daten mit zlib
pub fn compress(data: &[u8]) -> CryptoResult<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| CryptoError::Kodierung(format!("Kompression: {e}")))?;
    encoder
        .finish()
        .map_err(|e| CryptoError::Kodierung(format!("Kompression: {e}")))
}

/// Dekomprimiert zlib-Daten, hoechstens [`MAX_DEKOMPRIMIERT`] Bytes
pub fn decompress(data: &[u8]) -> CryptoResult<Vec<u8>> {
    let mut out = Vec::new();
    ZlibDecoder::new(data)
        .take(MAX_DEKOMPRIMIERT as u64 + 1)
        .read_to_end(&mut out)
        .map_err(|e| CryptoError::Kodierung(format!("Dekompression: {e}")))?;

    if out.len() > MAX_DEKOMPRIMIERT {
        return Err(CryptoError::Kodierung(format!(
            "Dekomprimierte Daten groesser als {MAX_DEKOMPRIMIERT} Bytes"
        )));
    }
    Ok(out)
}

pub fn b64_encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}

pub fn b64_decode(text: &str) -> CryptoResult<Vec<u8>> {
    STANDARD
        .decode(text.trim())
        .map_err(|e| CryptoError::Kodierung(format!("Base64: {e}")))
}

/// SHA3-256 ueber beliebige Daten
pub fn hash_sha3(data: &[u8]) -> [u8; SHA3_LEN] {
    Sha3_256::digest(data).into()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
