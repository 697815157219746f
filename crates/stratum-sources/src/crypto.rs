//! Hex-encoded AES-GCM payloads.
//!
//! The wire format is `hex(nonce || ciphertext)` with a 12-byte nonce. The key
//! length picks the cipher: 16 bytes for AES-128, 32 bytes for AES-256.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, Nonce, OsRng};
use aes_gcm::{Aes128Gcm, Aes256Gcm};
use stratum_core::{Result, StratumError};

use crate::source::{DecodeOutcome, Decoder};

const NONCE_LEN: usize = 12;

#[derive(Clone)]
enum Cipher {
    Aes128(Box<Aes128Gcm>),
    Aes256(Box<Aes256Gcm>),
}

impl Cipher {
    fn new(key: &[u8]) -> Result<Self> {
        match key.len() {
            16 => Aes128Gcm::new_from_slice(key)
                .map(|c| Cipher::Aes128(Box::new(c)))
                .map_err(|_| invalid_key(key.len())),
            32 => Aes256Gcm::new_from_slice(key)
                .map(|c| Cipher::Aes256(Box::new(c)))
                .map_err(|_| invalid_key(key.len())),
            len => Err(invalid_key(len)),
        }
    }

    fn open(&self, sealed: &[u8]) -> Option<Vec<u8>> {
        let (nonce, body) = sealed.split_at_checked(NONCE_LEN)?;
        match self {
            Cipher::Aes128(cipher) => open_with(cipher.as_ref(), nonce, body),
            Cipher::Aes256(cipher) => open_with(cipher.as_ref(), nonce, body),
        }
    }

    fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        match self {
            Cipher::Aes128(cipher) => seal_with(cipher.as_ref(), plaintext),
            Cipher::Aes256(cipher) => seal_with(cipher.as_ref(), plaintext),
        }
    }
}

fn open_with<C: Aead>(cipher: &C, nonce: &[u8], body: &[u8]) -> Option<Vec<u8>> {
    cipher.decrypt(Nonce::<C>::from_slice(nonce), body).ok()
}

fn seal_with<C: Aead + AeadCore>(cipher: &C, plaintext: &[u8]) -> Result<Vec<u8>> {
    let nonce = C::generate_nonce(&mut OsRng);
    let body = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|_| StratumError::encode_error("AES-GCM encryption failed"))?;

    let mut sealed = nonce.to_vec();
    sealed.extend_from_slice(&body);
    Ok(sealed)
}

fn invalid_key(len: usize) -> StratumError {
    StratumError::internal(format!("AES-GCM key must be 16 or 32 bytes, got {len}"))
}

/// Decrypts hex-encoded AES-GCM payloads.
///
/// Anything that is not valid hex, is too short, or fails authentication is
/// passed through untouched, so a plain file can sit behind the same decoder.
#[derive(Clone)]
pub struct AesGcmHexDecoder {
    cipher: Cipher,
}

impl AesGcmHexDecoder {
    /// Creates a decoder for a raw 16 or 32 byte key.
    pub fn new(key: &[u8]) -> Result<Self> {
        Ok(Self {
            cipher: Cipher::new(key)?,
        })
    }

    /// Creates a decoder for a hex-encoded key.
    pub fn from_hex(key: &str) -> Result<Self> {
        let key = hex::decode(key.trim())
            .map_err(|e| StratumError::internal(format!("invalid hex key: {e}")))?;
        Self::new(&key)
    }
}

impl Decoder for AesGcmHexDecoder {
    fn decode(&self, input: &[u8]) -> DecodeOutcome {
        let opened = hex::decode(input.trim_ascii())
            .ok()
            .and_then(|sealed| self.cipher.open(&sealed));

        match opened {
            Some(plaintext) => DecodeOutcome::Decoded(plaintext),
            None => DecodeOutcome::Passthrough(input.to_vec()),
        }
    }
}

/// Encrypts `plaintext` into the format [`AesGcmHexDecoder`] reads.
pub fn encrypt_to_hex(key: &[u8], plaintext: &[u8]) -> Result<String> {
    Cipher::new(key)?.seal(plaintext).map(hex::encode)
}
