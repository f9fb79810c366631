//! Authenticated sealing of individual SASL messages under the derived key.
//!
//! AES-128-GCM with a fresh random 96-bit nonce per message; the nonce is
//! carried in front of the ciphertext. Both directions seal under the same
//! key, so nonces must never be derived from a per-side counter.

use std::fmt;

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes128Gcm, Key, Nonce};

use super::DERIVED_KEY_LEN;
use crate::error::Error;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Seals and opens single messages with the key agreed during the
/// handshake. Zero-length messages pass through untouched in both
/// directions.
pub(crate) struct FrameCipher {
    cipher: Aes128Gcm,
}

impl FrameCipher {
    pub fn new(key: &[u8; DERIVED_KEY_LEN]) -> Self {
        let cipher = Aes128Gcm::new(Key::<Aes128Gcm>::from_slice(key));
        Self { cipher }
    }

    pub fn seal(&self, plain: &[u8]) -> Result<Vec<u8>, Error> {
        if plain.is_empty() {
            return Ok(Vec::new());
        }

        let nonce = Aes128Gcm::generate_nonce(&mut OsRng);
        let sealed = self
            .cipher
            .encrypt(&nonce, plain)
            .map_err(|_| Error::CryptoSeal)?;

        let mut frame = Vec::with_capacity(NONCE_LEN + sealed.len());
        frame.extend_from_slice(nonce.as_slice());
        frame.extend_from_slice(&sealed);
        Ok(frame)
    }

    pub fn open(&self, frame: &[u8]) -> Result<Vec<u8>, Error> {
        if frame.is_empty() {
            return Ok(Vec::new());
        }
        if frame.len() < NONCE_LEN + TAG_LEN {
            return Err(Error::CryptoOpen);
        }

        let (nonce, sealed) = frame.split_at(NONCE_LEN);
        self.cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| Error::CryptoOpen)
    }
}

impl fmt::Debug for FrameCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FrameCipher")
    }
}
