//! Post-authentication protection of application payloads.

use std::fmt;

use crate::crypto::cipher::FrameCipher;
use crate::error::Error;

/// Wraps and unwraps application payloads under the key negotiated during
/// the handshake.
///
/// A layer is handed out by a completed `-DH` session and owns the derived
/// key from then on. It keeps no state across frames; every wrapped frame
/// carries its own nonce.
pub struct SecurityLayer {
    cipher: FrameCipher,
}

impl SecurityLayer {
    pub(crate) fn new(cipher: FrameCipher) -> Self {
        Self { cipher }
    }

    /// Seals an outgoing payload. Zero-length payloads pass through
    /// unchanged.
    pub fn wrap(&self, plain: &[u8]) -> Result<Vec<u8>, Error> {
        self.cipher.seal(plain)
    }

    /// Opens an incoming payload. Zero-length payloads pass through
    /// unchanged; anything tampered with fails as [`Error::CryptoOpen`].
    pub fn unwrap(&self, wrapped: &[u8]) -> Result<Vec<u8>, Error> {
        self.cipher.open(wrapped)
    }
}

impl fmt::Debug for SecurityLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecurityLayer")
    }
}
