//! Ephemeral finite-field Diffie-Hellman over the RFC 3526 MODP groups.
//!
//! Public keys travel in X.509 `SubjectPublicKeyInfo` form so that either
//! end of the exchange can be implemented on any stack that understands
//! standard key encodings.

use std::fmt;

use openssl::bn::BigNum;
use openssl::derive::Deriver;
use openssl::dh::Dh;
use openssl::error::ErrorStack;
use openssl::pkey::{PKey, Private};
use zeroize::Zeroizing;

use super::DERIVED_KEY_LEN;
use crate::error::Error;

/// A freshly generated ephemeral key pair, consumed by the key agreement.
pub(crate) struct DhKeyExchange {
    keypair: PKey<Private>,
    public_der: Vec<u8>,
}

impl DhKeyExchange {
    /// Generates an ephemeral key pair on the group named by `key_bits`.
    pub fn generate(key_bits: u32) -> Result<Self, Error> {
        let prime = match key_bits {
            4096 => BigNum::get_rfc3526_prime_4096().map_err(Error::CryptoInit)?,
            other => return Err(Error::UnsupportedKeyLength(other)),
        };
        let generator = BigNum::from_u32(2).map_err(Error::CryptoInit)?;

        let params = Dh::from_pqg(prime, None, generator).map_err(Error::CryptoInit)?;
        let keypair = PKey::from_dh(params.generate_key().map_err(Error::CryptoInit)?)
            .map_err(Error::CryptoInit)?;
        let public_der = keypair.public_key_to_der().map_err(Error::CryptoInit)?;

        Ok(Self {
            keypair,
            public_der,
        })
    }

    /// This side's public key, X.509-encoded.
    pub fn public_key(&self) -> &[u8] {
        &self.public_der
    }

    /// Completes the agreement against the peer's X.509-encoded public key
    /// and returns the symmetric key taken from the leading bytes of the
    /// shared secret. Consumes the private key.
    pub fn agree(self, peer_public: &[u8]) -> Result<Zeroizing<[u8; DERIVED_KEY_LEN]>, Error> {
        let peer = PKey::public_key_from_der(peer_public).map_err(Error::CryptoAgree)?;

        let mut deriver = Deriver::new(&self.keypair).map_err(Error::CryptoAgree)?;
        deriver.set_peer(&peer).map_err(Error::CryptoAgree)?;
        let secret = Zeroizing::new(deriver.derive_to_vec().map_err(Error::CryptoAgree)?);

        if secret.len() < DERIVED_KEY_LEN {
            return Err(Error::CryptoAgree(ErrorStack::get()));
        }
        let mut key = Zeroizing::new([0u8; DERIVED_KEY_LEN]);
        key.copy_from_slice(&secret[..DERIVED_KEY_LEN]);
        Ok(key)
    }
}

impl fmt::Debug for DhKeyExchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DhKeyExchange")
            .field("public_der_len", &self.public_der.len())
            .finish()
    }
}
