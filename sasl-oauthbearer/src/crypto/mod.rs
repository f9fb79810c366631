//! Key exchange and frame sealing primitives backing the `-DH` variant.

pub(crate) mod cipher;
pub(crate) mod dh;

/// Length of the symmetric key: the leading bytes of the shared secret are
/// used directly as an AES-128 key.
pub(crate) const DERIVED_KEY_LEN: usize = 16;
