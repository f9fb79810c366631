//! Mechanism names and the selection rules shared by both sides.

use crate::error::Error;

/// Wire name of the cleartext variant.
pub const OAUTHBEARER: &str = "OAUTHBEARER";

/// Wire name of the 4096-bit Diffie-Hellman variant.
pub const OAUTHBEARER_DH4096: &str = "OAUTHBEARER-DH4096";

/// Infix separating the base name from the key length.
const DH_INFIX: &str = "-DH";

/// Diffie-Hellman group sizes with a registered mechanism name.
const RECOGNIZED_KEY_BITS: &[u32] = &[4096];

/// Mechanism names a server advertises, in preference order.
pub fn advertised_mechanisms() -> &'static [&'static str] {
    &[OAUTHBEARER, OAUTHBEARER_DH4096]
}

/// The mechanism variant a session negotiates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mechanism {
    /// Bearer token exchanged in cleartext.
    Plain,

    /// Ephemeral Diffie-Hellman handshake first; every later message is
    /// sealed under the derived key.
    Dh {
        /// Size of the Diffie-Hellman group in bits.
        key_bits: u32,
    },
}

impl Mechanism {
    /// The wire name of this variant.
    pub fn name(&self) -> String {
        match self {
            Mechanism::Plain => OAUTHBEARER.to_string(),
            Mechanism::Dh { key_bits } => format!("{}{}{}", OAUTHBEARER, DH_INFIX, key_bits),
        }
    }

    /// Resolves an advertised mechanism name.
    ///
    /// A `-DH` suffix that is not a decimal number is not a name from this
    /// family; a decimal outside the recognized set is a key length this
    /// crate refuses to negotiate.
    pub fn from_name(name: &str) -> Result<Self, Error> {
        if name == OAUTHBEARER {
            return Ok(Mechanism::Plain);
        }

        if let Some(digits) = name
            .strip_prefix(OAUTHBEARER)
            .and_then(|rest| rest.strip_prefix(DH_INFIX))
        {
            let key_bits: u32 = digits
                .parse()
                .map_err(|_| Error::UnsupportedMechanism(name.to_string()))?;
            return if RECOGNIZED_KEY_BITS.contains(&key_bits) {
                Ok(Mechanism::Dh { key_bits })
            } else {
                Err(Error::UnsupportedKeyLength(key_bits))
            };
        }

        Err(Error::UnsupportedMechanism(name.to_string()))
    }
}
