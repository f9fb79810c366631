//! Errors produced while negotiating either mechanism variant.
//!
//! Every error is terminal for the session that produced it: the session
//! moves to its failed state, clears its key material, and rejects further
//! calls with [`Error::ProtocolViolation`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::principal::TokenError;

/// Error produced by session construction or by a `step` call.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No OIDC client identity was supplied to the factory.
    #[error("no OIDC client principal available")]
    NoPrincipal,

    /// The advertised mechanism name is not one this crate implements.
    #[error("unsupported mechanism {0:?}")]
    UnsupportedMechanism(String),

    /// The mechanism name asked for a Diffie-Hellman group size that is not
    /// in the recognized set.
    #[error("unsupported key length: {0}")]
    UnsupportedKeyLength(u32),

    /// A message failed to decode.
    #[error("malformed message: {0}")]
    Malformed(&'static str),

    /// Generating the ephemeral key pair failed.
    #[error("key pair generation failed")]
    CryptoInit(#[source] openssl::error::ErrorStack),

    /// Key agreement against the peer's public key failed.
    #[error("key agreement failed")]
    CryptoAgree(#[source] openssl::error::ErrorStack),

    /// Sealing a message under the derived key failed.
    #[error("failed to seal message")]
    CryptoSeal,

    /// A sealed message did not authenticate under the derived key.
    #[error("failed to open sealed message")]
    CryptoOpen,

    /// The token source could not produce a bearer token, or the validator
    /// could not reach a verdict.
    #[error("bearer token unavailable")]
    TokenUnavailable(#[source] TokenError),

    /// The peer rejected the presented bearer token.
    #[error("authentication failed: {status}")]
    AuthenticationFailed {
        /// Status code from the server's failure message.
        status: FailureStatus,
    },

    /// A message arrived in a state that does not accept it, or the session
    /// was already complete, failed, or disposed.
    #[error("message received in wrong state")]
    ProtocolViolation,
}

/// Status codes a server may carry in its failure message (RFC 7628 §3.2.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStatus {
    /// The request was missing a required field.
    InvalidRequest,
    /// The bearer token was rejected.
    InvalidToken,
    /// The bearer token does not grant access to this resource.
    InsufficientScope,
}

impl FailureStatus {
    /// The wire form of the status code.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureStatus::InvalidRequest => "invalid_request",
            FailureStatus::InvalidToken => "invalid_token",
            FailureStatus::InsufficientScope => "insufficient_scope",
        }
    }
}

impl fmt::Display for FailureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
