#![deny(missing_docs, missing_debug_implementations)]

//! SASL OAUTHBEARER mechanism family for OpenID Connect clients and servers.
//!
//! Two mechanism variants are provided. `OAUTHBEARER` (RFC 7628) carries an
//! OAuth 2.0 bearer token in cleartext, relying on the transport for
//! confidentiality. `OAUTHBEARER-DH4096` prefixes the token exchange with an
//! ephemeral Diffie-Hellman handshake and seals every following SASL message
//! under the derived AES-128 key; after a successful exchange the negotiated
//! key is handed off as a [`SecurityLayer`] that wraps application payloads.
//!
//! The crate implements only the challenge/response state machines and the
//! message codecs. Obtaining tokens from an OIDC session and deciding whether
//! a presented token is acceptable are the caller's concern, injected through
//! the [`OidcClientPrincipal`] and [`TokenValidator`] traits.

pub mod acceptor;
pub mod client;
pub mod error;
pub mod mechanism;
pub mod principal;
pub mod security_layer;

mod crypto;
mod frames;

pub use acceptor::OAuthBearerAcceptor;
pub use client::OAuthBearerClient;
pub use error::{Error, FailureStatus};
pub use mechanism::{advertised_mechanisms, Mechanism};
pub use principal::{OidcClientPrincipal, TokenError, TokenValidation, TokenValidator};
pub use security_layer::SecurityLayer;

/// Outcome of driving a session one message further.
///
/// Every variant that carries bytes expects the caller to deliver them to the
/// peer; the variant itself tells the caller whether to keep the conversation
/// open afterwards.
#[derive(Debug)]
pub enum Step {
    /// Bytes to deliver to the peer; the exchange continues.
    Respond(Vec<u8>),

    /// The exchange concluded successfully.
    ///
    /// `output`, when present, is the success indication that still has to
    /// reach the peer (a server signals success with an empty message; a
    /// client has nothing left to send).
    Complete {
        /// Final bytes to deliver, if any.
        output: Option<Vec<u8>>,
    },

    /// The server rejected the authentication.
    ///
    /// `response` is the single acknowledgement byte (sealed when a key
    /// exchange preceded it) that must be delivered before the conversation
    /// is torn down.
    Rejected {
        /// Acknowledgement bytes to deliver to the server.
        response: Vec<u8>,
        /// Status code carried by the server's failure message.
        status: FailureStatus,
    },
}
