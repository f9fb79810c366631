//! Interfaces to the surrounding OIDC session.
//!
//! The state machines never talk to an authorization server themselves. A
//! client session asks its [`OidcClientPrincipal`] for the current access
//! token whenever it builds its initial response, and a server session hands
//! every presented token to an injected [`TokenValidator`].

use std::sync::Arc;

/// An OIDC client identity that can produce a current access token.
///
/// Implementations may be shared across sessions and must therefore be
/// internally thread-safe. `fetch_token` may block on a token refresh; the
/// caller owns any timeout around it.
pub trait OidcClientPrincipal: Send + Sync {
    /// Stable identifier of this identity, e.g. the OIDC client id.
    fn identifier(&self) -> &str;

    /// The authorization identity to act as. May be empty, in which case the
    /// server derives the identity from the token itself.
    fn authorization_id(&self) -> &str;

    /// The current access token as opaque bytes. The token is never parsed
    /// by this crate.
    fn fetch_token(&self) -> Result<Vec<u8>, TokenError>;
}

/// Why a token source or validator could not answer.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// A retry against the collaborator may succeed later. The session that
    /// observed the error is still terminally failed.
    #[error("token collaborator temporarily unavailable: {0}")]
    Transient(String),

    /// Retrying will not help.
    #[error("token collaborator failed: {0}")]
    Permanent(String),
}

/// Verdict of a server-side token validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenValidation {
    /// The token is acceptable for this server.
    Valid,
    /// The token was rejected.
    InvalidToken,
    /// The token is genuine but does not cover this resource.
    InsufficientScope,
}

/// Server-side policy deciding whether a presented bearer token is
/// acceptable for the named server.
pub trait TokenValidator: Send + Sync {
    /// Judges `token` for access to `server_name`.
    fn validate(&self, token: &[u8], server_name: &str) -> Result<TokenValidation, TokenError>;
}

impl<T> TokenValidator for Arc<T>
where
    T: TokenValidator + ?Sized,
{
    fn validate(&self, token: &[u8], server_name: &str) -> Result<TokenValidation, TokenError> {
        self.as_ref().validate(token, server_name)
    }
}
