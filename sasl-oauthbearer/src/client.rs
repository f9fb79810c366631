//! Client side of the OAUTHBEARER exchange.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace, warn};
use zeroize::Zeroizing;

use crate::crypto::cipher::FrameCipher;
use crate::crypto::dh::DhKeyExchange;
use crate::error::Error;
use crate::frames::attributes::KVSEP;
use crate::frames::oauthbearer::{ClientResponse, ServerErrorResponse};
use crate::mechanism::Mechanism;
use crate::principal::OidcClientPrincipal;
use crate::security_layer::SecurityLayer;
use crate::Step;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClientState {
    Start,
    ExpectServerKey,
    ExpectOutcome,
    Complete,
    Failed,
    Disposed,
}

/// A single client-side authentication session.
///
/// The session is driven by feeding it the server's messages through
/// [`step`](OAuthBearerClient::step) and delivering whatever it returns.
/// Messages must arrive in protocol order; anything else fails the session
/// permanently. Key material is cleared on failure, on
/// [`dispose`](OAuthBearerClient::dispose), and on drop.
pub struct OAuthBearerClient {
    mechanism: Mechanism,
    principal: Arc<dyn OidcClientPrincipal>,
    authorization_id: String,
    server_name: String,
    state: ClientState,
    exchange: Option<DhKeyExchange>,
    cipher: Option<FrameCipher>,
    security_layer: Option<SecurityLayer>,
    complete: bool,
}

impl OAuthBearerClient {
    /// Creates the session for the first recognized name in an advertised
    /// mechanism list.
    ///
    /// Only the first entry is considered; servers advertise in preference
    /// order and the client never falls back to a later entry.
    pub fn select(
        mechanisms: &[&str],
        principal: Option<Arc<dyn OidcClientPrincipal>>,
        server_name: impl Into<String>,
    ) -> Result<Self, Error> {
        let server_name = server_name.into();
        trace!(
            ?mechanisms,
            server_name = %server_name,
            "creating OAUTHBEARER SASL client"
        );

        let principal = principal.ok_or(Error::NoPrincipal)?;
        let first = mechanisms
            .first()
            .ok_or_else(|| Error::UnsupportedMechanism(String::new()))?;
        let mechanism = Mechanism::from_name(first)?;
        Ok(Self::new(mechanism, principal, server_name))
    }

    /// Creates a session for an already resolved mechanism.
    ///
    /// `server_name` must not be empty; it is echoed back to the server in
    /// the `host` entry of the initial response.
    pub fn new(
        mechanism: Mechanism,
        principal: Arc<dyn OidcClientPrincipal>,
        server_name: impl Into<String>,
    ) -> Self {
        let authorization_id = principal.authorization_id().to_string();
        Self {
            mechanism,
            principal,
            authorization_id,
            server_name: server_name.into(),
            state: ClientState::Start,
            exchange: None,
            cipher: None,
            security_layer: None,
            complete: false,
        }
    }

    /// The mechanism this session negotiates.
    pub fn mechanism(&self) -> Mechanism {
        self.mechanism
    }

    /// Whether the exchange has concluded successfully.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Drives the session one message further.
    ///
    /// `input` is the server's latest message, or `None` before anything has
    /// been received. Any error leaves the session failed with its key
    /// material cleared.
    pub fn step(&mut self, input: Option<&[u8]>) -> Result<Step, Error> {
        let result = match self.state {
            ClientState::Start => self.initial_step(),
            ClientState::ExpectServerKey => self.key_exchange_step(input),
            ClientState::ExpectOutcome => self.outcome_step(input),
            ClientState::Complete | ClientState::Failed | ClientState::Disposed => {
                Err(Error::ProtocolViolation)
            }
        };
        if result.is_err() {
            self.fail();
        }
        result
    }

    /// The security layer negotiated by a completed `-DH` session.
    ///
    /// Returns `None` for the cleartext variant, before completion, or when
    /// the layer was already taken.
    pub fn take_security_layer(&mut self) -> Option<SecurityLayer> {
        self.security_layer.take()
    }

    /// Releases the session and clears all key material. Safe to call in
    /// any state, any number of times.
    pub fn dispose(&mut self) {
        self.clear_key_material();
        self.state = ClientState::Disposed;
    }

    fn initial_step(&mut self) -> Result<Step, Error> {
        match self.mechanism {
            Mechanism::Plain => {
                let payload = self.initial_response()?;
                self.state = ClientState::ExpectOutcome;
                Ok(Step::Respond(payload))
            }
            Mechanism::Dh { key_bits } => {
                let exchange = DhKeyExchange::generate(key_bits)?;
                let public_key = exchange.public_key().to_vec();
                self.exchange = Some(exchange);
                self.state = ClientState::ExpectServerKey;
                debug!(key_bits, "generated ephemeral key pair");
                Ok(Step::Respond(public_key))
            }
        }
    }

    fn key_exchange_step(&mut self, input: Option<&[u8]>) -> Result<Step, Error> {
        let server_public = match input {
            Some(bytes) if !bytes.is_empty() => bytes,
            _ => return Err(Error::ProtocolViolation),
        };
        let exchange = self.exchange.take().ok_or(Error::ProtocolViolation)?;
        let key = exchange.agree(server_public)?;
        let cipher = FrameCipher::new(&key);

        let payload = self.initial_response()?;
        let sealed = cipher.seal(&payload)?;
        self.cipher = Some(cipher);
        self.state = ClientState::ExpectOutcome;
        debug!("key exchange complete");
        Ok(Step::Respond(sealed))
    }

    fn outcome_step(&mut self, input: Option<&[u8]>) -> Result<Step, Error> {
        match input {
            // an empty (or absent) message is the success indication
            None => self.succeed(),
            Some(bytes) if bytes.is_empty() => self.succeed(),
            Some(bytes) => {
                let plain = match &self.cipher {
                    Some(cipher) => cipher.open(bytes)?,
                    None => bytes.to_vec(),
                };
                let failure = ServerErrorResponse::from_bytes(&plain)?;

                let ack = match &self.cipher {
                    Some(cipher) => cipher.seal(&[KVSEP])?,
                    None => vec![KVSEP],
                };
                self.clear_key_material();
                self.state = ClientState::Failed;
                warn!(status = %failure.status, "server rejected authentication");
                Ok(Step::Rejected {
                    response: ack,
                    status: failure.status,
                })
            }
        }
    }

    fn succeed(&mut self) -> Result<Step, Error> {
        self.complete = true;
        self.state = ClientState::Complete;
        if let Some(cipher) = self.cipher.take() {
            self.security_layer = Some(SecurityLayer::new(cipher));
        }
        debug!(server_name = %self.server_name, "authentication complete");
        Ok(Step::Complete { output: None })
    }

    fn initial_response(&self) -> Result<Vec<u8>, Error> {
        let token = Zeroizing::new(
            self.principal
                .fetch_token()
                .map_err(Error::TokenUnavailable)?,
        );
        Ok(ClientResponse::encode(
            &self.authorization_id,
            &token,
            &self.server_name,
        ))
    }

    fn fail(&mut self) {
        self.clear_key_material();
        if self.state != ClientState::Disposed {
            self.state = ClientState::Failed;
        }
    }

    fn clear_key_material(&mut self) {
        self.exchange = None;
        self.cipher = None;
        self.security_layer = None;
    }

    #[cfg(test)]
    pub(crate) fn key_material_cleared(&self) -> bool {
        self.exchange.is_none() && self.cipher.is_none() && self.security_layer.is_none()
    }
}

impl Drop for OAuthBearerClient {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for OAuthBearerClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthBearerClient")
            .field("mechanism", &self.mechanism)
            .field("principal", &self.principal.identifier())
            .field("server_name", &self.server_name)
            .field("state", &self.state)
            .finish()
    }
}
