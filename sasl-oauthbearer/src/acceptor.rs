//! Server side of the OAUTHBEARER exchange.

use std::fmt;

use tracing::{debug, trace, warn};

use crate::crypto::cipher::FrameCipher;
use crate::crypto::dh::DhKeyExchange;
use crate::error::{Error, FailureStatus};
use crate::frames::attributes::KVSEP;
use crate::frames::oauthbearer::{ClientResponse, ServerErrorResponse};
use crate::mechanism::Mechanism;
use crate::principal::{TokenValidation, TokenValidator};
use crate::security_layer::SecurityLayer;
use crate::Step;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AcceptorState {
    ExpectClientKey,
    ExpectInitial,
    ExpectAck(FailureStatus),
    Complete,
    Failed,
    Disposed,
}

/// A single server-side authentication session.
///
/// Constructed through [`OAuthBearerAcceptor::builder`]. Every client
/// message is fed to [`step`](OAuthBearerAcceptor::step); the verdict on the
/// presented token comes from the injected [`TokenValidator`]. A rejected
/// authentication runs the RFC 7628 failure dialogue (failure message, then
/// the client's lone `\x01` acknowledgement) before the session terminates.
pub struct OAuthBearerAcceptor<V> {
    mechanism: Mechanism,
    validator: V,
    server_name: String,
    state: AcceptorState,
    exchange: Option<DhKeyExchange>,
    cipher: Option<FrameCipher>,
    security_layer: Option<SecurityLayer>,
    complete: bool,
}

impl<V> OAuthBearerAcceptor<V>
where
    V: TokenValidator,
{
    /// Starts building an acceptor for the given validator and server name.
    pub fn builder(validator: V, server_name: impl Into<String>) -> Builder<V> {
        Builder {
            validator,
            server_name: server_name.into(),
            mechanism: Mechanism::Plain,
        }
    }

    fn new(mechanism: Mechanism, validator: V, server_name: String) -> Result<Self, Error> {
        trace!(
            mechanism = %mechanism.name(),
            server_name = %server_name,
            "creating OAUTHBEARER SASL acceptor"
        );

        // the key pair must exist before the client's public key arrives
        let (exchange, state) = match mechanism {
            Mechanism::Plain => (None, AcceptorState::ExpectInitial),
            Mechanism::Dh { key_bits } => (
                Some(DhKeyExchange::generate(key_bits)?),
                AcceptorState::ExpectClientKey,
            ),
        };

        Ok(Self {
            mechanism,
            validator,
            server_name,
            state,
            exchange,
            cipher: None,
            security_layer: None,
            complete: false,
        })
    }

    /// The mechanism this session negotiates.
    pub fn mechanism(&self) -> Mechanism {
        self.mechanism
    }

    /// Whether the exchange has concluded successfully.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Drives the session one client message further.
    ///
    /// Any error leaves the session failed with its key material cleared;
    /// in particular a rejected authentication surfaces as
    /// [`Error::AuthenticationFailed`] once the client has acknowledged the
    /// failure message.
    pub fn step(&mut self, input: &[u8]) -> Result<Step, Error> {
        let result = match self.state {
            AcceptorState::ExpectClientKey => self.key_exchange_step(input),
            AcceptorState::ExpectInitial => self.initial_step(input),
            AcceptorState::ExpectAck(status) => self.ack_step(input, status),
            AcceptorState::Complete | AcceptorState::Failed | AcceptorState::Disposed => {
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
        self.state = AcceptorState::Disposed;
    }

    fn key_exchange_step(&mut self, input: &[u8]) -> Result<Step, Error> {
        let exchange = self.exchange.take().ok_or(Error::ProtocolViolation)?;
        let public_key = exchange.public_key().to_vec();
        let key = exchange.agree(input)?;
        self.cipher = Some(FrameCipher::new(&key));
        self.state = AcceptorState::ExpectInitial;
        debug!("key exchange complete");
        Ok(Step::Respond(public_key))
    }

    fn initial_step(&mut self, input: &[u8]) -> Result<Step, Error> {
        let plain = self.open(input)?;
        let response = ClientResponse::decode(&plain)?;

        let token = match response.bearer_token() {
            Some(token) => token.to_vec(),
            None => return self.reject(FailureStatus::InvalidRequest),
        };

        match self.validator.validate(&token, &self.server_name) {
            Ok(TokenValidation::Valid) => {
                self.complete = true;
                self.state = AcceptorState::Complete;
                if let Some(cipher) = self.cipher.take() {
                    self.security_layer = Some(SecurityLayer::new(cipher));
                }
                debug!(
                    authorization_id = %response.authorization_id,
                    "authentication complete"
                );
                Ok(Step::Complete {
                    output: Some(Vec::new()),
                })
            }
            Ok(TokenValidation::InvalidToken) => self.reject(FailureStatus::InvalidToken),
            Ok(TokenValidation::InsufficientScope) => {
                self.reject(FailureStatus::InsufficientScope)
            }
            Err(err) => Err(Error::TokenUnavailable(err)),
        }
    }

    fn ack_step(&mut self, input: &[u8], status: FailureStatus) -> Result<Step, Error> {
        let plain = self.open(input)?;
        if plain == [KVSEP] {
            Err(Error::AuthenticationFailed { status })
        } else {
            Err(Error::ProtocolViolation)
        }
    }

    fn reject(&mut self, status: FailureStatus) -> Result<Step, Error> {
        let body = ServerErrorResponse::new(status).to_bytes()?;
        let sealed = self.seal(&body)?;
        self.state = AcceptorState::ExpectAck(status);
        warn!(%status, "rejecting authentication");
        Ok(Step::Respond(sealed))
    }

    fn seal(&self, plain: &[u8]) -> Result<Vec<u8>, Error> {
        match &self.cipher {
            Some(cipher) => cipher.seal(plain),
            None => Ok(plain.to_vec()),
        }
    }

    fn open(&self, input: &[u8]) -> Result<Vec<u8>, Error> {
        match &self.cipher {
            Some(cipher) => cipher.open(input),
            None => Ok(input.to_vec()),
        }
    }

    fn fail(&mut self) {
        self.clear_key_material();
        if self.state != AcceptorState::Disposed {
            self.state = AcceptorState::Failed;
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

impl<V> fmt::Debug for OAuthBearerAcceptor<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthBearerAcceptor")
            .field("mechanism", &self.mechanism)
            .field("server_name", &self.server_name)
            .field("state", &self.state)
            .finish()
    }
}

/// Configures and constructs an [`OAuthBearerAcceptor`].
pub struct Builder<V> {
    validator: V,
    server_name: String,
    mechanism: Mechanism,
}

impl<V> Builder<V>
where
    V: TokenValidator,
{
    /// Selects the mechanism variant to accept. Defaults to the cleartext
    /// variant.
    pub fn mechanism(mut self, mechanism: Mechanism) -> Self {
        self.mechanism = mechanism;
        self
    }

    /// Builds the acceptor. For a `-DH` variant this generates the
    /// ephemeral key pair.
    pub fn build(self) -> Result<OAuthBearerAcceptor<V>, Error> {
        OAuthBearerAcceptor::new(self.mechanism, self.validator, self.server_name)
    }
}

impl<V> fmt::Debug for Builder<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("mechanism", &self.mechanism)
            .field("server_name", &self.server_name)
            .finish()
    }
}
