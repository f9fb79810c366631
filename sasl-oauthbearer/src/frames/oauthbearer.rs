//! Codec for the OAUTHBEARER initial response and the server failure
//! message (RFC 7628 §3.1, §3.2.2).

use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize};

use super::attributes::{
    AUTH_KEY, BEARER_SCHEME, GS2_AUTHZID_KEY, GS2_PREFIX, HOST_KEY, KVSEP, PORT_KEY,
};
use crate::error::{Error, FailureStatus};

/// Decoded form of the client's initial response.
///
/// Only `auth` is mandatory on the wire; its absence is not a decode error
/// but an authentication problem the server answers with `invalid_request`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ClientResponse {
    pub authorization_id: String,
    pub auth: Option<Vec<u8>>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl ClientResponse {
    /// Builds the initial response a client sends: GS2 header, the token
    /// under the `Bearer` scheme, and the server name.
    pub fn encode(authorization_id: &str, token: &[u8], host: &str) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(
            GS2_PREFIX.len()
                + GS2_AUTHZID_KEY.len()
                + authorization_id.len()
                + AUTH_KEY.len()
                + BEARER_SCHEME.len()
                + token.len()
                + HOST_KEY.len()
                + host.len()
                + 8,
        );

        buf.put_slice(GS2_PREFIX.as_bytes());
        if !authorization_id.is_empty() {
            buf.put_slice(GS2_AUTHZID_KEY.as_bytes());
            buf.put_slice(authorization_id.as_bytes());
        }
        buf.put_u8(b',');
        buf.put_u8(KVSEP);

        buf.put_slice(AUTH_KEY);
        buf.put_u8(b'=');
        buf.put_slice(BEARER_SCHEME);
        buf.put_slice(token);
        buf.put_u8(KVSEP);

        buf.put_slice(HOST_KEY);
        buf.put_u8(b'=');
        buf.put_slice(host.as_bytes());
        buf.put_u8(KVSEP);

        buf.put_u8(KVSEP);
        buf.to_vec()
    }

    /// Parses an initial response.
    ///
    /// Unknown keys are skipped; keys are case-sensitive. The GS2 header,
    /// the `=` inside every entry, and the terminating kvsep are all
    /// required.
    pub fn decode(input: &[u8]) -> Result<Self, Error> {
        let rest = input
            .strip_prefix(GS2_PREFIX.as_bytes())
            .ok_or(Error::Malformed("missing GS2 header"))?;

        let (authorization_id, rest) = match rest.strip_prefix(GS2_AUTHZID_KEY.as_bytes()) {
            Some(after) => {
                let comma = after
                    .iter()
                    .position(|b| *b == b',')
                    .ok_or(Error::Malformed("unterminated GS2 header"))?;
                let authzid = std::str::from_utf8(&after[..comma])
                    .map_err(|_| Error::Malformed("authorization id is not UTF-8"))?;
                (authzid.to_string(), &after[comma + 1..])
            }
            None => {
                let after = rest
                    .strip_prefix(b",")
                    .ok_or(Error::Malformed("unterminated GS2 header"))?;
                (String::new(), after)
            }
        };

        let mut rest = rest
            .strip_prefix(&[KVSEP][..])
            .ok_or(Error::Malformed("missing separator after GS2 header"))?;

        let mut response = ClientResponse {
            authorization_id,
            auth: None,
            host: None,
            port: None,
        };

        loop {
            let sep = rest
                .iter()
                .position(|b| *b == KVSEP)
                .ok_or(Error::Malformed("missing terminating separator"))?;
            let entry = &rest[..sep];
            rest = &rest[sep + 1..];

            if entry.is_empty() {
                // the terminating kvsep closes the message
                return match rest.is_empty() {
                    true => Ok(response),
                    false => Err(Error::Malformed("data after terminating separator")),
                };
            }

            let eq = entry
                .iter()
                .position(|b| *b == b'=')
                .ok_or(Error::Malformed("entry without '='"))?;
            let (key, value) = (&entry[..eq], &entry[eq + 1..]);

            if key == AUTH_KEY {
                response.auth = Some(value.to_vec());
            } else if key == HOST_KEY {
                let host = std::str::from_utf8(value)
                    .map_err(|_| Error::Malformed("host is not UTF-8"))?;
                response.host = Some(host.to_string());
            } else if key == PORT_KEY {
                let port = std::str::from_utf8(value)
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .ok_or(Error::Malformed("port is not a decimal number"))?;
                response.port = Some(port);
            }
        }
    }

    /// The bearer token carried by the `auth` entry, without its scheme
    /// prefix. `None` when the entry is absent or carries another scheme.
    pub fn bearer_token(&self) -> Option<&[u8]> {
        self.auth.as_deref()?.strip_prefix(BEARER_SCHEME)
    }
}

/// The server's failure message: a JSON object in which only `status` is
/// mandatory (RFC 7628 §3.2.2).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ServerErrorResponse {
    pub status: FailureStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    #[serde(
        default,
        rename = "openid-configuration",
        skip_serializing_if = "Option::is_none"
    )]
    pub openid_configuration: Option<String>,
}

impl ServerErrorResponse {
    pub fn new(status: FailureStatus) -> Self {
        Self {
            status,
            scope: None,
            openid_configuration: None,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        serde_json::to_vec(self).map_err(|_| Error::Malformed("failure message not serializable"))
    }

    pub fn from_bytes(input: &[u8]) -> Result<Self, Error> {
        serde_json::from_slice(input).map_err(|_| Error::Malformed("failure message is not valid JSON"))
    }
}
