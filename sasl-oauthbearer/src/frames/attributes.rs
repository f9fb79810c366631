/// Separator between the GS2 header, the key/value entries, and the end of
/// the message (RFC 7628 "kvsep"). A lone kvsep is also the client's
/// acknowledgement of a server failure message.
pub const KVSEP: u8 = 0x01;

/// GS2 header prefix; channel binding is never used by this family.
pub const GS2_PREFIX: &str = "n,";

/// a: the authorization identity inside the GS2 header (RFC 5801).
pub const GS2_AUTHZID_KEY: &str = "a=";

/// auth: carries the HTTP Authorization header value, i.e. the token with
/// its `Bearer ` scheme prefix. Mandatory.
pub const AUTH_KEY: &[u8] = b"auth";

/// The scheme prefix inside the auth value.
pub const BEARER_SCHEME: &[u8] = b"Bearer ";

/// host: name of the server the client believes it is talking to.
pub const HOST_KEY: &[u8] = b"host";

/// port: decimal TCP port, sent by clients of some protocols.
pub const PORT_KEY: &[u8] = b"port";
