//! Full client/server exchanges for both mechanism variants.

use std::sync::Arc;

use sasl_oauthbearer::{
    Error, FailureStatus, Mechanism, OAuthBearerAcceptor, OAuthBearerClient, OidcClientPrincipal,
    Step, TokenError, TokenValidation, TokenValidator,
};

static TOKEN: &[u8] = b"abc.def.ghi";
static SERVER_NAME: &str = "mail.example.org";

struct TestPrincipal;

impl OidcClientPrincipal for TestPrincipal {
    fn identifier(&self) -> &str {
        "test-client"
    }

    fn authorization_id(&self) -> &str {
        ""
    }

    fn fetch_token(&self) -> Result<Vec<u8>, TokenError> {
        Ok(TOKEN.to_vec())
    }
}

struct TestValidator {
    verdict: TokenValidation,
}

impl TokenValidator for TestValidator {
    fn validate(&self, token: &[u8], server_name: &str) -> Result<TokenValidation, TokenError> {
        assert_eq!(token, TOKEN);
        assert_eq!(server_name, SERVER_NAME);
        Ok(self.verdict)
    }
}

fn client(mechanisms: &[&str]) -> OAuthBearerClient {
    OAuthBearerClient::select(mechanisms, Some(Arc::new(TestPrincipal)), SERVER_NAME).unwrap()
}

fn acceptor(
    mechanism: Mechanism,
    verdict: TokenValidation,
) -> OAuthBearerAcceptor<Arc<TestValidator>> {
    // validators are shared across sessions in a real listener
    OAuthBearerAcceptor::builder(Arc::new(TestValidator { verdict }), SERVER_NAME)
        .mechanism(mechanism)
        .build()
        .unwrap()
}

fn respond(step: Step) -> Vec<u8> {
    match step {
        Step::Respond(bytes) => bytes,
        other => panic!("expected Respond, got {:?}", other),
    }
}

#[test]
fn test_plain_success() {
    let mut client = client(&["OAUTHBEARER", "OAUTHBEARER-DH4096"]);
    assert_eq!(client.mechanism(), Mechanism::Plain);
    let mut server = acceptor(Mechanism::Plain, TokenValidation::Valid);

    let initial = respond(client.step(None).unwrap());
    assert_eq!(
        initial,
        b"n,,\x01auth=Bearer abc.def.ghi\x01host=mail.example.org\x01\x01"
    );

    let outcome = match server.step(&initial).unwrap() {
        Step::Complete { output } => output.unwrap(),
        other => panic!("expected Complete, got {:?}", other),
    };
    assert!(outcome.is_empty());
    assert!(server.is_complete());

    assert!(matches!(
        client.step(Some(&outcome)).unwrap(),
        Step::Complete { output: None }
    ));
    assert!(client.is_complete());
}

#[test]
fn test_plain_invalid_token() {
    let mut client = client(&["OAUTHBEARER"]);
    let mut server = acceptor(Mechanism::Plain, TokenValidation::InvalidToken);

    let initial = respond(client.step(None).unwrap());
    let failure = respond(server.step(&initial).unwrap());
    assert_eq!(failure, br#"{"status":"invalid_token"}"#);

    let ack = match client.step(Some(&failure)).unwrap() {
        Step::Rejected { response, status } => {
            assert_eq!(status, FailureStatus::InvalidToken);
            response
        }
        other => panic!("expected Rejected, got {:?}", other),
    };
    assert_eq!(ack, b"\x01");

    assert!(matches!(
        server.step(&ack),
        Err(Error::AuthenticationFailed {
            status: FailureStatus::InvalidToken
        })
    ));

    // both sessions are now terminally failed
    assert!(matches!(client.step(None), Err(Error::ProtocolViolation)));
    assert!(matches!(server.step(&[]), Err(Error::ProtocolViolation)));
}

#[test]
fn test_dh_success_and_security_layer() {
    let mut client = client(&["OAUTHBEARER-DH4096", "OAUTHBEARER"]);
    assert_eq!(client.mechanism(), Mechanism::Dh { key_bits: 4096 });
    let mut server = acceptor(Mechanism::Dh { key_bits: 4096 }, TokenValidation::Valid);

    let client_public = respond(client.step(None).unwrap());
    let server_public = respond(server.step(&client_public).unwrap());
    let sealed_initial = respond(client.step(Some(&server_public)).unwrap());

    // the token never crosses the wire in the clear
    assert!(!sealed_initial
        .windows(TOKEN.len())
        .any(|window| window == TOKEN));

    let outcome = match server.step(&sealed_initial).unwrap() {
        Step::Complete { output } => output.unwrap(),
        other => panic!("expected Complete, got {:?}", other),
    };
    assert!(outcome.is_empty());

    assert!(matches!(
        client.step(Some(&outcome)).unwrap(),
        Step::Complete { output: None }
    ));

    // both ends hold the same key: frames wrapped on one side open on the other
    let client_layer = client.take_security_layer().unwrap();
    let server_layer = server.take_security_layer().unwrap();

    let wrapped = client_layer.wrap(b"ping").unwrap();
    assert_eq!(server_layer.unwrap(&wrapped).unwrap(), b"ping");

    let wrapped = server_layer.wrap(b"pong").unwrap();
    assert_eq!(client_layer.unwrap(&wrapped).unwrap(), b"pong");

    assert_eq!(client_layer.wrap(b"").unwrap(), b"");
}

#[test]
fn test_dh_rejection_is_sealed() {
    let mut client = client(&["OAUTHBEARER-DH4096"]);
    let mut server = acceptor(
        Mechanism::Dh { key_bits: 4096 },
        TokenValidation::InsufficientScope,
    );

    let client_public = respond(client.step(None).unwrap());
    let server_public = respond(server.step(&client_public).unwrap());
    let sealed_initial = respond(client.step(Some(&server_public)).unwrap());

    let sealed_failure = respond(server.step(&sealed_initial).unwrap());
    // the failure message is sealed as well
    assert!(!sealed_failure
        .windows(b"\"status\"".len())
        .any(|window| window == b"\"status\""));

    let sealed_ack = match client.step(Some(&sealed_failure)).unwrap() {
        Step::Rejected { response, status } => {
            assert_eq!(status, FailureStatus::InsufficientScope);
            response
        }
        other => panic!("expected Rejected, got {:?}", other),
    };
    assert_ne!(sealed_ack, b"\x01");

    assert!(matches!(
        server.step(&sealed_ack),
        Err(Error::AuthenticationFailed {
            status: FailureStatus::InsufficientScope
        })
    ));
}

#[test]
fn test_dh_tampered_frame() {
    let mut client = client(&["OAUTHBEARER-DH4096"]);
    let mut server = acceptor(Mechanism::Dh { key_bits: 4096 }, TokenValidation::Valid);

    let client_public = respond(client.step(None).unwrap());
    let server_public = respond(server.step(&client_public).unwrap());
    let mut sealed_initial = respond(client.step(Some(&server_public)).unwrap());

    sealed_initial[20] ^= 0x01;

    assert!(matches!(
        server.step(&sealed_initial),
        Err(Error::CryptoOpen)
    ));
    assert!(!server.is_complete());
    assert!(matches!(
        server.step(&sealed_initial),
        Err(Error::ProtocolViolation)
    ));
}

#[test]
fn test_unsupported_key_length() {
    let result = OAuthBearerClient::select(
        &["OAUTHBEARER-DH2048"],
        Some(Arc::new(TestPrincipal)),
        SERVER_NAME,
    );
    assert!(matches!(result, Err(Error::UnsupportedKeyLength(2048))));
}

#[test]
fn test_unsupported_mechanism() {
    let result = OAuthBearerClient::select(
        &["SCRAM-SHA-256"],
        Some(Arc::new(TestPrincipal)),
        SERVER_NAME,
    );
    assert!(matches!(result, Err(Error::UnsupportedMechanism(_))));
}

#[test]
fn test_advertised_list_is_selectable() {
    for name in sasl_oauthbearer::advertised_mechanisms().iter().copied() {
        let session = OAuthBearerClient::select(
            &[name],
            Some(Arc::new(TestPrincipal)),
            SERVER_NAME,
        );
        assert!(session.is_ok(), "advertised name {} must resolve", name);
    }
}
