//! Signed-token codec for client-held cookies.
//!
//! The portal keeps all session state on the client, so every stateful
//! cookie is a signed token: `base64(payload).base64(keyed-digest)`. The
//! codec is the single place signatures are produced or checked; the
//! transport layer only moves opaque strings.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};

/// Encoder/decoder for signed cookie values.
pub struct TokenCodec {
    secret: Vec<u8>,
}

impl TokenCodec {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Sign a payload into a `payload.signature` token.
    pub fn encode(&self, payload: &str) -> String {
        let body = URL_SAFE_NO_PAD.encode(payload.as_bytes());
        let sig = URL_SAFE_NO_PAD.encode(self.digest(&body));
        format!("{body}.{sig}")
    }

    /// Verify a token and recover its payload. Returns `None` for bad
    /// structure, bad base64, or a signature mismatch.
    pub fn decode(&self, token: &str) -> Option<String> {
        let (body, sig) = token.split_once('.')?;
        let given = URL_SAFE_NO_PAD.decode(sig).ok()?;
        if !digest_eq(&self.digest(body), &given) {
            return None;
        }
        let payload = URL_SAFE_NO_PAD.decode(body).ok()?;
        String::from_utf8(payload).ok()
    }

    fn digest(&self, body: &str) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(&self.secret);
        hasher.update(body.as_bytes());
        let mut out = [0u8; 32];
        out.copy_from_slice(&hasher.finalize());
        out
    }
}

/// Length-checked comparison without early exit on the first differing byte.
fn digest_eq(expected: &[u8], given: &[u8]) -> bool {
    expected.len() == given.len()
        && expected
            .iter()
            .zip(given)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new("test-secret")
    }

    #[test]
    fn roundtrip_recovers_payload() {
        let token = codec().encode(r#"{"name":"alice"}"#);
        assert_eq!(codec().decode(&token).as_deref(), Some(r#"{"name":"alice"}"#));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let token = codec().encode("original");
        let forged = codec().encode("forged");
        let (_, good_sig) = token.split_once('.').unwrap();
        let (forged_body, _) = forged.split_once('.').unwrap();
        assert_eq!(codec().decode(&format!("{forged_body}.{good_sig}")), None);
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let token = codec().encode("payload");
        let (body, _) = token.split_once('.').unwrap();
        assert_eq!(codec().decode(&format!("{body}.AAAA")), None);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = codec().encode("payload");
        assert_eq!(TokenCodec::new("other-secret").decode(&token), None);
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(codec().decode(""), None);
        assert_eq!(codec().decode("no-dot-here"), None);
        assert_eq!(codec().decode("!!!.:::"), None);
    }
}
