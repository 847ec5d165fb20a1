//! `X-Line-Signature` verification.
//!
//! The signature is the base64 encoding of HMAC-SHA256 over the raw request
//! body, keyed with the channel secret. Verification runs on the exact bytes
//! received; the body must not be re-serialized first.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::SignatureError;

type HmacSha256 = Hmac<Sha256>;

/// Returns `true` only if every input is present and the signature matches.
pub fn verify(body: &[u8], signature: Option<&str>, secret: Option<&str>) -> bool {
    check(body, signature, secret).is_ok()
}

/// Like [`verify`], but says why a signature was rejected.
///
/// The final comparison is constant-time.
pub fn check(
    body: &[u8],
    signature: Option<&str>,
    secret: Option<&str>,
) -> Result<(), SignatureError> {
    let secret = secret
        .filter(|s| !s.is_empty())
        .ok_or(SignatureError::NoSecret)?;
    let signature = signature
        .filter(|s| !s.is_empty())
        .ok_or(SignatureError::Missing)?;
    let expected = STANDARD
        .decode(signature.trim())
        .map_err(|_| SignatureError::Malformed)?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| SignatureError::NoSecret)?;
    mac.update(body);
    mac.verify_slice(&expected)
        .map_err(|_| SignatureError::Mismatch)
}

/// Computes the signature LINE would send for `body`.
pub fn sign(body: &[u8], secret: &str) -> Result<String, SignatureError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::NoSecret)?;
    mac.update(body);
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "channel-secret";
    const BODY: &[u8] = br#"{"destination":"U1","events":[]}"#;

    #[test]
    fn test_sign_and_verify() {
        let sig = sign(BODY, SECRET).unwrap();
        assert!(verify(BODY, Some(&sig), Some(SECRET)));
        assert!(!verify(BODY, Some(&sig), Some("other-secret")));
        assert!(!verify(b"{\"events\":[]}", Some(&sig), Some(SECRET)));
    }

    #[test]
    fn test_known_vector() {
        // HMAC-SHA256("key", "The quick brown fox jumps over the lazy dog")
        let body = b"The quick brown fox jumps over the lazy dog";
        assert_eq!(
            sign(body, "key").unwrap(),
            "97yD9DBThCSxMpjmqm+xQ+9NWaFJRhdZl0edvC0aPNg="
        );
    }

    #[test]
    fn test_fails_closed() {
        let sig = sign(BODY, SECRET).unwrap();
        assert_eq!(check(BODY, None, Some(SECRET)), Err(SignatureError::Missing));
        assert_eq!(check(BODY, Some(""), Some(SECRET)), Err(SignatureError::Missing));
        assert_eq!(check(BODY, Some(&sig), None), Err(SignatureError::NoSecret));
        assert_eq!(check(BODY, Some(&sig), Some("")), Err(SignatureError::NoSecret));
        assert_eq!(
            check(BODY, Some("not base64!"), Some(SECRET)),
            Err(SignatureError::Malformed)
        );
        assert_eq!(
            check(BODY, Some("AAAA"), Some(SECRET)),
            Err(SignatureError::Mismatch)
        );
    }
}
