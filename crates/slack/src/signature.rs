//! Slack request signing (`v0` scheme).
//!
//! The signature is `v0=` followed by the hex HMAC-SHA256 of
//! `v0:{timestamp}:{raw body}` keyed with the app's signing secret.

use hmac::{Hmac, Mac};
use kronos_core::EpochSeconds;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use thiserror::Error;

pub const SIGNATURE_HEADER: &str = "x-slack-signature";
pub const SIGNATURE_VERSION: &str = "v0";
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing request signature")]
    MissingSignature,
    #[error("missing request timestamp")]
    MissingTimestamp,
    #[error("malformed request signature")]
    Malformed,
    #[error("request timestamp is not a valid epoch value")]
    InvalidTimestamp,
    #[error("request timestamp is outside the {tolerance_secs}s window")]
    Stale { tolerance_secs: i64 },
    #[error("request signature mismatch")]
    Mismatch,
}

#[derive(Clone)]
pub struct SignatureVerifier {
    signing_secret: SecretString,
    tolerance_secs: i64,
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("signing_secret", &"[REDACTED]")
            .field("tolerance_secs", &self.tolerance_secs)
            .finish()
    }
}

impl SignatureVerifier {
    pub fn new(signing_secret: SecretString) -> Self {
        Self { signing_secret, tolerance_secs: DEFAULT_TOLERANCE_SECS }
    }

    pub fn verify(
        &self,
        timestamp: &str,
        body: &[u8],
        signature: Option<&str>,
        now_unix: i64,
    ) -> Result<(), SignatureError> {
        let signature = signature.ok_or(SignatureError::MissingSignature)?;

        // The MAC covers the header text as sent; only the window uses the parsed value.
        let sent_at =
            EpochSeconds::parse(timestamp).map_err(|_| SignatureError::InvalidTimestamp)?.secs;
        if now_unix.saturating_sub(sent_at).saturating_abs() > self.tolerance_secs {
            return Err(SignatureError::Stale { tolerance_secs: self.tolerance_secs });
        }

        let hex_digest = signature
            .strip_prefix(SIGNATURE_VERSION)
            .and_then(|rest| rest.strip_prefix('='))
            .ok_or(SignatureError::Malformed)?;
        let expected = hex::decode(hex_digest).map_err(|_| SignatureError::Malformed)?;

        let mut mac = self.mac(timestamp)?;
        mac.update(body);
        mac.verify_slice(&expected).map_err(|_| SignatureError::Mismatch)
    }

    /// Computes the header value Slack would send for `body`.
    pub fn sign(&self, timestamp: &str, body: &[u8]) -> Result<String, SignatureError> {
        let mut mac = self.mac(timestamp)?;
        mac.update(body);
        Ok(format!("{SIGNATURE_VERSION}={}", hex::encode(mac.finalize().into_bytes())))
    }

    fn mac(&self, timestamp: &str) -> Result<Hmac<Sha256>, SignatureError> {
        let mut mac =
            Hmac::<Sha256>::new_from_slice(self.signing_secret.expose_secret().as_bytes())
                .map_err(|_| SignatureError::Malformed)?;
        mac.update(format!("{SIGNATURE_VERSION}:{timestamp}:").as_bytes());
        Ok(mac)
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::{SignatureError, SignatureVerifier};

    const NOW: i64 = 1_727_689_594;
    const BODY: &[u8] = b"token=tok&user_id=U1&text=clock-in";

    fn verifier() -> SignatureVerifier {
        SignatureVerifier::new(SecretString::from("8f742231b10e8888abcd99yyyzzz85a5"))
    }

    #[test]
    fn accepts_signature_it_produced() {
        let verifier = verifier();
        let signature = verifier.sign("1727689594", BODY).expect("sign");

        assert!(signature.starts_with("v0="));
        assert_eq!(verifier.verify("1727689594", BODY, Some(&signature), NOW), Ok(()));
    }

    #[test]
    fn signature_is_versioned_hex_digest() {
        let verifier = SignatureVerifier::new(SecretString::from("key"));
        let signature = verifier.sign("1", b"body").expect("sign");

        assert_eq!(signature.len(), "v0=".len() + 64);
        assert_eq!(verifier.verify("1", b"body", Some(&signature), 1), Ok(()));
    }

    #[test]
    fn accepts_fractional_timestamp_and_checks_window_on_whole_seconds() {
        let verifier = verifier();
        let signature = verifier.sign("1727689594.25", BODY).expect("sign");

        assert_eq!(verifier.verify("1727689594.25", BODY, Some(&signature), NOW + 300), Ok(()));
        assert_eq!(
            verifier.verify("1727689594.25", BODY, Some(&signature), NOW + 301),
            Err(SignatureError::Stale { tolerance_secs: 300 })
        );
        assert_eq!(
            verifier.verify("1727689594", BODY, Some(&signature), NOW),
            Err(SignatureError::Mismatch),
            "the signed header text is part of the digest"
        );
    }

    #[test]
    fn rejects_tampered_body() {
        let verifier = verifier();
        let signature = verifier.sign("1727689594", BODY).expect("sign");

        let result = verifier.verify("1727689594", b"token=tok&user_id=U2", Some(&signature), NOW);

        assert_eq!(result, Err(SignatureError::Mismatch));
    }

    #[test]
    fn rejects_stale_timestamp() {
        let verifier = verifier();
        let signature = verifier.sign("1727689594", BODY).expect("sign");

        let result = verifier.verify("1727689594", BODY, Some(&signature), NOW + 301);

        assert_eq!(result, Err(SignatureError::Stale { tolerance_secs: 300 }));
        assert!(verifier.verify("1727689594", BODY, Some(&signature), NOW + 300).is_ok());
    }

    #[test]
    fn rejects_missing_or_malformed_signature() {
        let verifier = verifier();

        assert_eq!(
            verifier.verify("1727689594", BODY, None, NOW),
            Err(SignatureError::MissingSignature)
        );
        assert_eq!(
            verifier.verify("1727689594", BODY, Some("v1=abcd"), NOW),
            Err(SignatureError::Malformed)
        );
        assert_eq!(
            verifier.verify("1727689594", BODY, Some("v0=zz"), NOW),
            Err(SignatureError::Malformed)
        );
        for raw in ["soon", "-5", " 1727689594", "1e9"] {
            assert_eq!(
                verifier.verify(raw, BODY, Some("v0=00"), NOW),
                Err(SignatureError::InvalidTimestamp),
                "`{raw}`"
            );
        }
    }
}
