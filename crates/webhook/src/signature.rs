//! HMAC-SHA256 webhook signatures

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the payload signature
pub const SIGNATURE_HEADER: &str = "X-Signature";

/// Optional scheme prefix some payers put in front of the hex digest
const SCHEME_PREFIX: &str = "sha256=";

/// Why a signature was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureFailure {
    #[error("unknown provider")]
    UnknownProvider,

    #[error("no webhook secret configured")]
    MissingSecret,

    #[error("signature is not a hex digest")]
    Malformed,

    #[error("signature does not match payload")]
    Mismatch,
}

/// Hex HMAC-SHA256 of `payload` under `secret`
pub fn sign(secret: &[u8], payload: &[u8]) -> String {
    hex::encode(digest(secret, payload))
}

/// Checks a hex signature (optionally `sha256=`-prefixed) in constant time
pub fn verify_with_secret(secret: &[u8], payload: &[u8], signature: &str) -> Result<(), SignatureFailure> {
    if secret.is_empty() {
        return Err(SignatureFailure::MissingSecret);
    }

    let signature = signature.trim();
    let signature = signature.strip_prefix(SCHEME_PREFIX).unwrap_or(signature);
    let provided = hex::decode(signature).map_err(|_| SignatureFailure::Malformed)?;

    let expected = digest(secret, payload);
    if bool::from(expected.as_slice().ct_eq(provided.as_slice())) {
        Ok(())
    } else {
        Err(SignatureFailure::Mismatch)
    }
}

fn digest(secret: &[u8], payload: &[u8]) -> Vec<u8> {
    // HMAC accepts keys of any length
    let mut mac = match HmacSha256::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => return Vec::new(),
    };
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"whsec_test";

    #[test]
    fn test_known_vector() {
        // RFC 4231 test case 2
        let mac = sign(b"Jefe", b"what do ya want for nothing?");
        assert_eq!(mac, "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843");
    }

    #[test]
    fn test_round_trip() {
        let payload = br#"{"event":"claim.status_changed"}"#;
        let signature = sign(SECRET, payload);
        assert_eq!(verify_with_secret(SECRET, payload, &signature), Ok(()));
        assert_eq!(
            verify_with_secret(SECRET, payload, &format!("sha256={signature}")),
            Ok(())
        );
        assert_eq!(
            verify_with_secret(SECRET, payload, &signature.to_uppercase()),
            Ok(())
        );
    }

    #[test]
    fn test_failures() {
        let payload = b"body";
        let signature = sign(SECRET, payload);
        assert_eq!(verify_with_secret(b"", payload, &signature), Err(SignatureFailure::MissingSecret));
        assert_eq!(verify_with_secret(SECRET, payload, "zz"), Err(SignatureFailure::Malformed));
        assert_eq!(verify_with_secret(SECRET, b"bodz", &signature), Err(SignatureFailure::Mismatch));
        assert_eq!(verify_with_secret(SECRET, payload, &signature[..10]), Err(SignatureFailure::Mismatch));
    }
}
