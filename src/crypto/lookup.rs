use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("HASH_SECRET is not configured")]
    MissingSecret,
    #[error("cannot derive a lookup hash from an empty value")]
    EmptyInput,
}

/// Deterministic HMAC-SHA-256 over plaintext e-mails.
///
/// The encrypted e-mail column changes on every write (random IV), so it can
/// never serve as an equality key. This hash is the only column indexed and
/// queried for "does this e-mail exist" / "find user by e-mail". Every write
/// path must update it together with the ciphertext.
#[derive(Clone, Debug)]
pub struct LookupHasher {
    mac: HmacSha256,
}

impl LookupHasher {
    pub fn new(secret: &str) -> Result<Self, LookupError> {
        if secret.trim().is_empty() {
            return Err(LookupError::MissingSecret);
        }
        let mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|_| LookupError::MissingSecret)?;
        Ok(Self { mac })
    }

    /// 64 lowercase hex chars, stable for the same e-mail and secret.
    pub fn hash(&self, email: &str) -> Result<String, LookupError> {
        if email.is_empty() {
            return Err(LookupError::EmptyInput);
        }
        let mut mac = self.mac.clone();
        mac.update(email.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> LookupHasher {
        LookupHasher::new("test-hash-secret").expect("hasher")
    }

    #[test]
    fn deterministic_across_calls_and_instances() {
        let a = hasher().hash("jane@x.com").expect("hash");
        let b = hasher().hash("jane@x.com").expect("hash");
        assert_eq!(a, b);
    }

    #[test]
    fn output_is_64_lowercase_hex_chars() {
        let h = hasher().hash("jane@x.com").expect("hash");
        assert_eq!(h.len(), 64);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn different_emails_and_secrets_produce_different_hashes() {
        let h = hasher();
        assert_ne!(h.hash("jane@x.com").expect("a"), h.hash("john@x.com").expect("b"));

        let other = LookupHasher::new("another-secret").expect("hasher");
        assert_ne!(
            h.hash("jane@x.com").expect("a"),
            other.hash("jane@x.com").expect("b")
        );
    }

    #[test]
    fn empty_input_is_rejected() {
        assert_eq!(hasher().hash("").unwrap_err(), LookupError::EmptyInput);
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert_eq!(LookupHasher::new("").unwrap_err(), LookupError::MissingSecret);
        assert_eq!(LookupHasher::new("   ").unwrap_err(), LookupError::MissingSecret);
    }
}
