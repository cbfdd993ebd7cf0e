use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::{rngs::OsRng, RngCore};
use thiserror::Error;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

pub const KEY_LEN: usize = 32;
pub const IV_LEN: usize = 16;

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("ENCRYPTION_KEY is not valid hex")]
    NotHex,
    #[error("ENCRYPTION_KEY must decode to {KEY_LEN} bytes")]
    WrongLength,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecryptError {
    #[error("token is not in iv:ciphertext form")]
    Format,
    #[error("token segment is not valid hex")]
    Hex,
    #[error("iv must be {IV_LEN} bytes")]
    IvLength,
    #[error("ciphertext failed padding validation")]
    Padding,
    #[error("decrypted value is not valid utf-8")]
    Utf8,
}

/// AES-256-CBC cipher for short string fields (names, e-mails).
///
/// Tokens are serialized as `hex(iv):hex(ciphertext)` with a fresh random IV
/// per call, so encrypting the same plaintext twice yields different tokens.
/// Ciphertext length still leaks plaintext length; accepted.
#[derive(Clone)]
pub struct FieldCipher {
    key: [u8; KEY_LEN],
}

impl FieldCipher {
    /// Build the cipher from the hex-encoded 256-bit key in configuration.
    pub fn from_hex(key_hex: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(key_hex.trim()).map_err(|_| KeyError::NotHex)?;
        let key: [u8; KEY_LEN] = bytes.try_into().map_err(|_| KeyError::WrongLength)?;
        Ok(Self { key })
    }

    pub fn encrypt(&self, plaintext: &str) -> String {
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);
        let ciphertext = Aes256CbcEnc::new(&self.key.into(), &iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());
        format!("{}:{}", hex::encode(iv), hex::encode(ciphertext))
    }

    pub fn decrypt(&self, token: &str) -> Result<String, DecryptError> {
        let (iv_hex, content_hex) = token.split_once(':').ok_or(DecryptError::Format)?;
        let iv_bytes = hex::decode(iv_hex).map_err(|_| DecryptError::Hex)?;
        let ciphertext = hex::decode(content_hex).map_err(|_| DecryptError::Hex)?;
        let iv: [u8; IV_LEN] = iv_bytes.try_into().map_err(|_| DecryptError::IvLength)?;
        if ciphertext.is_empty() || ciphertext.len() % 16 != 0 {
            return Err(DecryptError::Padding);
        }
        let plaintext = Aes256CbcDec::new(&self.key.into(), &iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
            .map_err(|_| DecryptError::Padding)?;
        String::from_utf8(plaintext).map_err(|_| DecryptError::Utf8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher() -> FieldCipher {
        FieldCipher::from_hex(&"ab".repeat(KEY_LEN)).expect("test key")
    }

    #[test]
    fn roundtrip() {
        let c = cipher();
        for s in ["Jane Doe", "jane@x.com", "", "ação çedilha ü"] {
            let token = c.encrypt(s);
            assert_eq!(c.decrypt(&token).expect("decrypt"), s);
        }
    }

    #[test]
    fn token_shape_is_hex_iv_colon_hex_ciphertext() {
        let token = cipher().encrypt("jane@x.com");
        let (iv, ct) = token.split_once(':').expect("colon separator");
        assert_eq!(iv.len(), IV_LEN * 2);
        assert!(iv.chars().all(|ch| ch.is_ascii_hexdigit() && !ch.is_ascii_uppercase()));
        assert!(!ct.is_empty());
        assert_eq!(ct.len() % 32, 0);
    }

    #[test]
    fn fresh_iv_per_call() {
        let c = cipher();
        let a = c.encrypt("same plaintext");
        let b = c.encrypt("same plaintext");
        assert_ne!(a, b);
        assert_eq!(c.decrypt(&a).expect("a"), "same plaintext");
        assert_eq!(c.decrypt(&b).expect("b"), "same plaintext");
    }

    #[test]
    fn malformed_tokens_fail_deterministically() {
        let c = cipher();
        assert_eq!(c.decrypt("no-separator").unwrap_err(), DecryptError::Format);
        assert_eq!(c.decrypt("zz:aabb").unwrap_err(), DecryptError::Hex);
        assert_eq!(c.decrypt("aabb:zz").unwrap_err(), DecryptError::Hex);
        // 8-byte IV instead of 16
        assert_eq!(
            c.decrypt(&format!("{}:{}", "ab".repeat(8), "cd".repeat(16))).unwrap_err(),
            DecryptError::IvLength
        );
    }

    #[test]
    fn truncated_ciphertext_fails() {
        let c = cipher();
        let token = c.encrypt("jane@x.com");
        let (iv, ct) = token.split_once(':').expect("colon");
        // Drop a byte off the end, leaving a non-multiple of the block size.
        let truncated = format!("{}:{}", iv, &ct[..ct.len() - 2]);
        assert_eq!(c.decrypt(&truncated).unwrap_err(), DecryptError::Padding);
        let empty = format!("{}:", iv);
        assert_eq!(c.decrypt(&empty).unwrap_err(), DecryptError::Padding);
    }

    #[test]
    fn key_must_be_64_hex_chars() {
        assert!(matches!(FieldCipher::from_hex("not hex"), Err(KeyError::NotHex)));
        assert!(matches!(
            FieldCipher::from_hex(&"ab".repeat(16)),
            Err(KeyError::WrongLength)
        ));
    }
}
