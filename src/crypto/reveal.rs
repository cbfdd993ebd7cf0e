use thiserror::Error;

use super::cipher::{DecryptError, FieldCipher};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShapeError {
    #[error("required field `{0}` is missing or empty")]
    MissingField(&'static str),
    #[error("field `{0}` is malformed")]
    InvalidField(&'static str),
}

#[derive(Debug, Error)]
pub enum RevealError {
    #[error(transparent)]
    Decrypt(#[from] DecryptError),
    #[error(transparent)]
    Shape(#[from] ShapeError),
}

/// Field-name-to-accessor table for records that carry encrypted columns.
///
/// Returning `None` for an unknown name lets callers list fields per read
/// path without the record having to know which subset is wanted.
pub trait ProtectedFields {
    fn field_mut(&mut self, name: &str) -> Option<&mut String>;
}

/// Decrypt the listed fields in place, then convert into the validated
/// target shape. Shape validation after decryption also surfaces corrupted
/// ciphertext early instead of handing garbage downstream.
pub fn reveal<R, T>(
    mut record: R,
    cipher: &FieldCipher,
    encrypted_fields: &[&str],
) -> Result<T, RevealError>
where
    R: ProtectedFields,
    T: TryFrom<R, Error = ShapeError>,
{
    for name in encrypted_fields {
        if let Some(value) = record.field_mut(name) {
            if !value.is_empty() {
                *value = cipher.decrypt(value)?;
            }
        }
    }
    Ok(T::try_from(record)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Record {
        name: String,
        email: String,
        note: String,
    }

    impl ProtectedFields for Record {
        fn field_mut(&mut self, name: &str) -> Option<&mut String> {
            match name {
                "name" => Some(&mut self.name),
                "email" => Some(&mut self.email),
                _ => None,
            }
        }
    }

    #[derive(Debug)]
    struct Target {
        name: String,
        email: String,
        note: String,
    }

    impl TryFrom<Record> for Target {
        type Error = ShapeError;

        fn try_from(r: Record) -> Result<Self, Self::Error> {
            if r.name.is_empty() {
                return Err(ShapeError::MissingField("name"));
            }
            if !r.email.contains('@') {
                return Err(ShapeError::InvalidField("email"));
            }
            Ok(Target { name: r.name, email: r.email, note: r.note })
        }
    }

    fn cipher() -> FieldCipher {
        FieldCipher::from_hex(&"cd".repeat(32)).expect("test key")
    }

    #[test]
    fn decrypts_listed_fields_and_passes_others_through() {
        let c = cipher();
        let record = Record {
            name: c.encrypt("Jane Doe"),
            email: c.encrypt("jane@x.com"),
            note: "plain".into(),
        };
        let t: Target = reveal(record, &c, &["name", "email"]).expect("reveal");
        assert_eq!(t.name, "Jane Doe");
        assert_eq!(t.email, "jane@x.com");
        assert_eq!(t.note, "plain");
    }

    #[test]
    fn unlisted_encrypted_field_stays_encrypted_and_fails_shape_check() {
        let c = cipher();
        let record = Record {
            name: c.encrypt("Jane Doe"),
            email: c.encrypt("jane@x.com"),
            note: String::new(),
        };
        // e-mail left encrypted: the ciphertext has no '@', so validation trips.
        let err = reveal::<_, Target>(record, &c, &["name"]).unwrap_err();
        assert!(matches!(err, RevealError::Shape(ShapeError::InvalidField("email"))));
    }

    #[test]
    fn corrupted_ciphertext_surfaces_as_decrypt_error() {
        let c = cipher();
        let record = Record {
            name: "garbage-not-a-token".into(),
            email: c.encrypt("jane@x.com"),
            note: String::new(),
        };
        let err = reveal::<_, Target>(record, &c, &["name", "email"]).unwrap_err();
        assert!(matches!(err, RevealError::Decrypt(DecryptError::Format)));
    }

    #[test]
    fn unknown_field_names_are_ignored() {
        let c = cipher();
        let record = Record {
            name: c.encrypt("Jane Doe"),
            email: c.encrypt("jane@x.com"),
            note: String::new(),
        };
        let t: Target = reveal(record, &c, &["name", "email", "phone"]).expect("reveal");
        assert_eq!(t.name, "Jane Doe");
    }
}
