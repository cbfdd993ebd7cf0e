use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::crypto::reveal::ShapeError;
use crate::users::repo::UserRow;

/// Decrypted user data returned to the client. Never contains the password
/// hash or the lookup hash.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl TryFrom<UserRow> for UserProfile {
    type Error = ShapeError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        if row.name.is_empty() {
            return Err(ShapeError::MissingField("name"));
        }
        if row.email.is_empty() {
            return Err(ShapeError::MissingField("email"));
        }
        // A decrypted e-mail that still looks like ciphertext means the row
        // was written or read incorrectly.
        if !row.email.contains('@') {
            return Err(ShapeError::InvalidField("email"));
        }
        Ok(UserProfile {
            id: row.id,
            name: row.name,
            email: row.email,
        })
    }
}

/// Request body for PUT /me. Both fields optional; an empty request is
/// rejected by the service.
#[derive(Debug, Deserialize)]
pub struct UpdateMeRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}
