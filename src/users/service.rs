use tracing::info;
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password};
use crate::crypto::reveal;
use crate::error::AppError;
use crate::state::AppState;
use crate::users::dto::{UpdateMeRequest, UserProfile};
use crate::users::repo::{self, StagedUpdate, UserRow};

/// Columns decrypted on every read path that returns user data.
const ENCRYPTED_FIELDS: &[&str] = &["name", "email"];

pub fn to_profile(st: &AppState, row: UserRow) -> Result<UserProfile, AppError> {
    Ok(reveal::reveal(row, &st.cipher, ENCRYPTED_FIELDS)?)
}

/// Two racing writers can both pass the lookup pre-check; the UNIQUE index
/// on `email_lookup` is the arbiter, and losing to it means the e-mail is
/// taken, not that the database broke.
fn duplicate_on_conflict(e: anyhow::Error) -> AppError {
    if let Some(sqlx::Error::Database(db)) = e.downcast_ref::<sqlx::Error>() {
        if matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation) {
            return AppError::DuplicateEmail;
        }
    }
    AppError::Internal(e)
}

/// Create a dealer account: hash the password, encrypt name and e-mail,
/// derive the lookup hash, persist. Uniqueness is enforced on the lookup
/// hash, the only equality-searchable trace of the e-mail.
pub async fn register(
    st: &AppState,
    name: &str,
    email: &str,
    password: &str,
) -> Result<UserProfile, AppError> {
    let lookup = st.hasher.hash(email)?;

    if repo::find_by_lookup(&st.db, &lookup).await?.is_some() {
        return Err(AppError::DuplicateEmail);
    }

    let password_hash = hash_password(password)?;
    let row = repo::insert(
        &st.db,
        &st.cipher.encrypt(name),
        &st.cipher.encrypt(email),
        &lookup,
        &password_hash,
    )
    .await
    .map_err(duplicate_on_conflict)?;

    info!(user_id = %row.id, "user created");
    to_profile(st, row)
}

/// Equality lookup by plaintext e-mail, via the deterministic hash twin.
/// Absence is not an error here; callers decide.
pub async fn find_by_email(st: &AppState, email: &str) -> Result<Option<UserRow>, AppError> {
    let lookup = st.hasher.hash(email)?;
    Ok(repo::find_by_lookup(&st.db, &lookup).await?)
}

pub async fn find_profile(st: &AppState, user_id: Uuid) -> Result<UserProfile, AppError> {
    let Some(row) = repo::find_by_id(&st.db, user_id).await? else {
        return Err(AppError::NotFound("user"));
    };
    to_profile(st, row)
}

/// The token's e-mail claim must still hash to the stored lookup hash;
/// otherwise the caller is acting on a stale or forged identity.
fn ensure_authorized(row: &UserRow, claim_hash: &str) -> Result<(), AppError> {
    if row.email_lookup != claim_hash {
        return Err(AppError::NotAuthorized);
    }
    Ok(())
}

/// Self-service update of e-mail and/or password.
///
/// Every accepted change is staged first and persisted in a single UPDATE,
/// so the encrypted e-mail and its lookup hash move together.
pub async fn update(
    st: &AppState,
    user_id: Uuid,
    email_claim: &str,
    changes: &UpdateMeRequest,
) -> Result<UserProfile, AppError> {
    let Some(current) = repo::find_by_id(&st.db, user_id).await? else {
        return Err(AppError::NotFound("user"));
    };

    let claim_hash = st.hasher.hash(email_claim)?;
    ensure_authorized(&current, &claim_hash)?;

    let mut staged = StagedUpdate::default();

    if let Some(new_email) = changes.email.as_deref() {
        let new_lookup = st.hasher.hash(new_email)?;
        if new_lookup == current.email_lookup {
            return Err(AppError::NoOpChange("e-mail"));
        }
        if repo::lookup_taken_by_other(&st.db, &new_lookup, user_id).await? {
            return Err(AppError::DuplicateEmail);
        }
        staged.email = Some(st.cipher.encrypt(new_email));
        staged.email_lookup = Some(new_lookup);
    }

    if let Some(new_password) = changes.password.as_deref() {
        if verify_password(new_password, &current.password_hash)? {
            return Err(AppError::NoOpChange("password"));
        }
        staged.password_hash = Some(hash_password(new_password)?);
    }

    if staged.is_empty() {
        return Err(AppError::NoChanges);
    }

    repo::apply_update(&st.db, user_id, &staged)
        .await
        .map_err(duplicate_on_conflict)?;

    let Some(updated) = repo::find_by_id(&st.db, user_id).await? else {
        return Err(AppError::NotFound("user"));
    };

    info!(
        user_id = %user_id,
        email_changed = staged.email.is_some(),
        password_changed = staged.password_hash.is_some(),
        "user profile updated"
    );
    to_profile(st, updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn row_with_lookup(lookup: &str) -> UserRow {
        UserRow {
            id: Uuid::new_v4(),
            name: "enc".into(),
            email: "enc".into(),
            email_lookup: lookup.into(),
            password_hash: "hash".into(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn authorization_requires_matching_claim_hash() {
        let row = row_with_lookup("abc123");
        assert!(ensure_authorized(&row, "abc123").is_ok());
        assert!(matches!(
            ensure_authorized(&row, "different"),
            Err(AppError::NotAuthorized)
        ));
    }

    #[test]
    fn staged_update_tracks_emptiness() {
        let mut staged = StagedUpdate::default();
        assert!(staged.is_empty());
        staged.password_hash = Some("new-hash".into());
        assert!(!staged.is_empty());
    }

    #[derive(Debug)]
    struct UniqueViolation;

    impl std::fmt::Display for UniqueViolation {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("duplicate key value violates unique constraint \"users_email_lookup_key\"")
        }
    }

    impl std::error::Error for UniqueViolation {}

    impl sqlx::error::DatabaseError for UniqueViolation {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint \"users_email_lookup_key\""
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::UniqueViolation
        }

        fn constraint(&self) -> Option<&str> {
            Some("users_email_lookup_key")
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }
    }

    #[test]
    fn losing_the_unique_race_reads_as_duplicate_email() {
        let race_loss = anyhow::Error::from(sqlx::Error::Database(Box::new(UniqueViolation)));
        assert!(matches!(
            duplicate_on_conflict(race_loss),
            AppError::DuplicateEmail
        ));

        let unrelated = anyhow::Error::from(sqlx::Error::RowNotFound);
        assert!(matches!(
            duplicate_on_conflict(unrelated),
            AppError::Internal(_)
        ));
    }

    #[tokio::test]
    async fn register_encrypts_and_hashes_consistently() {
        // The lookup hash the directory stores must match what find_by_email
        // recomputes, and the ciphertext must decrypt back to the input.
        let st = AppState::fake();
        let lookup_a = st.hasher.hash("jane@x.com").expect("hash");
        let lookup_b = st.hasher.hash("jane@x.com").expect("hash");
        assert_eq!(lookup_a, lookup_b);

        let token = st.cipher.encrypt("jane@x.com");
        assert_eq!(st.cipher.decrypt(&token).expect("decrypt"), "jane@x.com");
        assert_ne!(token, st.cipher.encrypt("jane@x.com"));
    }
}
