use sqlx::{FromRow, PgExecutor};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::crypto::reveal::ProtectedFields;

/// User row as persisted. `name` and `email` hold `iv:ciphertext` tokens;
/// `email_lookup` is the deterministic HMAC twin of the plaintext e-mail and
/// must always change together with `email`.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub email_lookup: String,
    pub password_hash: String,
    pub created_at: OffsetDateTime,
}

impl ProtectedFields for UserRow {
    fn field_mut(&mut self, name: &str) -> Option<&mut String> {
        match name {
            "name" => Some(&mut self.name),
            "email" => Some(&mut self.email),
            _ => None,
        }
    }
}

/// Fields staged by a profile update, applied in a single UPDATE so the
/// ciphertext e-mail and its lookup hash can never diverge.
#[derive(Debug, Default)]
pub struct StagedUpdate {
    pub email: Option<String>,
    pub email_lookup: Option<String>,
    pub password_hash: Option<String>,
}

impl StagedUpdate {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.password_hash.is_none()
    }
}

pub async fn insert(
    db: impl PgExecutor<'_>,
    name_enc: &str,
    email_enc: &str,
    email_lookup: &str,
    password_hash: &str,
) -> anyhow::Result<UserRow> {
    let user = sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO users (name, email, email_lookup, password_hash)
        VALUES ($1, $2, $3, $4)
        RETURNING id, name, email, email_lookup, password_hash, created_at
        "#,
    )
    .bind(name_enc)
    .bind(email_enc)
    .bind(email_lookup)
    .bind(password_hash)
    .fetch_one(db)
    .await?;
    Ok(user)
}

pub async fn find_by_lookup(
    db: impl PgExecutor<'_>,
    email_lookup: &str,
) -> anyhow::Result<Option<UserRow>> {
    let user = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT id, name, email, email_lookup, password_hash, created_at
        FROM users
        WHERE email_lookup = $1
        "#,
    )
    .bind(email_lookup)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

pub async fn find_by_id(db: impl PgExecutor<'_>, id: Uuid) -> anyhow::Result<Option<UserRow>> {
    let user = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT id, name, email, email_lookup, password_hash, created_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

/// True when another user already owns the given lookup hash.
pub async fn lookup_taken_by_other(
    db: impl PgExecutor<'_>,
    email_lookup: &str,
    user_id: Uuid,
) -> anyhow::Result<bool> {
    let taken: (bool,) = sqlx::query_as(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM users WHERE email_lookup = $1 AND id <> $2
        )
        "#,
    )
    .bind(email_lookup)
    .bind(user_id)
    .fetch_one(db)
    .await?;
    Ok(taken.0)
}

pub async fn apply_update(
    db: impl PgExecutor<'_>,
    user_id: Uuid,
    staged: &StagedUpdate,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE users
           SET email = COALESCE($2, email),
               email_lookup = COALESCE($3, email_lookup),
               password_hash = COALESCE($4, password_hash)
         WHERE id = $1
        "#,
    )
    .bind(user_id)
    .bind(staged.email.as_deref())
    .bind(staged.email_lookup.as_deref())
    .bind(staged.password_hash.as_deref())
    .execute(db)
    .await?;
    Ok(())
}
