use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// Process-wide cryptographic material, read once at startup and never
/// mutated afterwards. Absence of either value is fatal.
#[derive(Debug, Clone, Deserialize)]
pub struct CryptoConfig {
    /// 256-bit AES key, hex-encoded (64 chars).
    pub encryption_key_hex: String,
    /// HMAC secret for the e-mail lookup hash, distinct from the key.
    pub hash_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub crypto: CryptoConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is required")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET is required")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "motorlot".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "motorlot-dealers".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
            refresh_ttl_minutes: std::env::var("JWT_REFRESH_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 14),
        };
        let crypto = CryptoConfig {
            encryption_key_hex: std::env::var("ENCRYPTION_KEY")
                .context("ENCRYPTION_KEY is required")?,
            hash_secret: std::env::var("HASH_SECRET").context("HASH_SECRET is required")?,
        };
        Ok(Self { database_url, jwt, crypto })
    }
}
