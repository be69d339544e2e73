use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};

// Argon2 parameters for 50-150ms target latency
const ARGON2_M_COST: u32 = 19456; // 19 MB
const ARGON2_T_COST: u32 = 2; // 2 iterations
const ARGON2_P_COST: u32 = 1; // 1 parallelism

/// Lifetime of a session token and of the cookie carrying it.
pub const TOKEN_TTL_SECONDS: i64 = 3600;

/// Signed session claims carried in the `token` cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub id: String,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

fn argon2() -> Result<Argon2<'static>, argon2::password_hash::Error> {
    Ok(Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        argon2::Params::new(ARGON2_M_COST, ARGON2_T_COST, ARGON2_P_COST, None)
            .map_err(argon2::password_hash::Error::from)?,
    ))
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = argon2()?.hash_password(password.as_bytes(), &salt)?;
    Ok(password_hash.to_string())
}

/// Ok(false) on mismatch; Err only when `hash` is not a PHC string.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    match argon2()?.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(_) => Ok(false),
    }
}

pub fn generate_token(
    user_id: &str,
    username: &str,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now().timestamp();
    let claims = SessionClaims {
        id: user_id.to_string(),
        username: username.to_string(),
        iat: now,
        exp: now + TOKEN_TTL_SECONDS,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
}

pub fn validate_token(
    token: &str,
    secret: &str,
) -> Result<SessionClaims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 60; // 60 seconds leeway

    let token_data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &validation,
    )?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_generates_argon2id_hash() {
        let password = "test_password_123";
        let hash = hash_password(password).unwrap();

        assert!(!hash.is_empty());
        assert_ne!(hash, password);
        assert!(hash.starts_with("$argon2id$"));
    }

    #[test]
    fn test_hash_password_same_password_produces_different_hashes() {
        let hash1 = hash_password("same_password").unwrap();
        let hash2 = hash_password("same_password").unwrap();

        // Random salt
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_verify_password_correct_and_incorrect() {
        let hash = hash_password("correct1").unwrap();

        assert!(verify_password("correct1", &hash).unwrap());
        assert!(!verify_password("wrong12", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_invalid_hash_format() {
        let result = verify_password("test_password", "not_a_valid_hash");
        assert!(result.is_err());
    }

    #[test]
    fn test_token_carries_id_and_username() {
        let token = generate_token("65a1f0c2e4b0a1b2c3d4e5f6", "dana", "secret").unwrap();
        assert_eq!(token.split('.').count(), 3);

        let claims = validate_token(&token, "secret").unwrap();
        assert_eq!(claims.id, "65a1f0c2e4b0a1b2c3d4e5f6");
        assert_eq!(claims.username, "dana");
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_SECONDS);
    }

    #[test]
    fn test_validate_token_rejects_wrong_secret() {
        let token = generate_token("id", "dana", "correct_secret").unwrap();
        assert!(validate_token(&token, "wrong_secret").is_err());
    }

    #[test]
    fn test_validate_token_rejects_garbage() {
        assert!(validate_token("invalid.token.here", "secret").is_err());
    }

    #[test]
    fn test_validate_token_rejects_expired_token() {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            id: "id".to_string(),
            username: "dana".to_string(),
            iat: now - 2 * TOKEN_TTL_SECONDS,
            exp: now - TOKEN_TTL_SECONDS,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        assert!(validate_token(&token, "secret").is_err());
    }
}
