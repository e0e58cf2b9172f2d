pub mod middleware;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{User, UserRole};

pub use middleware::{authenticate, require_admin, CurrentUser};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: UserRole,
    pub exp: usize,
}

/// Issues an HS256 token for `user` that expires after `ttl_minutes`.
pub fn create_token(user: &User, jwt_secret: &str, ttl_minutes: i64) -> ApiResult<String> {
    let expiration = (Utc::now() + Duration::minutes(ttl_minutes)).timestamp();
    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        role: user.role,
        exp: usize::try_from(expiration).unwrap_or_default(),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )?;
    Ok(token)
}

pub fn validate_token(token: &str, jwt_secret: &str) -> ApiResult<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| ApiError::Internal(format!("password hashing failed: {err}")))
}

/// False for a wrong password and for a stored hash that cannot be parsed.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(err) => {
            log::warn!("stored password hash is unreadable: {err}");
            false
        }
    }
}

/// Throwaway password for accounts created on a visitor's behalf.
pub fn random_password() -> String {
    Uuid::new_v4().simple().to_string()[..12].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewUserRecord;

    fn user(role: UserRole) -> User {
        NewUserRecord {
            username: "jane".into(),
            email: "jane@example.com".into(),
            password_hash: String::new(),
            full_name: None,
            role,
        }
        .into_user(Uuid::new_v4(), Utc::now().naive_utc())
    }

    #[test]
    fn token_round_trip_carries_identity() {
        let user = user(UserRole::Staff);
        let token = create_token(&user, "secret", 60).unwrap();
        let claims = validate_token(&token, "secret").unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, "jane@example.com");
        assert_eq!(claims.role, UserRole::Staff);
    }

    #[test]
    fn token_rejected_with_wrong_secret_or_expired() {
        let user = user(UserRole::Admin);
        let token = create_token(&user, "secret", 60).unwrap();
        assert!(validate_token(&token, "other").is_err());

        let expired = create_token(&user, "secret", -10).unwrap();
        assert!(validate_token(&expired, "secret").is_err());
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("changeme123").unwrap();
        assert!(verify_password("changeme123", &hash));
        assert!(!verify_password("changeme124", &hash));
        assert!(!verify_password("changeme123", "not-a-hash"));
    }

    #[test]
    fn random_passwords_are_long_enough_and_differ() {
        let a = random_password();
        assert_eq!(a.len(), 12);
        assert_ne!(a, random_password());
    }
}
