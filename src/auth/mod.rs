use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config;

/// JWT claims carried by every authenticated request. `sub` is the profile id.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, role: Option<String>) -> Self {
        let now = Utc::now();
        let expiry_hours = config::config().security.jwt_expiry_hours;
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: user_id,
            role,
            exp,
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug)]
pub enum JwtError {
    TokenGeneration(String),
    TokenValidation(String),
    InvalidSecret,
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::TokenGeneration(msg) => write!(f, "JWT generation error: {}", msg),
            JwtError::TokenValidation(msg) => write!(f, "JWT validation error: {}", msg),
            JwtError::InvalidSecret => write!(f, "Invalid JWT secret"),
        }
    }
}

impl std::error::Error for JwtError {}

pub fn generate_jwt(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    let header = Header::default();

    encode(&header, claims, &encoding_key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

pub fn validate_jwt(token: &str, secret: &str) -> Result<Claims, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    let token_data = decode::<Claims>(token, &decoding_key, &validation)
        .map_err(|e| JwtError::TokenValidation(e.to_string()))?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_claims() {
        let user_id = Uuid::new_v4();
        let claims = Claims {
            sub: user_id,
            role: Some("customer".to_string()),
            exp: (Utc::now() + Duration::hours(1)).timestamp(),
            iat: Utc::now().timestamp(),
        };

        let token = generate_jwt(&claims, "test-secret").unwrap();
        let decoded = validate_jwt(&token, "test-secret").unwrap();
        assert_eq!(decoded.sub, user_id);
        assert_eq!(decoded.role.as_deref(), Some("customer"));
    }

    #[test]
    fn rejects_wrong_secret() {
        let claims = Claims {
            sub: Uuid::new_v4(),
            role: None,
            exp: (Utc::now() + Duration::hours(1)).timestamp(),
            iat: Utc::now().timestamp(),
        };

        let token = generate_jwt(&claims, "secret-a").unwrap();
        assert!(validate_jwt(&token, "secret-b").is_err());
    }

    #[test]
    fn rejects_empty_secret() {
        assert!(matches!(
            validate_jwt("token", ""),
            Err(JwtError::InvalidSecret)
        ));
    }
}
