use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Tokens are issued by the identity service; this crate only verifies them
/// with the shared HS256 secret.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    pub exp: i64,
    pub iat: i64,
    #[serde(default)]
    pub token_type: TokenType,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    #[default]
    Access,
    Refresh,
}

/// Mints an access token, for local tooling and tests.
pub fn create_access_token(user_id: Uuid, config: &Config) -> AppResult<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        exp: (now + Duration::seconds(config.jwt_access_ttl_secs)).timestamp(),
        iat: now.timestamp(),
        token_type: TokenType::Access,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to create access token: {}", e)))
}

pub fn verify_token(token: &str, config: &Config) -> AppResult<TokenData<Claims>> {
    let mut validation = Validation::default();
    validation.validate_exp = true;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .map_err(|_| AppError::Unauthorized)
}

/// Verifies `token` and returns the user id if it is a valid access token.
pub fn authenticate_access_token(token: &str, config: &Config) -> AppResult<Uuid> {
    let token_data = verify_token(token, config)?;
    if token_data.claims.token_type != TokenType::Access {
        return Err(AppError::Unauthorized);
    }
    Ok(token_data.claims.sub)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_token_round_trip() {
        let config = Config::for_local("test-secret");
        let user = Uuid::new_v4();
        let token = create_access_token(user, &config).unwrap();
        assert_eq!(authenticate_access_token(&token, &config).unwrap(), user);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = create_access_token(Uuid::new_v4(), &Config::for_local("a")).unwrap();
        let result = authenticate_access_token(&token, &Config::for_local("b"));
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_refresh_token_rejected() {
        let config = Config::for_local("test-secret");
        let now = Utc::now();
        let claims = Claims {
            sub: Uuid::new_v4(),
            exp: (now + Duration::seconds(60)).timestamp(),
            iat: now.timestamp(),
            token_type: TokenType::Refresh,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .unwrap();
        assert!(authenticate_access_token(&token, &config).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let mut config = Config::for_local("test-secret");
        config.jwt_access_ttl_secs = -3600;
        let token = create_access_token(Uuid::new_v4(), &config).unwrap();
        assert!(authenticate_access_token(&token, &config).is_err());
    }
}
