use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ErrorMessage, HttpError},
    models::usermodel::Identity,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(rename = "userId")]
    pub sub: String,
    pub role: String,
    pub iat: usize,
    pub exp: usize,
}

/// Signs a token carrying the caller's id and role, valid for `expires_in_minutes`.
pub fn create_token(
    identity: &Identity,
    secret: &[u8],
    expires_in_minutes: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let iat = now.timestamp() as usize;
    let exp = (now + Duration::minutes(expires_in_minutes)).timestamp() as usize;
    let claims = TokenClaims {
        sub: identity.user_id.to_string(),
        role: identity.role.to_str().to_string(),
        iat,
        exp,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )
}

pub fn decode_token<T: Into<String>>(token: T, secret: &[u8]) -> Result<Identity, HttpError> {
    let decoded = decode::<TokenClaims>(
        &token.into(),
        &DecodingKey::from_secret(secret),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| {
        tracing::debug!("token rejected: {}", e);
        HttpError::unauthorized(ErrorMessage::InvalidToken.to_string())
    })?;

    let user_id = decoded
        .claims
        .sub
        .parse()
        .map_err(|_| HttpError::unauthorized(ErrorMessage::InvalidToken.to_string()))?;
    let role = decoded
        .claims
        .role
        .parse()
        .map_err(|_| HttpError::unauthorized(ErrorMessage::InvalidToken.to_string()))?;

    Ok(Identity::new(user_id, role))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;
    use crate::models::{ids::UserId, usermodel::UserRole};

    const SECRET: &[u8] = b"test-secret";

    #[test]
    fn round_trips_identity() {
        let identity = Identity::new(UserId::new(), UserRole::Fundi);
        let token = create_token(&identity, SECRET, 60).unwrap();

        assert_eq!(decode_token(token, SECRET).unwrap(), identity);
    }

    #[test]
    fn rejects_other_secret() {
        let identity = Identity::new(UserId::new(), UserRole::Client);
        let token = create_token(&identity, SECRET, 60).unwrap();

        let err = decode_token(token, b"another-secret").unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn rejects_expired_token() {
        let identity = Identity::new(UserId::new(), UserRole::Client);
        // past the default 60s leeway
        let token = create_token(&identity, SECRET, -5).unwrap();

        assert!(decode_token(token, SECRET).is_err());
    }

    #[test]
    fn rejects_malformed_token() {
        assert!(decode_token("not.a.token", SECRET).is_err());
        assert!(decode_token("", SECRET).is_err());
    }

    #[test]
    fn rejects_unknown_role_claim() {
        let now = Utc::now().timestamp() as usize;
        let claims = TokenClaims {
            sub: UserId::new().to_string(),
            role: "superuser".to_string(),
            iat: now,
            exp: now + 600,
        };
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET)).unwrap();

        assert!(decode_token(token, SECRET).is_err());
    }
}
