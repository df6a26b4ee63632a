//! HS256 JWT issuance and validation.
//!
//! Access and refresh tokens are signed with separate secrets so a leaked
//! refresh secret cannot mint access tokens and vice versa. Validation
//! pins the algorithm, checks `exp` and rejects a token of the wrong type.
use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (numeric user id rendered as a string)
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    /// Unique token id so two tokens minted in the same second differ
    pub jti: String,
    pub token_type: TokenType,
}

impl Claims {
    pub fn user_id(&self) -> Result<i64> {
        self.sub
            .parse()
            .map_err(|e| anyhow!("Invalid user id in token: {e}"))
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }
}

/// A signed token plus its expiry
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub struct JwtKeys {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtKeys")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl JwtKeys {
    pub fn new(
        access_secret: &str,
        refresh_secret: &str,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Result<Self> {
        if access_secret.is_empty() || refresh_secret.is_empty() {
            return Err(anyhow!("JWT secrets must not be empty"));
        }
        if access_secret == refresh_secret {
            return Err(anyhow!("access and refresh secrets must differ"));
        }

        Ok(Self {
            access_encoding: EncodingKey::from_secret(access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(refresh_secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        })
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn generate_access_token(&self, user_id: i64) -> Result<IssuedToken> {
        self.issue(user_id, TokenType::Access)
    }

    pub fn generate_refresh_token(&self, user_id: i64) -> Result<IssuedToken> {
        self.issue(user_id, TokenType::Refresh)
    }

    pub fn validate_access_token(&self, token: &str) -> Result<Claims> {
        self.validate(token, TokenType::Access)
    }

    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims> {
        self.validate(token, TokenType::Refresh)
    }

    fn issue(&self, user_id: i64, token_type: TokenType) -> Result<IssuedToken> {
        let (key, ttl) = match token_type {
            TokenType::Access => (&self.access_encoding, self.access_ttl),
            TokenType::Refresh => (&self.refresh_encoding, self.refresh_ttl),
        };
        let now = Utc::now();
        let expires_at = now + ttl;

        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type,
        };

        let token = encode(&Header::new(JWT_ALGORITHM), &claims, key)
            .map_err(|e| anyhow!("Failed to generate token: {e}"))?;

        Ok(IssuedToken { token, expires_at })
    }

    fn validate(&self, token: &str, expected: TokenType) -> Result<Claims> {
        let key = match expected {
            TokenType::Access => &self.access_decoding,
            TokenType::Refresh => &self.refresh_decoding,
        };

        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.validate_exp = true;
        validation.leeway = 0;

        let data = decode::<Claims>(token, key, &validation)
            .map_err(|e| anyhow!("Token validation failed: {e}"))?;

        if data.claims.token_type != expected {
            return Err(anyhow!("Unexpected token type"));
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> JwtKeys {
        JwtKeys::new(
            "access-secret-for-tests",
            "refresh-secret-for-tests",
            Duration::minutes(15),
            Duration::days(7),
        )
        .unwrap()
    }

    #[test]
    fn access_token_round_trip() {
        let keys = keys();
        let issued = keys.generate_access_token(42).unwrap();
        let claims = keys.validate_access_token(&issued.token).unwrap();
        assert_eq!(claims.user_id().unwrap(), 42);
        assert_eq!(claims.token_type, TokenType::Access);
        assert_eq!(claims.exp, issued.expires_at.timestamp());
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let keys = keys();
        let refresh = keys.generate_refresh_token(7).unwrap();
        assert!(keys.validate_access_token(&refresh.token).is_err());
        assert!(keys.validate_refresh_token(&refresh.token).is_ok());
    }

    #[test]
    fn tokens_from_other_secret_are_rejected() {
        let other = JwtKeys::new("x-access", "x-refresh", Duration::minutes(5), Duration::days(1)).unwrap();
        let token = other.generate_access_token(1).unwrap();
        assert!(keys().validate_access_token(&token.token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = JwtKeys::new("a", "b", Duration::seconds(-10), Duration::days(1)).unwrap();
        let token = keys.generate_access_token(1).unwrap();
        assert!(keys.validate_access_token(&token.token).is_err());
    }

    #[test]
    fn identical_secrets_are_refused() {
        assert!(JwtKeys::new("same", "same", Duration::minutes(1), Duration::days(1)).is_err());
    }

    #[test]
    fn tokens_are_unique_per_issue() {
        let keys = keys();
        let a = keys.generate_access_token(1).unwrap();
        let b = keys.generate_access_token(1).unwrap();
        assert_ne!(a.token, b.token);
    }
}
