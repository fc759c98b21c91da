///! Bearer token issue and validation (HS256 JWT)
///!
///! Tokens carry only the username; role and id are looked up per request.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Longest accepted token lifetime (one year)
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Username
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Token issuer and validator bound to one signing secret
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: chrono::Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        let ttl_hours = ttl_hours.clamp(-MAX_TOKEN_TTL_HOURS, MAX_TOKEN_TTL_HOURS);
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: chrono::Duration::hours(ttl_hours),
        }
    }

    /// Issue a token for `username`
    pub fn issue(&self, username: &str) -> Result<String, jsonwebtoken::errors::Error> {
        let now = chrono::Utc::now();
        let claims = Claims {
            sub: username.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
    }

    /// Verify signature and expiry, returning the claims
    pub fn validate(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        decode::<Claims>(token, &self.decoding_key, &validation).map(|data| data.claims)
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("ttl_hours", &self.ttl.num_hours())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_validate() {
        let issuer = TokenIssuer::new("test-secret", 24);
        let token = issuer.issue("alice").unwrap();

        let claims = issuer.validate(&token).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = TokenIssuer::new("secret-a", 24).issue("alice").unwrap();
        assert!(TokenIssuer::new("secret-b", 24).validate(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        // Past the default 60s leeway
        let issuer = TokenIssuer::new("test-secret", -1);
        let token = issuer.issue("alice").unwrap();
        assert!(issuer.validate(&token).is_err());
    }

    #[test]
    fn test_oversized_ttl_is_clamped() {
        let issuer = TokenIssuer::new("test-secret", i64::MAX);
        let claims = issuer.validate(&issuer.issue("alice").unwrap()).unwrap();
        assert_eq!(claims.exp - claims.iat, MAX_TOKEN_TTL_HOURS * 3600);
    }

    #[test]
    fn test_garbage_rejected() {
        let issuer = TokenIssuer::new("test-secret", 24);
        assert!(issuer.validate("not.a.token").is_err());
        assert!(issuer.validate("").is_err());
    }
}
