// JWT token service for authentication
// Decision: HS256 with symmetric keys, one key pair per token kind
// Decision: Tokens are stateless; there is no server-side token record

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::config::AuthConfig;

/// Claims carried by an access token. Roles are a snapshot taken at issuance
/// and go stale until the token is refreshed.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AccessTokenClaims {
    /// Subject (username)
    pub sub: String,
    /// Roles at issuance time
    pub roles: Vec<String>,
    /// Token type
    pub token_type: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// Claims carried by a refresh token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RefreshTokenClaims {
    /// Subject (username)
    pub sub: String,
    /// Token type
    pub token_type: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// Issues and verifies both token kinds.
#[derive(Clone)]
pub struct TokenIssuer {
    config: AuthConfig,
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
}

impl TokenIssuer {
    pub fn new(config: AuthConfig) -> Self {
        let access_encoding = EncodingKey::from_secret(config.access_secret.as_bytes());
        let access_decoding = DecodingKey::from_secret(config.access_secret.as_bytes());
        let refresh_encoding = EncodingKey::from_secret(config.refresh_secret.as_bytes());
        let refresh_decoding = DecodingKey::from_secret(config.refresh_secret.as_bytes());

        Self {
            config,
            access_encoding,
            access_decoding,
            refresh_encoding,
            refresh_decoding,
        }
    }

    /// Issue an access token for a user with their current roles
    pub fn issue_access_token(&self, username: &str, roles: &[String]) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::from_std(self.config.access_token_lifetime)?;

        let claims = AccessTokenClaims {
            sub: username.to_string(),
            roles: roles.to_vec(),
            token_type: "access".to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.access_encoding)
            .context("Failed to encode access token")
    }

    /// Issue a refresh token for a user
    pub fn issue_refresh_token(&self, username: &str) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::from_std(self.config.refresh_token_lifetime)?;

        let claims = RefreshTokenClaims {
            sub: username.to_string(),
            token_type: "refresh".to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.refresh_encoding)
            .context("Failed to encode refresh token")
    }

    /// Verify signature, expiry, and kind of an access token
    pub fn verify_access_token(&self, token: &str) -> Result<AccessTokenClaims> {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        let token_data = decode::<AccessTokenClaims>(token, &self.access_decoding, &validation)
            .context("Invalid access token")?;

        if token_data.claims.token_type != "access" {
            anyhow::bail!("Invalid token type");
        }

        Ok(token_data.claims)
    }

    /// Verify signature, expiry, and kind of a refresh token
    pub fn verify_refresh_token(&self, token: &str) -> Result<RefreshTokenClaims> {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        let token_data = decode::<RefreshTokenClaims>(token, &self.refresh_decoding, &validation)
            .context("Invalid refresh token")?;

        if token_data.claims.token_type != "refresh" {
            anyhow::bail!("Invalid token type");
        }

        Ok(token_data.claims)
    }

    /// Refresh token lifetime in seconds (cookie max-age)
    pub fn refresh_token_lifetime_secs(&self) -> i64 {
        self.config.refresh_token_lifetime.as_secs() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration as StdDuration;

    fn test_config() -> AuthConfig {
        AuthConfig {
            access_secret: "access-secret-for-testing".to_string(),
            refresh_secret: "refresh-secret-for-testing".to_string(),
            access_token_lifetime: StdDuration::from_secs(900),
            refresh_token_lifetime: StdDuration::from_secs(86400),
        }
    }

    #[test]
    fn test_access_token_round_trip() {
        let issuer = TokenIssuer::new(test_config());
        let token = issuer
            .issue_access_token("alice", &["Employee".to_string()])
            .unwrap();

        let claims = issuer.verify_access_token(&token).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.roles, vec!["Employee".to_string()]);
        assert_eq!(claims.token_type, "access");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_refresh_token_round_trip() {
        let issuer = TokenIssuer::new(test_config());
        let token = issuer.issue_refresh_token("alice").unwrap();

        let claims = issuer.verify_refresh_token(&token).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.token_type, "refresh");
    }

    #[test]
    fn test_wrong_token_kind_rejected() {
        let issuer = TokenIssuer::new(test_config());

        let refresh = issuer.issue_refresh_token("alice").unwrap();
        assert!(issuer.verify_access_token(&refresh).is_err());

        let access = issuer
            .issue_access_token("alice", &["Employee".to_string()])
            .unwrap();
        assert!(issuer.verify_refresh_token(&access).is_err());
    }

    #[test]
    fn test_distinct_secrets() {
        let issuer = TokenIssuer::new(test_config());

        // A token signed with the refresh secret but claiming to be an access
        // token still fails access verification
        let mut other = test_config();
        other.access_secret = other.refresh_secret.clone();
        let forger = TokenIssuer::new(other);

        let forged = forger
            .issue_access_token("alice", &["Admin".to_string()])
            .unwrap();
        assert!(issuer.verify_access_token(&forged).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let issuer = TokenIssuer::new(test_config());
        let now = Utc::now();

        // Well past the default validation leeway
        let claims = AccessTokenClaims {
            sub: "alice".to_string(),
            roles: vec!["Employee".to_string()],
            token_type: "access".to_string(),
            exp: (now - Duration::hours(1)).timestamp(),
            iat: (now - Duration::hours(2)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(test_config().access_secret.as_bytes()),
        )
        .unwrap();

        assert!(issuer.verify_access_token(&token).is_err());
    }

    #[test]
    fn test_garbage_token_rejected() {
        let issuer = TokenIssuer::new(test_config());
        assert!(issuer.verify_access_token("not-a-token").is_err());
        assert!(issuer.verify_refresh_token("not-a-token").is_err());
    }
}
