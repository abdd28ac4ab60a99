// Authentication configuration loaded from environment variables.
// Decision: Access and refresh tokens are signed with independent secrets so
// a leaked access secret cannot mint refresh tokens

use std::time::Duration;

/// Token signing configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Secret for signing access tokens
    pub access_secret: String,
    /// Secret for signing refresh tokens
    pub refresh_secret: String,
    /// Access token lifetime
    pub access_token_lifetime: Duration,
    /// Refresh token lifetime (also the refresh cookie max-age)
    pub refresh_token_lifetime: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_secret: String::new(),
            refresh_secret: String::new(),
            access_token_lifetime: Duration::from_secs(15 * 60), // 15 minutes
            refresh_token_lifetime: Duration::from_secs(7 * 24 * 60 * 60), // 7 days
        }
    }
}

impl AuthConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let access_secret = secret_from_env("ACCESS_TOKEN_SECRET");
        let refresh_secret = secret_from_env("REFRESH_TOKEN_SECRET");

        let access_token_lifetime = std::env::var("ACCESS_TOKEN_LIFETIME_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(15 * 60));

        let refresh_token_lifetime = std::env::var("REFRESH_TOKEN_LIFETIME_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(7 * 24 * 60 * 60));

        Self {
            access_secret,
            refresh_secret,
            access_token_lifetime,
            refresh_token_lifetime,
        }
    }
}

/// Read a signing secret, falling back to a random one. Sessions issued
/// against a generated secret do not survive a restart.
fn secret_from_env(var: &str) -> String {
    match std::env::var(var) {
        Ok(secret) if !secret.is_empty() => secret,
        _ => {
            tracing::warn!("{} not set, generating a random secret", var);
            use rand::Rng;
            let bytes: [u8; 32] = rand::thread_rng().gen();
            hex::encode(bytes)
        }
    }
}
