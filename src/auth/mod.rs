//! Bearer token verification.
//!
//! Two schemes exist and exactly one is active per deployment:
//! - NextAuth: HS256 tokens signed with a shared secret
//! - Firebase: RS256 ID tokens verified against Google's published keys
//!
//! Both yield a [`VerifiedIdentity`] whose subject is the only user identity
//! the rest of the service trusts.

pub mod firebase;
pub mod jwks;
pub mod shared_secret;

use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::{AuthConfig, AuthProvider, ConfigError};
use crate::types::SubjectId;

pub use firebase::FirebaseVerifier;
pub use jwks::{HttpKeySource, JwksCache, KeySource, StaticKeySource};
pub use shared_secret::{issue_shared_secret_token, SharedSecretVerifier};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum AuthError {
    #[error("Authentication required")]
    Missing,

    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Token has expired")]
    Expired,

    #[error("Invalid token signature")]
    SignatureInvalid,

    #[error("Untrusted token issuer: {0}")]
    IssuerUntrusted(String),

    /// The identity provider could not be reached. Not the caller's fault.
    #[error("Identity provider keys unavailable: {0}")]
    KeysUnavailable(String),
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => AuthError::SignatureInvalid,
            ErrorKind::InvalidIssuer | ErrorKind::InvalidAudience => {
                AuthError::IssuerUntrusted(err.to_string())
            }
            ErrorKind::MissingRequiredClaim(claim) => {
                AuthError::Malformed(format!("missing required claim '{}'", claim))
            }
            _ => AuthError::Malformed(err.to_string()),
        }
    }
}

/// Result of a successful verification.
#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
    pub subject: SubjectId,
    pub provider: AuthProvider,
    pub claims: Map<String, Value>,
}

/// The token verifier selected by configuration.
pub enum TokenVerifier {
    SharedSecret(SharedSecretVerifier),
    Firebase(FirebaseVerifier),
}

impl TokenVerifier {
    pub fn from_config(config: &AuthConfig) -> Result<Self, ConfigError> {
        match config.provider {
            AuthProvider::NextAuth => {
                let secret = config
                    .nextauth_secret
                    .as_deref()
                    .ok_or(ConfigError::Missing("NEXTAUTH_SECRET"))?;
                Ok(TokenVerifier::SharedSecret(SharedSecretVerifier::new(secret.as_bytes())))
            }
            AuthProvider::Firebase => {
                let source = HttpKeySource::new(config.jwks_url.clone());
                Ok(TokenVerifier::Firebase(FirebaseVerifier::new(
                    &config.firebase_project_id,
                    JwksCache::new(Box::new(source)),
                )))
            }
        }
    }

    pub fn provider(&self) -> AuthProvider {
        match self {
            TokenVerifier::SharedSecret(_) => AuthProvider::NextAuth,
            TokenVerifier::Firebase(_) => AuthProvider::Firebase,
        }
    }

    pub async fn verify(&self, token: &str) -> Result<VerifiedIdentity, AuthError> {
        if token.trim().is_empty() {
            return Err(AuthError::Missing);
        }
        match self {
            TokenVerifier::SharedSecret(v) => v.verify(token),
            TokenVerifier::Firebase(v) => v.verify(token).await,
        }
    }
}

/// Non-empty string claim, if present.
pub(crate) fn string_claim<'a>(claims: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    claims
        .get(name)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn nextauth_config(secret: Option<&str>) -> AuthConfig {
        AuthConfig {
            provider: AuthProvider::NextAuth,
            nextauth_secret: secret.map(str::to_string),
            firebase_project_id: "vibe".to_string(),
            jwks_url: crate::config::FIREBASE_JWKS_URL.to_string(),
        }
    }

    #[test]
    fn test_jwt_error_mapping() {
        assert_eq!(AuthError::from(JwtError::from(ErrorKind::ExpiredSignature)), AuthError::Expired);
        assert_eq!(
            AuthError::from(JwtError::from(ErrorKind::InvalidSignature)),
            AuthError::SignatureInvalid
        );
        assert!(matches!(
            AuthError::from(JwtError::from(ErrorKind::InvalidIssuer)),
            AuthError::IssuerUntrusted(_)
        ));
        assert!(matches!(
            AuthError::from(JwtError::from(ErrorKind::InvalidToken)),
            AuthError::Malformed(_)
        ));
    }

    #[test]
    fn test_from_config_requires_secret_for_nextauth() {
        assert!(matches!(
            TokenVerifier::from_config(&nextauth_config(None)),
            Err(ConfigError::Missing("NEXTAUTH_SECRET"))
        ));
    }

    #[tokio::test]
    async fn test_verifier_dispatch() {
        let verifier = TokenVerifier::from_config(&nextauth_config(Some("secret"))).unwrap();
        assert_eq!(verifier.provider(), AuthProvider::NextAuth);

        let token = issue_shared_secret_token(b"secret", "user-1", Duration::hours(1)).unwrap();
        let identity = verifier.verify(&token).await.unwrap();
        assert_eq!(identity.subject.as_str(), "user-1");
        assert_eq!(identity.provider, AuthProvider::NextAuth);

        assert_eq!(verifier.verify("  ").await.unwrap_err(), AuthError::Missing);
    }
}
