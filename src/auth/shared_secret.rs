use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use serde_json::{Map, Value};

use super::{string_claim, AuthError, VerifiedIdentity};
use crate::config::AuthProvider;
use crate::types::SubjectId;

/// Verifies NextAuth HS256 tokens against the shared secret.
pub struct SharedSecretVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl SharedSecretVerifier {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Result<VerifiedIdentity, AuthError> {
        let data = decode::<Map<String, Value>>(token, &self.decoding_key, &self.validation)?;
        let claims = data.claims;

        let subject = subject_from_claims(&claims)
            .ok_or_else(|| AuthError::Malformed("token has no subject".to_string()))?;

        Ok(VerifiedIdentity {
            subject: SubjectId::new(subject),
            provider: AuthProvider::NextAuth,
            claims,
        })
    }
}

/// `sub`, falling back to NextAuth's `user.id` session shape.
fn subject_from_claims(claims: &Map<String, Value>) -> Option<String> {
    if let Some(sub) = string_claim(claims, "sub") {
        return Some(sub.to_string());
    }
    match claims.get("user").and_then(|u| u.get("id"))? {
        Value::String(id) if !id.trim().is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

#[derive(Serialize)]
struct IssuedClaims<'a> {
    sub: &'a str,
    iat: i64,
    exp: i64,
}

/// Mint an HS256 token the shared-secret verifier accepts. Used for local
/// development and tests.
pub fn issue_shared_secret_token(
    secret: &[u8],
    subject: &str,
    ttl: Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = IssuedClaims {
        sub: subject,
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };
    encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret))
}
