use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use serde_json::{Map, Value};

use super::jwks::JwksCache;
use super::{string_claim, AuthError, VerifiedIdentity};
use crate::config::AuthProvider;
use crate::types::SubjectId;

const ISSUER_PREFIX: &str = "https://securetoken.google.com/";

/// Verifies Firebase ID tokens: RS256, signed by one of Google's current
/// keys, issued for our project.
pub struct FirebaseVerifier {
    keys: JwksCache,
    validation: Validation,
}

impl FirebaseVerifier {
    pub fn new(project_id: &str, keys: JwksCache) -> Self {
        let issuer = format!("{}{}", ISSUER_PREFIX, project_id);

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[project_id]);
        validation.set_issuer(&[issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        Self { keys, validation }
    }

    pub async fn verify(&self, token: &str) -> Result<VerifiedIdentity, AuthError> {
        let header = decode_header(token)?;
        if header.alg != Algorithm::RS256 {
            return Err(AuthError::SignatureInvalid);
        }
        let kid = header
            .kid
            .ok_or_else(|| AuthError::Malformed("token header has no kid".to_string()))?;

        let key = self.keys.key_for(&kid).await?;
        let data = decode::<Map<String, Value>>(token, &key, &self.validation)?;
        let claims = data.claims;

        let subject = string_claim(&claims, "sub")
            .ok_or_else(|| AuthError::Malformed("token has an empty subject".to_string()))?
            .to_string();

        Ok(VerifiedIdentity {
            subject: SubjectId::new(subject),
            provider: AuthProvider::Firebase,
            claims,
        })
    }
}
