use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AuthError, Identity};

/// Access-token claims as issued by the hosted auth service
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    pub aud: String,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
}

/// Verifies HS256 access tokens with the project's shared JWT secret
#[derive(Clone)]
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str, audience: &str) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::NotConfigured("SUPABASE_JWT_SECRET"));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[audience]);

        Ok(Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| AuthError::InvalidToken(format!("Invalid JWT token: {}", e)))?;

        Ok(Identity {
            id: token_data.claims.sub,
            email: token_data.claims.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(secret: &str, aud: &str, exp_offset: Duration) -> (Uuid, String) {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let claims = Claims {
            sub: id,
            email: Some("alice@example.com".to_string()),
            aud: aud.to_string(),
            exp: (now + exp_offset).timestamp(),
            iat: now.timestamp(),
        };
        let jwt = encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap();
        (id, jwt)
    }

    #[test]
    fn accepts_valid_token() {
        let verifier = JwtVerifier::new("secret", "authenticated").unwrap();
        let (id, jwt) = token("secret", "authenticated", Duration::hours(1));
        let identity = verifier.verify(&jwt).unwrap();
        assert_eq!(identity.id, id);
        assert_eq!(identity.email.as_deref(), Some("alice@example.com"));
    }

    #[test]
    fn rejects_wrong_secret_audience_and_expiry() {
        let verifier = JwtVerifier::new("secret", "authenticated").unwrap();

        let (_, forged) = token("other", "authenticated", Duration::hours(1));
        assert!(matches!(verifier.verify(&forged), Err(AuthError::InvalidToken(_))));

        let (_, anon) = token("secret", "anon", Duration::hours(1));
        assert!(verifier.verify(&anon).is_err());

        let (_, expired) = token("secret", "authenticated", Duration::hours(-2));
        assert!(verifier.verify(&expired).is_err());
    }

    #[test]
    fn empty_secret_is_not_configured() {
        assert!(matches!(JwtVerifier::new("", "authenticated"), Err(AuthError::NotConfigured(_))));
    }
}
