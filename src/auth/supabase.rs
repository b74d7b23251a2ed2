use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::{AuthError, Identity, IdentityProvider, JwtVerifier, MagicLink};
use crate::api::format::ProviderError;
use crate::config::AuthConfig;

/// GoTrue-compatible identity provider reached over HTTP
pub struct SupabaseAuth {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    service_role_key: String,
    jwt: Option<JwtVerifier>,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: Uuid,
    email: Option<String>,
}

impl SupabaseAuth {
    pub fn new(config: &AuthConfig) -> Result<Self, AuthError> {
        let jwt = match config.jwt_secret.as_deref() {
            Some(secret) => Some(JwtVerifier::new(secret, &config.jwt_audience)?),
            None => None,
        };

        Ok(Self {
            http: reqwest::Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            service_role_key: config.service_role_key.clone(),
            jwt,
        })
    }

    fn endpoint(&self, path: &str) -> Result<String, AuthError> {
        if self.base_url.is_empty() {
            return Err(AuthError::NotConfigured("SUPABASE_URL"));
        }
        Ok(format!("{}/auth/v1/{}", self.base_url, path))
    }

    async fn rejection(response: reqwest::Response) -> AuthError {
        let status = response.status().as_u16();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        AuthError::Rejected(ProviderError::from_body(status, &body))
    }

    async fn fetch_user(&self, token: &str) -> Result<Identity, AuthError> {
        if self.anon_key.is_empty() {
            return Err(AuthError::NotConfigured("SUPABASE_ANON_KEY"));
        }

        let response = self
            .http
            .get(self.endpoint("user")?)
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let user = response
            .json::<UserResponse>()
            .await
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;

        Ok(Identity { id: user.id, email: user.email })
    }
}

#[async_trait]
impl IdentityProvider for SupabaseAuth {
    async fn verify_token(&self, token: &str) -> Result<Identity, AuthError> {
        match &self.jwt {
            Some(verifier) => verifier.verify(token),
            None => self.fetch_user(token).await,
        }
    }

    async fn generate_magic_link(&self, email: &str, redirect_to: &str) -> Result<MagicLink, AuthError> {
        if self.service_role_key.is_empty() {
            return Err(AuthError::NotConfigured("SUPABASE_SERVICE_ROLE_KEY"));
        }

        let response = self
            .http
            .post(self.endpoint("admin/generate_link")?)
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
            .json(&json!({
                "type": "magiclink",
                "email": email,
                "redirect_to": redirect_to,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;

        let action_link = extract_action_link(&body)
            .ok_or_else(|| AuthError::InvalidResponse("generate_link response has no action_link".to_string()))?;

        tracing::info!("Generated magic link for {}", email);

        Ok(MagicLink {
            email: email.to_string(),
            action_link,
        })
    }
}

/// Newer GoTrue releases return the link at the top level, older ones under `properties`
fn extract_action_link(body: &Value) -> Option<String> {
    body.get("action_link")
        .or_else(|| body.pointer("/properties/action_link"))
        .and_then(Value::as_str)
        .map(str::to_string)
}
