pub mod jwt;
pub mod supabase;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::api::format::ProviderError;

pub use jwt::JwtVerifier;
pub use supabase::SupabaseAuth;

/// Who the identity provider says the bearer is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: Option<String>,
}

/// One-time sign-in link minted by the identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MagicLink {
    pub email: String,
    pub action_link: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("identity provider rejected the request: {0}")]
    Rejected(ProviderError),

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("identity provider not configured: {0}")]
    NotConfigured(&'static str),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error("unexpected identity provider response: {0}")]
    InvalidResponse(String),
}

/// The hosted auth service, as seen by the route handlers
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify a bearer token and return the user it belongs to
    async fn verify_token(&self, token: &str) -> Result<Identity, AuthError>;

    /// Ask the provider for a one-time magic link for `email`
    async fn generate_magic_link(&self, email: &str, redirect_to: &str) -> Result<MagicLink, AuthError>;
}
