//! [`IdentityProvider`] backed by JWT access tokens.

use things_core::error::{ThingsError, ThingsResult};
use things_core::identity::IdentityProvider;
use tracing::debug;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::token::TokenVerifier;

/// Identifies users from EdDSA access tokens. Stateless: no store lookup.
#[derive(Clone)]
pub struct JwtIdentityProvider {
    verifier: TokenVerifier,
}

impl JwtIdentityProvider {
    pub fn new(config: &AuthConfig) -> Result<Self, AuthError> {
        Ok(Self {
            verifier: TokenVerifier::new(config)?,
        })
    }
}

impl IdentityProvider for JwtIdentityProvider {
    async fn identify(&self, token: &str) -> ThingsResult<Uuid> {
        let token = token.strip_prefix("Bearer ").unwrap_or(token);
        let claims = self.verifier.decode(token).map_err(|e| {
            debug!(error = %e, "Rejected access token");
            ThingsError::from(e)
        })?;

        Uuid::parse_str(&claims.sub)
            .map_err(|_| ThingsError::unauthenticated("token subject is not a user id"))
    }
}
