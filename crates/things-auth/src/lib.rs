//! Things Auth — JWT issuance/validation and the token-based
//! identity provider.

pub mod config;
pub mod error;
pub mod identity;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use identity::JwtIdentityProvider;
pub use token::{AccessTokenClaims, TokenVerifier};
