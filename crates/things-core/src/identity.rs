//! Principal identification.

use uuid::Uuid;

use crate::error::ThingsResult;

/// Resolves a bearer token to the user it was issued for.
///
/// Implementations fail with
/// [`AuthenticationFailed`](crate::error::ThingsError::AuthenticationFailed)
/// for unknown, malformed or expired tokens.
pub trait IdentityProvider: Send + Sync + 'static {
    fn identify(&self, token: &str) -> impl Future<Output = ThingsResult<Uuid>> + Send;
}
