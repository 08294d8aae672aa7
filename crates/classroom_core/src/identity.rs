//! crates/classroom_core/src/identity.rs
//!
//! Turns an optional bearer token into the acting principal.

use tracing::debug;

use crate::domain::Identity;
use crate::error::{ServiceError, ServiceResult};
use crate::ports::IdentityProvider;

/// Resolves `token` through `provider`. A missing or unknown token is `Unauthenticated`.
pub async fn authenticate(
    provider: &dyn IdentityProvider,
    token: Option<&str>,
) -> ServiceResult<Identity> {
    let token = token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(ServiceError::Unauthenticated)?;

    match provider.resolve_token(token).await? {
        Some(identity) => Ok(identity),
        None => {
            debug!("Rejected unknown or expired token");
            Err(ServiceError::Unauthenticated)
        }
    }
}
