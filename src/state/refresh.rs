//! Authoritative profile refresh against the identity endpoint.

#[cfg(test)]
#[path = "refresh_test.rs"]
mod refresh_test;

use std::rc::Rc;

use crate::error::AuthError;
use crate::identity::{CanonicalIdentity, IdentityNormalizer};
use crate::net::api::IdentityApi;

/// Fetches and normalizes the signed-in user's profile.
///
/// The fetcher never touches session state; the store applies or discards
/// the result. Concurrent calls are independent.
#[derive(Clone)]
pub struct ProfileFetcher {
    api: Rc<dyn IdentityApi>,
    normalizer: IdentityNormalizer,
}

impl ProfileFetcher {
    pub fn new(api: Rc<dyn IdentityApi>, normalizer: IdentityNormalizer) -> Self {
        Self { api, normalizer }
    }

    /// One authenticated request to the identity endpoint.
    ///
    /// # Errors
    ///
    /// Propagates the endpoint's [`AuthError`], or returns
    /// [`AuthError::MissingUserId`] if the body does not identify a user.
    pub async fn refresh(&self, token: &str) -> Result<CanonicalIdentity, AuthError> {
        let body = self.api.fetch_profile(token).await?;
        let profile = self.normalizer.normalize(&body);
        if !profile.is_identified() {
            return Err(AuthError::MissingUserId);
        }
        Ok(profile)
    }
}
