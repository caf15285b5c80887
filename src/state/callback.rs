//! Identity-provider redirect handling.
//!
//! SYSTEM CONTEXT
//! ==============
//! Provider callback routes are exempt from the route guard, so the handler
//! owns navigation for both outcomes: landing page on success, login page
//! after a visible error delay on failure.
//!
//! Redirect parameters are checked in a fixed order: `error`, then `token`,
//! then `code`. A token is decoded locally for an optimistic identity; a code
//! is exchanged with the backend for a token plus user payload.

#[cfg(test)]
#[path = "callback_test.rs"]
mod callback_test;

use std::rc::Rc;

use super::session::SessionStore;
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::identity::claims::decode_claims;
use crate::net::api::{IdentityApi, split_auth_response};
use crate::util::task::{Delay, Navigator};

/// The redirect parameters a provider callback can carry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallbackParams {
    pub token: Option<String>,
    pub code: Option<String>,
    pub error: Option<String>,
}

impl CallbackParams {
    /// Parse a URL query string (with or without the leading `?`).
    /// Keys and values are percent-decoded. Blank values count as absent;
    /// the first occurrence of a key wins.
    pub fn from_query(query: &str) -> Self {
        let mut params = Self::default();
        for pair in query.trim_start_matches('?').split('&') {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let slot = match decode_component(key).as_deref() {
                Some("token") => &mut params.token,
                Some("code") => &mut params.code,
                Some("error") => &mut params.error,
                _ => continue,
            };
            if slot.is_none() {
                *slot = decode_component(value);
            }
        }
        params
    }
}

fn decode_component(raw: &str) -> Option<String> {
    let spaced = raw.replace('+', " ");
    let decoded = urlencoding::decode(&spaced).map_or_else(|_| spaced.clone(), |v| v.into_owned());
    let trimmed = decoded.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

/// Progress of a callback, for the page to render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallbackStatus {
    Processing,
    SignedIn,
    Failed(String),
}

pub struct CallbackHandler {
    session: SessionStore,
    api: Rc<dyn IdentityApi>,
    config: AuthConfig,
}

impl CallbackHandler {
    pub fn new(session: SessionStore, api: Rc<dyn IdentityApi>, config: AuthConfig) -> Self {
        Self { session, api, config }
    }

    /// Establish the session from the callback route and its parameters.
    ///
    /// # Errors
    ///
    /// [`AuthError::Provider`] for an `error` parameter or an empty redirect,
    /// [`AuthError::UnknownProvider`] for a path no provider owns, the
    /// exchange failure, or [`AuthError::MissingToken`] when the exchange
    /// response has no token.
    pub async fn sign_in(&self, path: &str, params: &CallbackParams) -> Result<(), AuthError> {
        if let Some(error) = &params.error {
            return Err(AuthError::Provider(error.clone()));
        }
        let provider = self
            .config
            .provider_for_path(path)
            .ok_or_else(|| AuthError::UnknownProvider(path.to_owned()))?;

        if let Some(token) = &params.token {
            let claims = match decode_claims(token) {
                Ok(claims) => Some(claims),
                Err(e) => {
                    log::debug!("{} token claims unreadable, waiting for refresh: {e}", provider.name);
                    None
                }
            };
            return self.session.login_from_provider(token, claims.as_ref());
        }

        if let Some(code) = &params.code {
            let body = self.api.exchange_code(provider, code).await?;
            let (token, user) = split_auth_response(body)?;
            return self.session.login_from_provider(&token, Some(&user));
        }

        Err(AuthError::Provider("redirect carried no token or code".to_owned()))
    }

    /// Run the callback for `path` + `query` to completion, reporting status
    /// and navigating.
    pub async fn handle<N, D, F>(&self, path: &str, query: &str, navigator: &N, delay: &D, on_status: F) -> CallbackStatus
    where
        N: Navigator + ?Sized,
        D: Delay + ?Sized,
        F: Fn(&CallbackStatus),
    {
        on_status(&CallbackStatus::Processing);
        let params = CallbackParams::from_query(query);
        match self.sign_in(path, &params).await {
            Ok(()) => {
                let status = CallbackStatus::SignedIn;
                on_status(&status);
                navigator.navigate(&self.config.routes.landing);
                status
            }
            Err(e) => {
                log::warn!("sign-in callback at {path} failed: {e}");
                let status = CallbackStatus::Failed(failure_message(&e));
                on_status(&status);
                delay.sleep(self.config.callback_error_delay).await;
                navigator.navigate(&self.config.routes.login);
                status
            }
        }
    }
}

pub(crate) fn failure_message(error: &AuthError) -> String {
    match error {
        AuthError::Provider(reason) => format!("Sign-in was cancelled or denied: {reason}"),
        AuthError::MissingToken => "The sign-in service did not return a session.".to_owned(),
        other => format!("Sign-in failed: {other}"),
    }
}
