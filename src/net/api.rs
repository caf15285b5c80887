//! REST calls against the identity backend.
//!
//! Client-side (`csr`): real HTTP calls via `gloo-net`.
//! Native builds: every call fails with a network error, since these
//! endpoints only exist behind the browser's origin.
//!
//! ERROR HANDLING
//! ==============
//! Calls return `AuthError` values instead of panicking; the session store
//! and callback handlers decide whether a failure is transient or fatal.

#![allow(clippy::unused_async)]

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::{AuthConfig, ProviderConfig};
use crate::error::AuthError;

pub const IDENTITY_PATH: &str = "/api/auth/me";
pub const LOGIN_PATH: &str = "/api/auth/login";
pub const LOGOUT_PATH: &str = "/api/auth/logout";

/// Token fields a login or exchange response may carry, in priority order.
const TOKEN_FIELDS: [&str; 3] = ["token", "accessToken", "access_token"];

/// The identity backend as seen by the session layer.
#[async_trait(?Send)]
pub trait IdentityApi {
    /// `GET` the current user with a bearer token.
    async fn fetch_profile(&self, token: &str) -> Result<Value, AuthError>;

    /// `GET` the provider's exchange endpoint with `code`, credentials included.
    async fn exchange_code(&self, provider: &ProviderConfig, code: &str) -> Result<Value, AuthError>;

    /// `POST` email + password; the body carries a token and a user payload.
    async fn password_login(&self, email: &str, password: &str) -> Result<Value, AuthError>;

    /// Tell the server the session ended. Callers never await the outcome.
    async fn logout(&self, token: &str) -> Result<(), AuthError>;
}

/// `IdentityApi` over `fetch` via `gloo-net`.
#[derive(Clone, Debug)]
pub struct HttpIdentityApi {
    api_origin: String,
}

impl HttpIdentityApi {
    pub fn new(config: &AuthConfig) -> Self {
        Self { api_origin: config.api_origin.clone() }
    }

    fn url(&self, path: &str) -> String {
        endpoint_url(&self.api_origin, path)
    }
}

pub(crate) fn endpoint_url(origin: &str, path: &str) -> String {
    let origin = origin.trim_end_matches('/');
    if path.starts_with('/') { format!("{origin}{path}") } else { format!("{origin}/{path}") }
}

pub(crate) fn exchange_url(origin: &str, provider: &ProviderConfig, code: &str) -> String {
    format!("{}?code={}", endpoint_url(origin, &provider.exchange_path), urlencoding::encode(code))
}

pub(crate) fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// Split a login/exchange response into its token and the remaining user
/// payload, so token fields never reach the normalizer's passthrough map.
///
/// # Errors
///
/// Returns [`AuthError::MissingToken`] when no token field holds a
/// non-empty string.
pub fn split_auth_response(mut body: Value) -> Result<(String, Value), AuthError> {
    let Some(fields) = body.as_object_mut() else {
        return Err(AuthError::MissingToken);
    };
    let mut token = None;
    for key in TOKEN_FIELDS {
        if let Some(Value::String(value)) = fields.remove(key) {
            if token.is_none() && !value.trim().is_empty() {
                token = Some(value.trim().to_owned());
            }
        }
    }
    let token = token.ok_or(AuthError::MissingToken)?;
    Ok((token, body))
}

#[cfg(feature = "csr")]
async fn read_json(resp: gloo_net::http::Response) -> Result<Value, AuthError> {
    if !resp.ok() {
        return Err(AuthError::from_status(resp.status()));
    }
    resp.json::<Value>().await.map_err(|e| AuthError::Decode(e.to_string()))
}

#[async_trait(?Send)]
impl IdentityApi for HttpIdentityApi {
    async fn fetch_profile(&self, token: &str) -> Result<Value, AuthError> {
        #[cfg(feature = "csr")]
        {
            let resp = gloo_net::http::Request::get(&self.url(IDENTITY_PATH))
                .header("Authorization", &bearer(token))
                .send()
                .await
                .map_err(|e| AuthError::Network(e.to_string()))?;
            read_json(resp).await
        }
        #[cfg(not(feature = "csr"))]
        {
            let _ = (self.url(IDENTITY_PATH), bearer(token));
            Err(AuthError::Network("not available outside the browser".to_owned()))
        }
    }

    async fn exchange_code(&self, provider: &ProviderConfig, code: &str) -> Result<Value, AuthError> {
        let url = exchange_url(&self.api_origin, provider, code);
        #[cfg(feature = "csr")]
        {
            let resp = gloo_net::http::Request::get(&url)
                .credentials(web_sys::RequestCredentials::Include)
                .send()
                .await
                .map_err(|e| AuthError::Network(e.to_string()))?;
            read_json(resp).await
        }
        #[cfg(not(feature = "csr"))]
        {
            let _ = url;
            Err(AuthError::Network("not available outside the browser".to_owned()))
        }
    }

    async fn password_login(&self, email: &str, password: &str) -> Result<Value, AuthError> {
        #[cfg(feature = "csr")]
        {
            let payload = serde_json::json!({ "email": email, "password": password });
            let resp = gloo_net::http::Request::post(&self.url(LOGIN_PATH))
                .json(&payload)
                .map_err(|e| AuthError::Decode(e.to_string()))?
                .send()
                .await
                .map_err(|e| AuthError::Network(e.to_string()))?;
            read_json(resp).await
        }
        #[cfg(not(feature = "csr"))]
        {
            let _ = (email, password);
            Err(AuthError::Network("not available outside the browser".to_owned()))
        }
    }

    async fn logout(&self, token: &str) -> Result<(), AuthError> {
        #[cfg(feature = "csr")]
        {
            let resp = gloo_net::http::Request::post(&self.url(LOGOUT_PATH))
                .header("Authorization", &bearer(token))
                .send()
                .await
                .map_err(|e| AuthError::Network(e.to_string()))?;
            if !resp.ok() {
                return Err(AuthError::from_status(resp.status()));
            }
            Ok(())
        }
        #[cfg(not(feature = "csr"))]
        {
            let _ = (self.url(LOGOUT_PATH), token);
            Err(AuthError::Network("not available outside the browser".to_owned()))
        }
    }
}
