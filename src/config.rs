//! Session configuration resolved at build time.
//!
//! SYSTEM CONTEXT
//! ==============
//! WASM builds have no process environment, so values are captured with
//! `option_env!` when the client is compiled and parsed here into typed
//! config shared by the store, the guard, and the callback pages.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::time::Duration;

use crate::error::ConfigError;
use crate::util::guard::normalize_path;

pub const DEFAULT_API_ORIGIN: &str = "http://localhost:4000";
pub const DEFAULT_LANDING_PATH: &str = "/dashboard";
pub const DEFAULT_PROVIDERS: &str = "google,github";
pub const DEFAULT_CALLBACK_ERROR_DELAY_MS: u64 = 3000;

const API_ORIGIN_VAR: &str = "BACKOFFICE_API_ORIGIN";
const LANDING_PATH_VAR: &str = "BACKOFFICE_LANDING_PATH";
const PROVIDERS_VAR: &str = "BACKOFFICE_PROVIDERS";
const CALLBACK_ERROR_DELAY_VAR: &str = "BACKOFFICE_CALLBACK_ERROR_DELAY_MS";
const REFRESH_POLICY_VAR: &str = "BACKOFFICE_REFRESH_POLICY";

/// What a failed authoritative refresh does to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshFailurePolicy {
    /// Always keep the last-known profile.
    KeepProfile,
    /// Log out on 401/403; keep the profile for every other failure.
    #[default]
    LogoutOnUnauthorized,
}

/// Route paths the guard and callback handlers navigate between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePaths {
    pub root: String,
    pub login: String,
    pub register: String,
    pub landing: String,
}

impl Default for RoutePaths {
    fn default() -> Self {
        Self {
            root: "/".to_owned(),
            login: "/login".to_owned(),
            register: "/register".to_owned(),
            landing: DEFAULT_LANDING_PATH.to_owned(),
        }
    }
}

impl RoutePaths {
    /// Paths only meaningful to visitors who are not signed in.
    pub fn entry_paths(&self) -> [&str; 3] {
        [self.root.as_str(), self.login.as_str(), self.register.as_str()]
    }
}

/// One third-party identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub name: String,
    /// Browser route the provider redirects back to.
    pub callback_path: String,
    /// Backend route that starts the provider's redirect flow.
    pub authorize_path: String,
    /// Backend route that trades an authorization code for a token.
    pub exchange_path: String,
}

impl ProviderConfig {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            callback_path: format!("/auth/{name}/callback"),
            authorize_path: format!("/api/auth/{name}"),
            exchange_path: format!("/api/auth/{name}/exchange"),
        }
    }
}

/// Durable and tab-scoped storage keys for the persisted session record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub token: String,
    pub profile: String,
    pub user_id: String,
    /// Tab-scoped relay copy of the profile written during provider callbacks.
    pub relay_profile: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            token: "backoffice_token".to_owned(),
            profile: "backoffice_profile".to_owned(),
            user_id: "backoffice_user_id".to_owned(),
            relay_profile: "backoffice_profile_relay".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    /// Origin of the backend API, without trailing slash.
    pub api_origin: String,
    pub routes: RoutePaths,
    pub providers: Vec<ProviderConfig>,
    pub storage_keys: StorageKeys,
    /// How long a failed callback shows its error before going to login.
    pub callback_error_delay: Duration,
    pub refresh_policy: RefreshFailurePolicy,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            api_origin: DEFAULT_API_ORIGIN.to_owned(),
            routes: RoutePaths::default(),
            providers: parse_providers(DEFAULT_PROVIDERS),
            storage_keys: StorageKeys::default(),
            callback_error_delay: Duration::from_millis(DEFAULT_CALLBACK_ERROR_DELAY_MS),
            refresh_policy: RefreshFailurePolicy::default(),
        }
    }
}

impl AuthConfig {
    /// Build typed config from a key lookup.
    ///
    /// Optional:
    /// - `BACKOFFICE_API_ORIGIN`: default `http://localhost:4000`
    /// - `BACKOFFICE_LANDING_PATH`: default `/dashboard`
    /// - `BACKOFFICE_PROVIDERS`: comma list, default `google,github`
    /// - `BACKOFFICE_CALLBACK_ERROR_DELAY_MS`: default 3000
    /// - `BACKOFFICE_REFRESH_POLICY`: `logout_on_unauthorized` (default) or `keep`
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when a value is present but invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_origin = match lookup(API_ORIGIN_VAR) {
            Some(raw) if raw.trim().is_empty() => return Err(ConfigError::Empty { var: API_ORIGIN_VAR }),
            Some(raw) => raw.trim().trim_end_matches('/').to_owned(),
            None => defaults.api_origin,
        };

        let providers = lookup(PROVIDERS_VAR).map_or(defaults.providers, |raw| parse_providers(&raw));

        let mut routes = defaults.routes;
        if let Some(raw) = lookup(LANDING_PATH_VAR) {
            routes.landing = parse_landing(&routes, &providers, raw.trim())?;
        }

        let callback_error_delay = match lookup(CALLBACK_ERROR_DELAY_VAR) {
            Some(raw) => {
                let ms = raw
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidNumber { var: CALLBACK_ERROR_DELAY_VAR, value: raw.clone() })?;
                Duration::from_millis(ms)
            }
            None => defaults.callback_error_delay,
        };

        let refresh_policy = match lookup(REFRESH_POLICY_VAR) {
            Some(raw) => parse_refresh_policy(&raw)?,
            None => defaults.refresh_policy,
        };

        Ok(Self {
            api_origin,
            routes,
            providers,
            storage_keys: defaults.storage_keys,
            callback_error_delay,
            refresh_policy,
        })
    }

    /// Config captured from the build environment, falling back to defaults.
    pub fn from_build_env() -> Self {
        let lookup = |key: &str| -> Option<String> {
            let value = match key {
                API_ORIGIN_VAR => option_env!("BACKOFFICE_API_ORIGIN"),
                LANDING_PATH_VAR => option_env!("BACKOFFICE_LANDING_PATH"),
                PROVIDERS_VAR => option_env!("BACKOFFICE_PROVIDERS"),
                CALLBACK_ERROR_DELAY_VAR => option_env!("BACKOFFICE_CALLBACK_ERROR_DELAY_MS"),
                REFRESH_POLICY_VAR => option_env!("BACKOFFICE_REFRESH_POLICY"),
                _ => None,
            };
            value.map(str::to_owned)
        };
        Self::from_lookup(lookup).unwrap_or_else(|e| {
            log::warn!("invalid build config, using defaults: {e}");
            Self::default()
        })
    }

    /// Provider whose callback route matches `path`.
    pub fn provider_for_path(&self, path: &str) -> Option<&ProviderConfig> {
        self.providers
            .iter()
            .find(|p| path == p.callback_path || path.starts_with(&format!("{}/", p.callback_path)))
    }

    /// Absolute URL for a backend path.
    pub fn api_url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.api_origin)
        } else {
            format!("{}/{path}", self.api_origin)
        }
    }
}

/// The landing path must be a plain route the guard leaves alone for an
/// authenticated visitor, compared in the guard's normalized form.
fn parse_landing(routes: &RoutePaths, providers: &[ProviderConfig], raw: &str) -> Result<String, ConfigError> {
    if !raw.starts_with('/') || raw.contains(['?', '#']) {
        return Err(ConfigError::InvalidPath { var: LANDING_PATH_VAR, value: raw.to_owned() });
    }
    let landing = normalize_path(raw);
    if routes.entry_paths().contains(&landing) {
        return Err(ConfigError::LandingIsEntry { var: LANDING_PATH_VAR, value: raw.to_owned() });
    }
    let is_callback = providers.iter().any(|p| {
        let callback = normalize_path(&p.callback_path);
        landing == callback || landing.strip_prefix(callback).is_some_and(|rest| rest.starts_with('/'))
    });
    if is_callback {
        return Err(ConfigError::LandingIsCallback { var: LANDING_PATH_VAR, value: raw.to_owned() });
    }
    Ok(landing.to_owned())
}

fn parse_providers(raw: &str) -> Vec<ProviderConfig> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| ProviderConfig::new(&name.to_ascii_lowercase()))
        .collect()
}

fn parse_refresh_policy(raw: &str) -> Result<RefreshFailurePolicy, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "keep" | "keep_profile" => Ok(RefreshFailurePolicy::KeepProfile),
        "logout_on_unauthorized" => Ok(RefreshFailurePolicy::LogoutOnUnauthorized),
        other => Err(ConfigError::InvalidRefreshPolicy(other.to_owned())),
    }
}
