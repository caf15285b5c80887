//! Route guard: which paths a visitor may see given their session.
//!
//! SYSTEM CONTEXT
//! ==============
//! The policy is a pure function of `(path, is_authenticated)`, re-run by a
//! Leptos effect whenever either input changes. Entry paths are for
//! anonymous visitors only; everything else except provider callbacks
//! requires a session. Callback paths always pass, since the callback
//! handler is what establishes the session and owns its own redirects.

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;

use leptos::prelude::*;
use leptos_router::NavigateOptions;

use crate::config::{AuthConfig, RoutePaths};
use crate::state::session::SessionState;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    Stay,
    Redirect(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteGuard {
    routes: RoutePaths,
    callback_paths: Vec<String>,
}

impl RouteGuard {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            routes: config.routes.clone(),
            callback_paths: config.providers.iter().map(|p| p.callback_path.clone()).collect(),
        }
    }

    /// Decide whether `path` may stay on screen. Idempotent: a redirect
    /// target always yields `Stay` for the same authentication state.
    pub fn decide(&self, path: &str, is_authenticated: bool) -> GuardDecision {
        let path = normalize_path(path);
        if self.is_callback_path(path) {
            return GuardDecision::Stay;
        }
        let is_entry = self.is_entry_path(path);
        match (is_authenticated, is_entry) {
            (true, true) => GuardDecision::Redirect(self.routes.landing.clone()),
            (false, false) => GuardDecision::Redirect(self.routes.login.clone()),
            _ => GuardDecision::Stay,
        }
    }

    pub fn is_entry_path(&self, path: &str) -> bool {
        self.routes.entry_paths().contains(&normalize_path(path))
    }

    pub fn is_callback_path(&self, path: &str) -> bool {
        let path = normalize_path(path);
        self.callback_paths
            .iter()
            .any(|callback| path == callback.as_str() || path.strip_prefix(callback.as_str()).is_some_and(|rest| rest.starts_with('/')))
    }
}

/// Drop query string, fragment, and trailing slash (except for the root).
pub(crate) fn normalize_path(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let path = &path[..end];
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}

/// Re-run the guard whenever the session or the current path changes.
pub fn install_route_guard<F>(
    session: RwSignal<SessionState>,
    pathname: Memo<String>,
    guard: RouteGuard,
    navigate: F,
) where
    F: Fn(&str, NavigateOptions) + Clone + 'static,
{
    Effect::new(move || {
        let is_authenticated = session.with(|s| s.is_authenticated);
        let path = pathname.get();
        if let GuardDecision::Redirect(target) = guard.decide(&path, is_authenticated) {
            log::debug!("guard redirect {path} -> {target}");
            navigate(&target, NavigateOptions { replace: true, ..NavigateOptions::default() });
        }
    });
}
