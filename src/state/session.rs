//! Session store: the client's authentication state machine.
//!
//! SYSTEM CONTEXT
//! ==============
//! One store is built at bootstrap and shared through Leptos context. The
//! route guard, pages, and callback handlers observe it through
//! subscriptions; nothing else reads or writes the persisted session record.
//!
//! ORDERING
//! ========
//! `login` flips to authenticated synchronously and then schedules an
//! authoritative refresh. A refresh only applies if the store is still
//! authenticated with the token it was started for, so a late response can
//! never resurrect a session that was logged out or switched in the meantime.
//! A failed refresh keeps the last-known profile only if it identifies a
//! user; an authenticated session with an empty user id is signed out.
//! `logout` is synchronous end to end; the server notice is fire-and-forget.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use serde_json::Value;

use super::refresh::ProfileFetcher;
use crate::config::{AuthConfig, RefreshFailurePolicy};
use crate::error::AuthError;
use crate::identity::{CanonicalIdentity, IdentityNormalizer};
use crate::net::api::IdentityApi;
use crate::storage::Persistence;
use crate::util::task::TaskSpawner;

const REFRESH_FAILED_NOTICE: &str = "Could not refresh your profile. Showing the last known details.";
const SESSION_EXPIRED_NOTICE: &str = "Your session has expired. Please sign in again.";
const IDENTITY_UNCONFIRMED_NOTICE: &str = "We could not confirm who you are. Please sign in again.";

/// Snapshot of who is signed in.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionState {
    pub is_authenticated: bool,
    pub profile: CanonicalIdentity,
}

impl SessionState {
    /// User id of an authenticated, identified session.
    pub fn user_id(&self) -> Option<&str> {
        (self.is_authenticated && self.profile.is_identified()).then_some(self.profile.user_id.as_str())
    }

    /// User id for operations that must not run anonymously.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotSignedIn`] when there is no identified user.
    pub fn require_user_id(&self) -> Result<&str, AuthError> {
        self.user_id().ok_or(AuthError::NotSignedIn)
    }
}

/// Notifications delivered to subscribers.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    Changed(SessionState),
    /// Transient, user-visible message about a failed refresh.
    Notice(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Rc<dyn Fn(&SessionEvent)>;

struct Inner {
    state: RefCell<SessionState>,
    token: RefCell<Option<String>>,
    persistence: Persistence,
    normalizer: IdentityNormalizer,
    fetcher: ProfileFetcher,
    api: Rc<dyn IdentityApi>,
    spawner: Rc<dyn TaskSpawner>,
    policy: RefreshFailurePolicy,
    listeners: RefCell<Vec<(SubscriptionId, Listener)>>,
    next_listener: Cell<u64>,
}

/// Shared handle to the session state machine. Clones refer to one store.
#[derive(Clone)]
pub struct SessionStore {
    inner: Rc<Inner>,
}

impl SessionStore {
    /// Build the store from persisted state. A stored token starts the
    /// session authenticated and schedules an authoritative refresh.
    pub fn new(
        persistence: Persistence,
        api: Rc<dyn IdentityApi>,
        spawner: Rc<dyn TaskSpawner>,
        config: &AuthConfig,
    ) -> Self {
        let normalizer = IdentityNormalizer::new(&config.api_origin);
        let token = persistence.token();
        let state = match token {
            Some(_) => SessionState { is_authenticated: true, profile: persistence.restore_profile() },
            None => SessionState::default(),
        };

        let store = Self {
            inner: Rc::new(Inner {
                state: RefCell::new(state),
                token: RefCell::new(token.clone()),
                persistence,
                fetcher: ProfileFetcher::new(api.clone(), normalizer.clone()),
                normalizer,
                api,
                spawner,
                policy: config.refresh_policy,
                listeners: RefCell::new(Vec::new()),
                next_listener: Cell::new(0),
            }),
        };

        if let Some(token) = token {
            log::debug!("restored session for {:?}", store.state().profile.user_id);
            store.schedule_refresh(token);
        }
        store
    }

    /// Synchronous snapshot.
    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated
    }

    pub fn token(&self) -> Option<String> {
        self.inner.token.borrow().clone()
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&SessionEvent) + 'static,
    {
        let id = SubscriptionId(self.inner.next_listener.get());
        self.inner.next_listener.set(id.0 + 1);
        self.inner.listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.inner.listeners.borrow_mut().retain(|(existing, _)| *existing != id);
    }

    /// Sign in with `token`, optionally seeding the profile from `payload`.
    ///
    /// Calling this while authenticated replaces the identity.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingToken`] for a blank token.
    pub fn login(&self, token: &str, payload: Option<&Value>) -> Result<(), AuthError> {
        let profile = self.establish(token, payload)?;
        self.inner.persistence.clear_relay_profile();
        self.finish_login(token.trim(), profile);
        Ok(())
    }

    /// `login` for provider callbacks: also relays the optimistic profile
    /// through tab-scoped storage until a refresh confirms it.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingToken`] for a blank token.
    pub fn login_from_provider(&self, token: &str, claims: Option<&Value>) -> Result<(), AuthError> {
        let profile = self.establish(token, claims)?;
        if profile.is_identified() {
            self.inner.persistence.set_relay_profile(&profile);
        } else {
            self.inner.persistence.clear_relay_profile();
        }
        self.finish_login(token.trim(), profile);
        Ok(())
    }

    /// Persist the token and the optimistic profile.
    fn establish(&self, token: &str, payload: Option<&Value>) -> Result<CanonicalIdentity, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        let persistence = &self.inner.persistence;
        persistence.set_token(token);
        let profile = match payload {
            Some(raw) => {
                let profile = self.inner.normalizer.normalize(raw);
                persistence.set_profile(&profile);
                profile
            }
            None => {
                persistence.clear_profile();
                CanonicalIdentity::default()
            }
        };
        Ok(profile)
    }

    fn finish_login(&self, token: &str, profile: CanonicalIdentity) {
        log::info!("signed in as {:?}", profile.user_id);
        *self.inner.token.borrow_mut() = Some(token.to_owned());
        self.set_state(SessionState { is_authenticated: true, profile });
        self.schedule_refresh(token.to_owned());
    }

    /// Sign out. Storage and in-memory state are cleared before returning.
    pub fn logout(&self) {
        let token = self.inner.token.borrow_mut().take();
        self.inner.persistence.clear_session();
        self.set_state(SessionState::default());
        log::info!("signed out");

        if let Some(token) = token {
            let api = self.inner.api.clone();
            self.inner.spawner.spawn(Box::pin(async move {
                if let Err(e) = api.logout(&token).await {
                    log::debug!("server logout notice failed: {e}");
                }
            }));
        }
    }

    /// Schedule an authoritative refresh for the current token, if any.
    pub fn refresh_profile(&self) {
        if let Some(token) = self.token() {
            self.schedule_refresh(token);
        }
    }

    /// Run an authoritative refresh and wait for it, for callers that need
    /// server-confirmed identity rather than the optimistic profile.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotSignedIn`] without a token or when the session
    /// was logged out or switched while waiting, the refresh failure otherwise.
    pub async fn confirm_profile(&self) -> Result<CanonicalIdentity, AuthError> {
        let token = self.token().ok_or(AuthError::NotSignedIn)?;
        let result = self.inner.fetcher.refresh(&token).await;
        if !self.is_current(&token) {
            log::debug!("session changed while confirming profile");
            return Err(AuthError::NotSignedIn);
        }
        let confirmed = result.clone();
        self.apply_refresh(&token, result);
        confirmed
    }

    fn schedule_refresh(&self, token: String) {
        let weak: Weak<Inner> = Rc::downgrade(&self.inner);
        let fetcher = self.inner.fetcher.clone();
        self.inner.spawner.spawn(Box::pin(async move {
            let result = fetcher.refresh(&token).await;
            if let Some(inner) = weak.upgrade() {
                Self { inner }.apply_refresh(&token, result);
            }
        }));
    }

    fn is_current(&self, token: &str) -> bool {
        self.is_authenticated() && self.inner.token.borrow().as_deref() == Some(token)
    }

    fn apply_refresh(&self, token: &str, result: Result<CanonicalIdentity, AuthError>) {
        if !self.is_current(token) {
            log::debug!("discarding stale profile refresh");
            return;
        }
        match result {
            Ok(profile) => {
                self.inner.persistence.set_profile(&profile);
                self.inner.persistence.clear_relay_profile();
                self.set_state(SessionState { is_authenticated: true, profile });
            }
            // An authenticated session must never outlive its last refresh
            // without a user id.
            Err(e) if !self.inner.state.borrow().profile.is_identified() => {
                log::warn!("profile refresh failed with no known identity, signing out: {e}");
                self.logout();
                self.emit(&SessionEvent::Notice(IDENTITY_UNCONFIRMED_NOTICE.to_owned()));
            }
            Err(e) if e.is_unauthorized() && self.inner.policy == RefreshFailurePolicy::LogoutOnUnauthorized => {
                log::warn!("profile refresh rejected the token, signing out: {e}");
                self.logout();
                self.emit(&SessionEvent::Notice(SESSION_EXPIRED_NOTICE.to_owned()));
            }
            Err(e) => {
                log::warn!("profile refresh failed, keeping last-known profile: {e}");
                self.emit(&SessionEvent::Notice(REFRESH_FAILED_NOTICE.to_owned()));
            }
        }
    }

    fn set_state(&self, state: SessionState) {
        *self.inner.state.borrow_mut() = state.clone();
        self.emit(&SessionEvent::Changed(state));
    }

    fn emit(&self, event: &SessionEvent) {
        // Listeners may call back into the store, so no borrow is held.
        let listeners: Vec<Listener> = self.inner.listeners.borrow().iter().map(|(_, l)| l.clone()).collect();
        for listener in listeners {
            listener(event);
        }
    }
}
