//! Shared fixtures for session-layer tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use futures::channel::oneshot;
use futures::executor::LocalPool;
use serde_json::Value;

use crate::config::{AuthConfig, ProviderConfig};
use crate::error::AuthError;
use crate::net::api::IdentityApi;
use crate::state::session::{SessionEvent, SessionStore};
use crate::storage::{MemoryStorage, Persistence};

/// Scripted identity backend. Unscripted calls fail with a network error.
#[derive(Default)]
pub(crate) struct MockIdentityApi {
    profiles: RefCell<HashMap<String, Result<Value, AuthError>>>,
    exchanges: RefCell<HashMap<String, Result<Value, AuthError>>>,
    login_response: RefCell<Option<Result<Value, AuthError>>>,
    gates: RefCell<HashMap<String, oneshot::Receiver<()>>>,
    pub fetched: RefCell<Vec<String>>,
    pub exchanged: RefCell<Vec<(String, String)>>,
    pub logged_out: RefCell<Vec<String>>,
}

impl MockIdentityApi {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn script_profile(&self, token: &str, response: Result<Value, AuthError>) {
        self.profiles.borrow_mut().insert(token.to_owned(), response);
    }

    pub fn script_exchange(&self, code: &str, response: Result<Value, AuthError>) {
        self.exchanges.borrow_mut().insert(code.to_owned(), response);
    }

    pub fn script_login(&self, response: Result<Value, AuthError>) {
        *self.login_response.borrow_mut() = Some(response);
    }

    /// Hold the next profile fetch for `token` until the sender fires.
    pub fn hold_profile(&self, token: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.borrow_mut().insert(token.to_owned(), rx);
        tx
    }

    fn unscripted() -> AuthError {
        AuthError::Network("unscripted".to_owned())
    }
}

#[async_trait(?Send)]
impl IdentityApi for MockIdentityApi {
    async fn fetch_profile(&self, token: &str) -> Result<Value, AuthError> {
        self.fetched.borrow_mut().push(token.to_owned());
        let gate = self.gates.borrow_mut().remove(token);
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        self.profiles.borrow().get(token).cloned().unwrap_or_else(|| Err(Self::unscripted()))
    }

    async fn exchange_code(&self, provider: &ProviderConfig, code: &str) -> Result<Value, AuthError> {
        self.exchanged.borrow_mut().push((provider.name.clone(), code.to_owned()));
        self.exchanges.borrow().get(code).cloned().unwrap_or_else(|| Err(Self::unscripted()))
    }

    async fn password_login(&self, _email: &str, _password: &str) -> Result<Value, AuthError> {
        self.login_response.borrow().clone().unwrap_or_else(|| Err(Self::unscripted()))
    }

    async fn logout(&self, token: &str) -> Result<(), AuthError> {
        self.logged_out.borrow_mut().push(token.to_owned());
        Err(Self::unscripted())
    }
}

/// Browser stand-in: shared storage, a local executor, and a mock backend.
pub(crate) struct Harness {
    pub pool: LocalPool,
    pub durable: MemoryStorage,
    pub tab: MemoryStorage,
    pub api: Rc<MockIdentityApi>,
    pub config: AuthConfig,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(AuthConfig::default())
    }

    pub fn with_config(config: AuthConfig) -> Self {
        Self {
            pool: LocalPool::new(),
            durable: MemoryStorage::new(),
            tab: MemoryStorage::new(),
            api: MockIdentityApi::new(),
            config,
        }
    }

    pub fn persistence(&self) -> Persistence {
        Persistence::new(Rc::new(self.durable.clone()), Rc::new(self.tab.clone()), self.config.storage_keys.clone())
    }

    /// Build a store over the harness storage, as a page load would.
    pub fn store(&self) -> SessionStore {
        let api: Rc<dyn IdentityApi> = self.api.clone();
        SessionStore::new(self.persistence(), api, Rc::new(self.pool.spawner()), &self.config)
    }

    pub fn run(&mut self) {
        self.pool.run_until_stalled();
    }
}

/// Record every event a store emits.
pub(crate) fn record_events(store: &SessionStore) -> Rc<RefCell<Vec<SessionEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    store.subscribe(move |event| sink.borrow_mut().push(event.clone()));
    events
}

/// Unsigned JWT carrying `claims`.
pub(crate) fn jwt_with(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.sig")
}
