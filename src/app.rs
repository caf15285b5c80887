//! Root application component with routing and context providers.
//!
//! SYSTEM CONTEXT
//! ==============
//! Bootstrap builds exactly one `SessionStore` and mirrors its events into
//! reactive signals. Pages read the signals for rendering and reach the
//! store itself through `SessionContext` when they need to act on it.

use std::rc::Rc;

use leptos::prelude::*;
use leptos_meta::{Title, provide_meta_context};
use leptos_router::{
    ParamSegment, StaticSegment,
    components::{Route, Router, Routes},
    hooks::{use_location, use_navigate},
};

use crate::components::notice_toast::NoticeToast;
use crate::config::AuthConfig;
use crate::net::api::{HttpIdentityApi, IdentityApi};
use crate::pages::{callback::ProviderCallbackPage, dashboard::DashboardPage, entry::EntryPage, login::LoginPage};
use crate::state::session::{SessionEvent, SessionState, SessionStore};
use crate::storage::Persistence;
use crate::util::guard::{RouteGuard, install_route_guard};
use crate::util::task::BrowserSpawner;

/// Session handles shared through Leptos context.
///
/// The store and backend are `Rc`-based and stay on the UI thread, so they
/// live in local stored values; the signals are plain `RwSignal`s.
#[derive(Clone, Copy)]
pub struct SessionContext {
    pub state: RwSignal<SessionState>,
    pub notice: RwSignal<Option<String>>,
    store: StoredValue<SessionStore, LocalStorage>,
    api: StoredValue<Rc<dyn IdentityApi>, LocalStorage>,
}

impl SessionContext {
    pub fn new(store: SessionStore, api: Rc<dyn IdentityApi>) -> Self {
        let state = RwSignal::new(store.state());
        let notice = RwSignal::new(None::<String>);
        store.subscribe(move |event| match event {
            SessionEvent::Changed(next) => state.set(next.clone()),
            SessionEvent::Notice(message) => notice.set(Some(message.clone())),
        });
        Self { state, notice, store: StoredValue::new_local(store), api: StoredValue::new_local(api) }
    }

    pub fn store(&self) -> SessionStore {
        self.store.get_value()
    }

    pub fn api(&self) -> Rc<dyn IdentityApi> {
        self.api.get_value()
    }
}

/// Root application component.
///
/// Provides the session context and configuration, installs the route
/// guard, and sets up client-side routing.
#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    let config = AuthConfig::from_build_env();
    let api: Rc<dyn IdentityApi> = Rc::new(HttpIdentityApi::new(&config));
    let store = SessionStore::new(
        Persistence::browser(config.storage_keys.clone()),
        api.clone(),
        Rc::new(BrowserSpawner),
        &config,
    );
    let guard = RouteGuard::new(&config);

    provide_context(SessionContext::new(store, api));
    provide_context(config);

    view! {
        <Title text="Backoffice"/>

        <Router>
            <RouteGuardHost guard/>
            <NoticeToast/>
            <main>
                <Routes fallback=|| "Page not found.".into_view()>
                    <Route path=StaticSegment("") view=EntryPage/>
                    <Route path=StaticSegment("login") view=LoginPage/>
                    <Route path=StaticSegment("register") view=EntryPage/>
                    <Route path=StaticSegment("dashboard") view=DashboardPage/>
                    <Route
                        path=(StaticSegment("auth"), ParamSegment("provider"), StaticSegment("callback"))
                        view=ProviderCallbackPage
                    />
                </Routes>
            </main>
        </Router>
    }
}

/// Router-scoped host for the guard effect; `use_location` and
/// `use_navigate` only resolve inside `<Router>`.
#[component]
fn RouteGuardHost(guard: RouteGuard) -> impl IntoView {
    let session = expect_context::<SessionContext>();
    let location = use_location();
    install_route_guard(session.state, location.pathname, guard, use_navigate());
}
