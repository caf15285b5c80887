//! Provider callback page for `/auth/{provider}/callback`.
//!
//! The guard lets this route through in every state; `CallbackHandler`
//! decides where the visitor goes next.

use leptos::prelude::*;
use leptos_router::NavigateOptions;
use leptos_router::hooks::{use_location, use_navigate};

use crate::app::SessionContext;
use crate::config::AuthConfig;
use crate::state::callback::{CallbackHandler, CallbackStatus};
use crate::util::task::BrowserDelay;

#[component]
pub fn ProviderCallbackPage() -> impl IntoView {
    let session = expect_context::<SessionContext>();
    let config = expect_context::<AuthConfig>();
    let location = use_location();
    let navigate = use_navigate();
    let status = RwSignal::new(CallbackStatus::Processing);

    // One run per mount, against the URL the provider redirected to.
    let path = location.pathname.get_untracked();
    let query = location.search.get_untracked();
    let handler = CallbackHandler::new(session.store(), session.api(), config);
    leptos::task::spawn_local(async move {
        let navigator = move |target: &str| navigate(target, NavigateOptions { replace: true, ..NavigateOptions::default() });
        handler
            .handle(&path, &query, &navigator, &BrowserDelay, |next| status.set(next.clone()))
            .await;
    });

    view! {
        <div class="callback-page">
            <div class="login-card">
                {move || match status.get() {
                    CallbackStatus::Processing => view! { <p class="login-message">"Signing you in..."</p> }.into_any(),
                    CallbackStatus::SignedIn => view! { <p class="login-message">"Signed in. Redirecting..."</p> }.into_any(),
                    CallbackStatus::Failed(message) => view! {
                        <p class="login-message login-message--error">{message}</p>
                        <p class="login-message">"Returning to the login page..."</p>
                    }
                    .into_any(),
                }}
            </div>
        </div>
    }
}
