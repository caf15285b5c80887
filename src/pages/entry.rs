//! Public entry screen for `/` and `/register`.

use leptos::prelude::*;

use crate::config::AuthConfig;

/// Anonymous visitors see a pointer to the login page; signed-in visitors
/// are redirected to the landing route before this matters.
#[component]
pub fn EntryPage() -> impl IntoView {
    let config = expect_context::<AuthConfig>();

    view! {
        <div class="entry-page">
            <div class="entry-card">
                <h1>"Backoffice"</h1>
                <p class="entry-card__subtitle">"Accounts are provisioned by your administrator."</p>
                <a class="login-button" href=config.routes.login>
                    "Sign in"
                </a>
            </div>
        </div>
    }
}
