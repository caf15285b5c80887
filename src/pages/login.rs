//! Login page supporting email + password and identity-provider redirects.
//!
//! A successful password login only updates the session store; the route
//! guard notices the authenticated state and moves the visitor on.

#[cfg(test)]
#[path = "login_test.rs"]
mod login_test;

use std::rc::Rc;

use leptos::prelude::*;

use crate::app::SessionContext;
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::net::api::{IdentityApi, split_auth_response};
use crate::state::session::SessionStore;

const MISSING_CREDENTIALS: &str = "Enter both email and password.";

fn validate_credentials(email: &str, password: &str) -> Result<(String, String), &'static str> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(MISSING_CREDENTIALS);
    }
    Ok((email.to_owned(), password.to_owned()))
}

fn provider_label(name: &str) -> String {
    let mut chars = name.chars();
    let title = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    format!("Sign in with {title}")
}

/// Password login end to end: authenticate, strip the token out of the
/// response, and hand both halves to the store.
async fn sign_in_with_password(
    api: Rc<dyn IdentityApi>,
    store: SessionStore,
    email: String,
    password: String,
) -> Result<(), AuthError> {
    let body = api.password_login(&email, &password).await?;
    let (token, user) = split_auth_response(body)?;
    store.login(&token, Some(&user))
}

#[component]
pub fn LoginPage() -> impl IntoView {
    let session = expect_context::<SessionContext>();
    let config = expect_context::<AuthConfig>();
    let email = RwSignal::new(String::new());
    let password = RwSignal::new(String::new());
    let info = RwSignal::new(String::new());
    let busy = RwSignal::new(false);

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if busy.get() {
            return;
        }
        let (email_value, password_value) = match validate_credentials(&email.get(), &password.get()) {
            Ok(values) => values,
            Err(message) => {
                info.set(message.to_owned());
                return;
            }
        };
        busy.set(true);
        info.set("Signing in...".to_owned());

        let attempt = sign_in_with_password(session.api(), session.store(), email_value, password_value);
        leptos::task::spawn_local(async move {
            if let Err(e) = attempt.await {
                log::info!("password login failed: {e}");
                info.set(format!("Sign-in failed: {e}"));
                busy.set(false);
                password.set(String::new());
            }
        });
    };

    let provider_links = config
        .providers
        .iter()
        .map(|provider| {
            let href = config.api_url(&provider.authorize_path);
            view! {
                <a href=href class="login-button login-button--provider">
                    {provider_label(&provider.name)}
                </a>
            }
        })
        .collect_view();

    view! {
        <div class="login-page">
            <div class="login-card">
                <h1>"Backoffice"</h1>
                <p class="login-card__subtitle">"Sign in to continue"</p>
                <form class="login-form" on:submit=on_submit>
                    <input
                        class="login-input"
                        type="email"
                        placeholder="you@example.com"
                        prop:value=move || email.get()
                        on:input=move |ev| email.set(event_target_value(&ev))
                    />
                    <input
                        class="login-input"
                        type="password"
                        placeholder="Password"
                        prop:value=move || password.get()
                        on:input=move |ev| password.set(event_target_value(&ev))
                    />
                    <button class="login-button" type="submit" disabled=move || busy.get()>
                        "Sign In"
                    </button>
                </form>
                <Show when=move || !info.get().is_empty()>
                    <p class="login-message">{move || info.get()}</p>
                </Show>
                <div class="login-divider"></div>
                <p class="login-card__subtitle">"Or"</p>
                {provider_links}
            </div>
        </div>
    }
}
