//! Dashboard page: the authenticated landing route.
//!
//! SYSTEM CONTEXT
//! ==============
//! Shows the canonical profile of the signed-in user and exposes the two
//! session actions a user can take by hand: re-fetch the profile and sign out.

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod dashboard_test;

use leptos::prelude::*;

use crate::app::SessionContext;
use crate::identity::CanonicalIdentity;

/// Dashboard page. Reaching it anonymously is prevented by the route guard.
#[component]
pub fn DashboardPage() -> impl IntoView {
    let session = expect_context::<SessionContext>();
    let profile = Memo::new(move |_| session.state.with(|s| s.profile.clone()));

    let on_refresh = move |_| session.store().refresh_profile();
    let on_logout = move |_| session.store().logout();

    view! {
        <div class="dashboard-page">
            <header class="dashboard-header">
                <h1>"Dashboard"</h1>
                <div class="dashboard-header__actions">
                    <button class="btn" on:click=on_refresh title="Reload profile">
                        "Refresh"
                    </button>
                    <button class="btn btn--danger" on:click=on_logout>
                        "Sign Out"
                    </button>
                </div>
            </header>
            <section class="profile-card">
                <Show when=move || profile.with(|p| p.avatar_url.is_some())>
                    <img class="profile-card__avatar" src=move || profile.with(|p| p.avatar_url.clone()) alt="" />
                </Show>
                <h2 class="profile-card__name">{move || profile.with(greeting)}</h2>
                <dl class="profile-card__details">
                    <dt>"User ID"</dt>
                    <dd>{move || profile.with(|p| field_or_dash(Some(p.user_id.as_str())))}</dd>
                    <dt>"Email"</dt>
                    <dd>{move || profile.with(|p| field_or_dash(p.email.as_deref()))}</dd>
                    <dt>"Role"</dt>
                    <dd>{move || profile.with(|p| field_or_dash(p.role.as_deref()))}</dd>
                </dl>
            </section>
        </div>
    }
}

fn greeting(profile: &CanonicalIdentity) -> String {
    match (&profile.display_name, &profile.email) {
        (Some(name), _) => format!("Welcome, {name}"),
        (None, Some(email)) => format!("Welcome, {email}"),
        (None, None) => "Welcome".to_owned(),
    }
}

fn field_or_dash(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_owned(),
        _ => "-".to_owned(),
    }
}
