//! Transient toast for session notices such as a failed profile refresh.

use std::time::Duration;

use leptos::prelude::*;

use crate::app::SessionContext;
use crate::util::task::{BrowserDelay, Delay};

const NOTICE_TTL: Duration = Duration::from_secs(5);

#[component]
pub fn NoticeToast() -> impl IntoView {
    let notice = expect_context::<SessionContext>().notice;

    // Each notice clears itself unless a newer one replaced it.
    Effect::new(move || {
        let Some(shown) = notice.get() else {
            return;
        };
        let expire = BrowserDelay.sleep(NOTICE_TTL);
        leptos::task::spawn_local(async move {
            expire.await;
            if notice.get_untracked().as_deref() == Some(shown.as_str()) {
                notice.set(None);
            }
        });
    });

    view! {
        <Show when=move || notice.with(Option::is_some)>
            <div class="notice-toast" role="status">
                <span>{move || notice.get().unwrap_or_default()}</span>
                <button class="notice-toast__close" on:click=move |_| notice.set(None) title="Dismiss">
                    "x"
                </button>
            </div>
        </Show>
    }
}
