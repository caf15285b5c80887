use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use futures::executor::block_on;
use futures::future::LocalBoxFuture;
use serde_json::json;

use super::*;
use crate::test_support::{Harness, jwt_with};

/// Shared log of statuses, sleeps, and navigations in the order they happen.
type Trace = Rc<RefCell<Vec<String>>>;

struct RecordingDelay(Trace);

impl Delay for RecordingDelay {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        self.0.borrow_mut().push(format!("sleep:{}", duration.as_millis()));
        Box::pin(futures::future::ready(()))
    }
}

fn run_callback(h: &Harness, path: &str, query: &str) -> (CallbackStatus, Vec<String>) {
    let api: Rc<dyn IdentityApi> = h.api.clone();
    let handler = CallbackHandler::new(h.store(), api, h.config.clone());

    let trace: Trace = Rc::new(RefCell::new(Vec::new()));
    let nav_trace = trace.clone();
    let navigator = move |path: &str| nav_trace.borrow_mut().push(format!("nav:{path}"));
    let delay = RecordingDelay(trace.clone());
    let status_trace = trace.clone();
    let status = block_on(handler.handle(path, query, &navigator, &delay, |status| {
        status_trace.borrow_mut().push(format!("status:{status:?}"));
    }));
    let entries = trace.borrow().clone();
    (status, entries)
}

// =============================================================
// Query parsing
// =============================================================

#[test]
fn from_query_reads_known_parameters() {
    let params = CallbackParams::from_query("?token=abc&state=xyz");
    assert_eq!(params, CallbackParams { token: Some("abc".to_owned()), code: None, error: None });
}

#[test]
fn from_query_decodes_values() {
    let params = CallbackParams::from_query("code=4%2F0AX&error=access+denied");
    assert_eq!(params.code.as_deref(), Some("4/0AX"));
    assert_eq!(params.error.as_deref(), Some("access denied"));
}

#[test]
fn from_query_decodes_keys() {
    let params = CallbackParams::from_query("tok%65n=abc&%63ode=xyz");
    assert_eq!(params.token.as_deref(), Some("abc"));
    assert_eq!(params.code.as_deref(), Some("xyz"));
}

#[test]
fn from_query_treats_blank_values_as_absent() {
    let params = CallbackParams::from_query("token=&code&error=%20");
    assert_eq!(params, CallbackParams::default());
}

#[test]
fn from_query_keeps_first_occurrence() {
    let params = CallbackParams::from_query("code=first&code=second");
    assert_eq!(params.code.as_deref(), Some("first"));
}

// =============================================================
// Direct token
// =============================================================

#[test]
fn direct_token_signs_in_with_decoded_subject() {
    let h = Harness::new();
    let token = jwt_with(&json!({ "sub": "42", "name": "Ana" }));
    let (status, trace) = run_callback(&h, "/auth/google/callback", &format!("token={token}"));

    assert_eq!(status, CallbackStatus::SignedIn);
    assert_eq!(trace.last().map(String::as_str), Some("nav:/dashboard"));

    let store = h.store();
    assert!(store.is_authenticated());
    assert_eq!(store.state().profile.user_id, "42");
    assert_eq!(h.persistence().relay_profile().map(|p| p.user_id).as_deref(), Some("42"));
}

#[test]
fn opaque_token_still_signs_in() {
    let h = Harness::new();
    let (status, _) = run_callback(&h, "/auth/github/callback", "token=opaque-session");
    assert_eq!(status, CallbackStatus::SignedIn);
    let store = h.store();
    assert!(store.is_authenticated());
    assert_eq!(store.state().profile.user_id, "");
}

#[test]
fn error_parameter_wins_over_token() {
    let h = Harness::new();
    let token = jwt_with(&json!({ "sub": "42" }));
    let (status, trace) = run_callback(&h, "/auth/google/callback", &format!("error=access_denied&token={token}"));

    assert!(matches!(status, CallbackStatus::Failed(_)));
    assert_eq!(trace.last().map(String::as_str), Some("nav:/login"));
    assert!(!h.store().is_authenticated());
}

#[test]
fn token_wins_over_code() {
    let h = Harness::new();
    let token = jwt_with(&json!({ "sub": "1" }));
    let (status, _) = run_callback(&h, "/auth/google/callback", &format!("code=c1&token={token}"));
    assert_eq!(status, CallbackStatus::SignedIn);
    assert!(h.api.exchanged.borrow().is_empty());
}

// =============================================================
// Code exchange
// =============================================================

#[test]
fn code_exchange_signs_in_with_user_payload() {
    let h = Harness::new();
    h.api.script_exchange("c1", Ok(json!({ "token": "server-token", "user": { "id": "u8", "email": "u8@x.test" } })));
    let (status, trace) = run_callback(&h, "/auth/github/callback", "code=c1");

    assert_eq!(status, CallbackStatus::SignedIn);
    assert_eq!(trace, vec!["status:Processing", "status:SignedIn", "nav:/dashboard"]);
    assert_eq!(*h.api.exchanged.borrow(), vec![("github".to_owned(), "c1".to_owned())]);

    let store = h.store();
    assert_eq!(store.token().as_deref(), Some("server-token"));
    assert_eq!(store.state().profile.user_id, "u8");
    assert!(!store.state().profile.raw_extra.contains_key("token"));
}

#[test]
fn code_exchange_without_token_fails_then_redirects_after_delay() {
    let h = Harness::new();
    h.api.script_exchange("c1", Ok(json!({})));
    let (status, trace) = run_callback(&h, "/auth/google/callback", "code=c1");

    assert_eq!(status, CallbackStatus::Failed(failure_message(&AuthError::MissingToken)));
    assert_eq!(trace.len(), 4);
    assert_eq!(trace[0], "status:Processing");
    assert!(trace[1].starts_with("status:Failed"));
    assert_eq!(trace[2], "sleep:3000");
    assert_eq!(trace[3], "nav:/login");
    assert!(!h.store().is_authenticated());
}

#[test]
fn code_exchange_network_error_fails() {
    let h = Harness::new();
    h.api.script_exchange("c1", Err(AuthError::Status(500)));
    let (status, trace) = run_callback(&h, "/auth/google/callback", "code=c1");
    assert!(matches!(status, CallbackStatus::Failed(_)));
    assert_eq!(trace.last().map(String::as_str), Some("nav:/login"));
}

#[test]
fn empty_redirect_fails() {
    let h = Harness::new();
    let (status, trace) = run_callback(&h, "/auth/google/callback", "");
    assert!(matches!(status, CallbackStatus::Failed(_)));
    assert_eq!(trace.last().map(String::as_str), Some("nav:/login"));
}

#[test]
fn unknown_provider_path_fails() {
    let h = Harness::new();
    let (status, trace) = run_callback(&h, "/auth/myspace/callback", "code=c1");
    assert!(matches!(status, CallbackStatus::Failed(_)));
    assert!(h.api.exchanged.borrow().is_empty());
    assert_eq!(trace.last().map(String::as_str), Some("nav:/login"));
}

#[test]
fn failure_message_describes_provider_denial() {
    assert_eq!(
        failure_message(&AuthError::Provider("access_denied".to_owned())),
        "Sign-in was cancelled or denied: access_denied"
    );
}
