use serde_json::json;

use super::*;

#[test]
fn endpoint_url_joins_origin_and_path() {
    assert_eq!(endpoint_url("https://api.test/", "/api/auth/me"), "https://api.test/api/auth/me");
    assert_eq!(endpoint_url("https://api.test", "api/auth/me"), "https://api.test/api/auth/me");
}

#[test]
fn exchange_url_encodes_code() {
    let provider = ProviderConfig::new("google");
    assert_eq!(
        exchange_url("https://api.test", &provider, "4/0A b&c"),
        "https://api.test/api/auth/google/exchange?code=4%2F0A%20b%26c"
    );
}

#[test]
fn bearer_formats_authorization_header() {
    assert_eq!(bearer("abc"), "Bearer abc");
}

#[test]
fn split_auth_response_removes_token_from_payload() {
    let (token, user) = split_auth_response(json!({ "token": "t1", "user": { "id": "u1" } })).unwrap();
    assert_eq!(token, "t1");
    assert_eq!(user, json!({ "user": { "id": "u1" } }));
}

#[test]
fn split_auth_response_accepts_access_token_aliases() {
    let (token, user) = split_auth_response(json!({ "accessToken": "t2", "id": "u" })).unwrap();
    assert_eq!(token, "t2");
    assert_eq!(user, json!({ "id": "u" }));
}

#[test]
fn split_auth_response_scrubs_every_token_field() {
    let (token, user) = split_auth_response(json!({ "token": "first", "access_token": "second", "id": "u" })).unwrap();
    assert_eq!(token, "first");
    assert_eq!(user, json!({ "id": "u" }));
}

#[test]
fn split_auth_response_requires_token() {
    assert_eq!(split_auth_response(json!({})), Err(AuthError::MissingToken));
    assert_eq!(split_auth_response(json!({ "token": "  " })), Err(AuthError::MissingToken));
    assert_eq!(split_auth_response(json!({ "token": 12 })), Err(AuthError::MissingToken));
    assert_eq!(split_auth_response(json!([])), Err(AuthError::MissingToken));
}

#[cfg(not(feature = "csr"))]
#[test]
fn native_build_reports_network_error() {
    let api = HttpIdentityApi::new(&AuthConfig::default());
    let result = futures::executor::block_on(api.fetch_profile("t"));
    assert!(matches!(result, Err(AuthError::Network(_))));
}
