//! Signup, authentication, and profile tests.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use common::*;

#[tokio::test]
async fn test_signup_returns_token_that_authenticates() {
    let state = create_test_app_state();
    let app = app(state.clone());

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/signup",
            None,
            Some(json!({"email": "jo@example.com", "name": "Jo"})),
        ))
        .await
        .unwrap();

    let body = expect_status(response, StatusCode::OK).await;
    let token = body["token"].as_str().unwrap().to_string();
    assert!(token.starts_with("rw_"));
    assert_eq!(body["account"]["email"], "jo@example.com");
    assert_eq!(body["account"]["role"], "user");
    assert_eq!(body["account"]["is_new_user"], true);
    // The token itself is never stored or echoed back on the account
    assert!(body["account"].get("token_hash").is_none());

    let response = app
        .oneshot(json_request("GET", "/auth/me", Some(&token), None))
        .await
        .unwrap();
    let me = expect_status(response, StatusCode::OK).await;
    assert_eq!(me["email"], "jo@example.com");
}

#[tokio::test]
async fn test_signup_rejects_duplicate_email() {
    let state = create_test_app_state();
    let app = app(state);

    let body = json!({"email": "dup@example.com", "name": "First"});
    let response = app
        .clone()
        .oneshot(json_request("POST", "/auth/signup", None, Some(body.clone())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(json_request("POST", "/auth/signup", None, Some(body)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_signup_rejects_invalid_email() {
    let state = create_test_app_state();
    let app = app(state);

    for email in ["", "noat", "two@@example.com", "user@nodot", "a b@example.com"] {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/auth/signup",
                None,
                Some(json!({"email": email, "name": "X"})),
            ))
            .await
            .unwrap();
        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "email {:?} should be rejected",
            email
        );
    }
}

#[tokio::test]
async fn test_me_without_token_is_unauthorized() {
    let state = create_test_app_state();
    let app = app(state);

    let response = app
        .clone()
        .oneshot(json_request("GET", "/auth/me", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(json_request("GET", "/auth/me", Some("rw_bogus"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_update_name_and_image() {
    let state = create_test_app_state();
    let (_, token) = {
        let conn = state.db.get().unwrap();
        create_test_account(&conn, "pat@example.com", AccountRole::User)
    };
    let app = app(state);

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/account/name",
            Some(&token),
            Some(json!({"name": "Pat Renamed"})),
        ))
        .await
        .unwrap();
    let body = expect_status(response, StatusCode::OK).await;
    assert_eq!(body["name"], "Pat Renamed");

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/account/image",
            Some(&token),
            Some(json!({"image": "https://cdn.example.com/pat.png"})),
        ))
        .await
        .unwrap();
    let body = expect_status(response, StatusCode::OK).await;
    assert_eq!(body["image"], "https://cdn.example.com/pat.png");

    // Clearing the image is allowed
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/account/image",
            Some(&token),
            Some(json!({"image": null})),
        ))
        .await
        .unwrap();
    let body = expect_status(response, StatusCode::OK).await;
    assert!(body.get("image").is_none() || body["image"].is_null());

    // Non-URL images are rejected
    let response = app
        .oneshot(json_request(
            "PUT",
            "/account/image",
            Some(&token),
            Some(json!({"image": "not-a-url"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_empty_name_is_rejected() {
    let state = create_test_app_state();
    let (_, token) = {
        let conn = state.db.get().unwrap();
        create_test_account(&conn, "pat@example.com", AccountRole::User)
    };
    let app = app(state);

    let response = app
        .oneshot(json_request(
            "PUT",
            "/account/name",
            Some(&token),
            Some(json!({"name": "   "})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_complete_setup_clears_new_user_flag() {
    let state = create_test_app_state();
    let (account, token) = {
        let conn = state.db.get().unwrap();
        create_test_account(&conn, "new@example.com", AccountRole::User)
    };
    assert!(account.is_new_user);

    let app = app(state.clone());
    let response = app
        .oneshot(json_request(
            "POST",
            "/account/complete-setup",
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    expect_status(response, StatusCode::OK).await;

    let conn = state.db.get().unwrap();
    let refreshed = queries::get_account_by_id(&conn, &account.id).unwrap().unwrap();
    assert!(!refreshed.is_new_user);
}
