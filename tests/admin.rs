//! Admin dashboard tests: role gating, user management, feedback triage,
//! waitlist, and growth stats.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use common::*;

struct AdminFixture {
    state: AppState,
    user_token: String,
    admin_token: String,
    super_token: String,
    user_id: String,
}

fn setup() -> AdminFixture {
    let state = create_test_app_state();
    let (user_token, admin_token, super_token, user_id) = {
        let conn = state.db.get().unwrap();
        let (user, user_token) = create_test_account(&conn, "user@example.com", AccountRole::User);
        let (_, admin_token) = create_test_account(&conn, "admin@example.com", AccountRole::Admin);
        let (_, super_token) =
            create_test_account(&conn, "root@example.com", AccountRole::SuperAdmin);
        (user_token, admin_token, super_token, user.id)
    };
    AdminFixture {
        state,
        user_token,
        admin_token,
        super_token,
        user_id,
    }
}

#[tokio::test]
async fn test_admin_routes_forbidden_for_regular_users() {
    let fx = setup();
    let app = app(fx.state);

    for uri in ["/admin/users", "/admin/feedback", "/admin/waitlist", "/admin/stats"] {
        let response = app
            .clone()
            .oneshot(json_request("GET", uri, Some(&fx.user_token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{} should be gated", uri);
    }

    let response = app
        .oneshot(json_request("GET", "/admin/users", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_users_with_filters_and_pagination() {
    let fx = setup();
    let app = app(fx.state);

    let response = app
        .clone()
        .oneshot(json_request("GET", "/admin/users", Some(&fx.admin_token), None))
        .await
        .unwrap();
    let body = expect_status(response, StatusCode::OK).await;
    assert_eq!(body["total"], 3);
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    let response = app
        .clone()
        .oneshot(json_request(
            "GET",
            "/admin/users?role=admin",
            Some(&fx.admin_token),
            None,
        ))
        .await
        .unwrap();
    let body = expect_status(response, StatusCode::OK).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["email"], "admin@example.com");

    let response = app
        .clone()
        .oneshot(json_request(
            "GET",
            "/admin/users?email=root",
            Some(&fx.admin_token),
            None,
        ))
        .await
        .unwrap();
    let body = expect_status(response, StatusCode::OK).await;
    assert_eq!(body["total"], 1);

    let response = app
        .oneshot(json_request(
            "GET",
            "/admin/users?page=2&per_page=2",
            Some(&fx.admin_token),
            None,
        ))
        .await
        .unwrap();
    let body = expect_status(response, StatusCode::OK).await;
    assert_eq!(body["total"], 3);
    assert_eq!(body["page_count"], 2);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_role_change_requires_super_admin() {
    let fx = setup();
    let app = app(fx.state.clone());

    // A plain admin cannot grant roles
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/admin/users/{}/role", fx.user_id),
            Some(&fx.admin_token),
            Some(json!({"role": "admin"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(json_request(
            "PUT",
            &format!("/admin/users/{}/role", fx.user_id),
            Some(&fx.super_token),
            Some(json!({"role": "admin"})),
        ))
        .await
        .unwrap();
    let body = expect_status(response, StatusCode::OK).await;
    assert_eq!(body["role"], "admin");
}

#[tokio::test]
async fn test_delete_user_requires_super_admin_and_not_self() {
    let fx = setup();
    let app = app(fx.state.clone());

    let response = app
        .clone()
        .oneshot(json_request(
            "DELETE",
            &format!("/admin/users/{}", fx.user_id),
            Some(&fx.admin_token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Super admin cannot delete their own account
    let super_id = {
        let conn = fx.state.db.get().unwrap();
        queries::get_account_by_email(&conn, "root@example.com")
            .unwrap()
            .unwrap()
            .id
    };
    let response = app
        .clone()
        .oneshot(json_request(
            "DELETE",
            &format!("/admin/users/{}", super_id),
            Some(&fx.super_token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(json_request(
            "DELETE",
            &format!("/admin/users/{}", fx.user_id),
            Some(&fx.super_token),
            None,
        ))
        .await
        .unwrap();
    expect_status(response, StatusCode::OK).await;

    let conn = fx.state.db.get().unwrap();
    assert!(queries::get_account_by_id(&conn, &fx.user_id).unwrap().is_none());
}

#[tokio::test]
async fn test_feedback_triage_flow() {
    let fx = setup();
    let feedback_id = {
        let conn = fx.state.db.get().unwrap();
        let user = queries::get_account_by_email(&conn, "user@example.com").unwrap().unwrap();
        queries::create_feedback(
            &conn,
            &user.id,
            &CreateFeedback {
                title: "Exports are broken".to_string(),
                message: "CSV export returns an empty file since yesterday.".to_string(),
                label: FeedbackLabel::Issue,
            },
        )
        .unwrap()
        .id
    };
    let app = app(fx.state);

    let response = app
        .clone()
        .oneshot(json_request(
            "GET",
            "/admin/feedback?status=open",
            Some(&fx.admin_token),
            None,
        ))
        .await
        .unwrap();
    let body = expect_status(response, StatusCode::OK).await;
    assert_eq!(body["total"], 1);
    // The admin table carries the submitter
    assert_eq!(body["data"][0]["account_email"], "user@example.com");

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/admin/feedback/{}", feedback_id),
            Some(&fx.admin_token),
            Some(json!({"status": "in_progress", "label": "issue"})),
        ))
        .await
        .unwrap();
    let body = expect_status(response, StatusCode::OK).await;
    assert_eq!(body["status"], "in_progress");

    // Closed filter no longer matches
    let response = app
        .clone()
        .oneshot(json_request(
            "GET",
            "/admin/feedback?status=open",
            Some(&fx.admin_token),
            None,
        ))
        .await
        .unwrap();
    let body = expect_status(response, StatusCode::OK).await;
    assert_eq!(body["total"], 0);

    let response = app
        .oneshot(json_request(
            "DELETE",
            &format!("/admin/feedback/{}", feedback_id),
            Some(&fx.admin_token),
            None,
        ))
        .await
        .unwrap();
    expect_status(response, StatusCode::OK).await;
}

#[tokio::test]
async fn test_waitlist_join_is_idempotent_and_admin_manages_it() {
    let fx = setup();
    let app = app(fx.state.clone());

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/waitlist",
            None,
            Some(json!({"name": "Early Bird", "email": "early@example.com"})),
        ))
        .await
        .unwrap();
    let first = expect_status(response, StatusCode::OK).await;

    // Re-joining refreshes the name instead of erroring
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/waitlist",
            None,
            Some(json!({"name": "Earlier Bird", "email": "early@example.com"})),
        ))
        .await
        .unwrap();
    let second = expect_status(response, StatusCode::OK).await;
    assert_eq!(first["id"], second["id"]);
    assert_eq!(second["name"], "Earlier Bird");

    let response = app
        .clone()
        .oneshot(json_request(
            "GET",
            "/admin/waitlist?email=early",
            Some(&fx.admin_token),
            None,
        ))
        .await
        .unwrap();
    let body = expect_status(response, StatusCode::OK).await;
    assert_eq!(body["total"], 1);

    let id = body["data"][0]["id"].as_str().unwrap().to_string();
    let response = app
        .oneshot(json_request(
            "DELETE",
            &format!("/admin/waitlist/{}", id),
            Some(&fx.admin_token),
            None,
        ))
        .await
        .unwrap();
    expect_status(response, StatusCode::OK).await;

    let conn = fx.state.db.get().unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM waitlist_users", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_waitlist_rejects_invalid_email() {
    let fx = setup();
    let app = app(fx.state);

    let response = app
        .oneshot(json_request(
            "POST",
            "/waitlist",
            None,
            Some(json!({"name": "X", "email": "not-an-email"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stats_totals_and_monthly_buckets() {
    let fx = setup();

    // Seed a subscription and two paid invoices (one outside the window)
    {
        let mut conn = fx.state.db.get().unwrap();
        let user = queries::get_account_by_email(&conn, "user@example.com").unwrap().unwrap();
        let org = create_test_org(&mut conn, "Acme", "billing@acme.test", &user.id);

        queries::upsert_subscription(
            &conn,
            &UpsertSubscription {
                stripe_id: "sub_1".to_string(),
                org_id: org.id.clone(),
                status: "active".to_string(),
                price_id: "price_123".to_string(),
                current_period_start: now(),
                current_period_end: now() + 30 * 86400,
                cancel_at_period_end: false,
                synced_at: now(),
            },
        )
        .unwrap();

        queries::insert_invoice(
            &conn,
            &CreateInvoice {
                stripe_id: "in_recent".to_string(),
                org_id: org.id.clone(),
                amount_paid: 2000,
                status: "paid".to_string(),
                subscription_id: Some("sub_1".to_string()),
                created_at: now(),
            },
        )
        .unwrap();
        queries::insert_invoice(
            &conn,
            &CreateInvoice {
                stripe_id: "in_ancient".to_string(),
                org_id: org.id,
                amount_paid: 5000,
                status: "paid".to_string(),
                subscription_id: Some("sub_1".to_string()),
                // Two years back: counts toward the total, not the buckets
                created_at: now() - 2 * 365 * 86400,
            },
        )
        .unwrap();
    }

    let app = app(fx.state);
    let response = app
        .oneshot(json_request("GET", "/admin/stats", Some(&fx.admin_token), None))
        .await
        .unwrap();
    let body = expect_status(response, StatusCode::OK).await;

    assert_eq!(body["users"]["total"], 3);
    assert_eq!(body["subscriptions"]["total"], 1);
    assert_eq!(body["revenue"]["total_cents"], 7000);

    let user_months = body["users"]["by_month"].as_array().unwrap();
    assert_eq!(user_months.len(), 6);
    // All three accounts were created just now, i.e. in the last bucket
    assert_eq!(user_months[5]["count"], 3);

    let revenue_months = body["revenue"]["by_month"].as_array().unwrap();
    assert_eq!(revenue_months[5]["amount_cents"], 2000);
    let bucketed: i64 = revenue_months
        .iter()
        .map(|m| m["amount_cents"].as_i64().unwrap())
        .sum();
    assert_eq!(bucketed, 2000, "ancient invoice stays out of the window");
}
