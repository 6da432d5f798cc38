mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use chrono::{Duration, Utc};
use common::{json_body, TestApp};
use serde_json::json;
use tenant_auth::{
    config::AuthConfig,
    models::CompanyRole,
    services::CredentialStore,
};
use tower::util::ServiceExt;

#[tokio::test]
async fn test_request_otp_does_not_reveal_account_existence() {
    let app = TestApp::spawn();
    app.create_user("known@example.com", None).await;

    let known = app
        .post("/auth/otp", None, json!({ "email": "known@example.com" }))
        .await;
    let known_status = known.status();
    let known_body = json_body(known).await;

    let unknown = app
        .post("/auth/otp", None, json!({ "email": "ghost@example.com" }))
        .await;
    let unknown_status = unknown.status();
    let unknown_body = json_body(unknown).await;

    assert_eq!(known_status, StatusCode::OK);
    assert_eq!(known_status, unknown_status);
    assert_eq!(known_body, unknown_body);
    assert_eq!(app.mailer.sent().len(), 1);
}

#[tokio::test]
async fn test_login_token_is_served_from_cache() {
    let app = TestApp::spawn();
    let user = app.create_user("a@example.com", None).await;

    let token = app.login("a@example.com").await;
    let res = app.get("/users/me", Some(&token)).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await["id"], user.id);

    let res = app.get("/users/me", Some(&token)).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(app.store.token_lookups(), 0);
}

#[tokio::test]
async fn test_consumed_otp_cannot_login_twice() {
    let app = TestApp::spawn();
    app.create_user("a@example.com", None).await;

    app.post("/auth/otp", None, json!({ "email": "a@example.com" }))
        .await;
    let code = app.mailer.last_code_for("a@example.com").unwrap();

    let first = app
        .post(
            "/auth/login",
            None,
            json!({ "email": "a@example.com", "code": code }),
        )
        .await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .post(
            "/auth/login",
            None,
            json!({ "email": "a@example.com", "code": code }),
        )
        .await;
    assert_eq!(second.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_otp_is_rejected_even_when_code_matches() {
    let app = TestApp::spawn();
    let user = app.create_user("a@example.com", None).await;
    app.store
        .update_user_otp(
            user.id,
            Some("424242"),
            Some(Utc::now() - Duration::seconds(1)),
        )
        .await
        .unwrap();

    let res = app
        .post(
            "/auth/login",
            None,
            json!({ "email": "a@example.com", "code": "424242" }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_code_and_unknown_email() {
    let app = TestApp::spawn();
    app.create_user("a@example.com", None).await;
    app.post("/auth/otp", None, json!({ "email": "a@example.com" }))
        .await;
    let code = app.mailer.last_code_for("a@example.com").unwrap();
    let wrong = if code == "111111" { "222222" } else { "111111" };

    let res = app
        .post(
            "/auth/login",
            None,
            json!({ "email": "a@example.com", "code": wrong }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = app
        .post(
            "/auth/login",
            None,
            json!({ "email": "ghost@example.com", "code": "123456" }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reserved_identity_logs_in_with_fixed_code() {
    let app = TestApp::spawn();
    app.create_user("dev@localhost", None).await;

    let res = app
        .post("/auth/otp", None, json!({ "email": "dev@localhost" }))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(app.mailer.sent().is_empty());

    for _ in 0..2 {
        let res = app
            .post(
                "/auth/login",
                None,
                json!({ "email": "dev@localhost", "code": "123456" }),
            )
            .await;
        assert_eq!(res.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn test_new_login_revokes_previous_token() {
    let app = TestApp::spawn();
    app.create_user("a@example.com", None).await;

    let old = app.login("a@example.com").await;
    let new = app.login("a@example.com").await;
    assert_ne!(old, new);

    assert_eq!(
        app.get("/users/me", Some(&old)).await.status(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        app.get("/users/me", Some(&new)).await.status(),
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_otp_requests_are_rate_limited_per_ip() {
    let mut config = AuthConfig::default();
    config.rate_limit.otp_attempts = 2;
    let app = TestApp::with_config(config);

    let send = |ip: &'static str| {
        let router = app.router.clone();
        async move {
            router
                .oneshot(
                    Request::builder()
                        .method(Method::POST)
                        .uri("/auth/otp")
                        .header("content-type", "application/json")
                        .header("x-forwarded-for", ip)
                        .body(Body::from(json!({ "email": "a@example.com" }).to_string()))
                        .unwrap(),
                )
                .await
                .unwrap()
                .status()
        }
    };

    assert_eq!(send("10.1.1.1").await, StatusCode::OK);
    assert_eq!(send("10.1.1.1").await, StatusCode::OK);
    assert_eq!(send("10.1.1.1").await, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(send("10.1.1.2").await, StatusCode::OK);
}

/// Invite, OTP, login, bearer call, then a refused selection.
#[tokio::test]
async fn test_invite_login_and_select_end_to_end() {
    let app = TestApp::spawn();
    let (admin_token, _, company_id) = app.owner_with_company("boss@example.com", "Acme").await;
    let (_, _, other_company_id) = app.owner_with_company("rival@example.com", "Globex").await;

    // (1) invite a new email as member
    let res = app
        .post(
            "/companies/invitations",
            Some(&admin_token),
            json!({ "email": "a@x.com", "name": "A", "role": "member" }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let invited = json_body(res).await;
    assert_eq!(invited["created"], true);
    let invitee_id = invited["user_id"].as_i64().unwrap() as i32;

    let row = app.store.user(invitee_id).unwrap();
    assert_eq!(row.selected_company_id, Some(company_id));
    assert!(row.token.is_none());
    assert_eq!(
        app.store
            .get_company_user_role(company_id, invitee_id)
            .await
            .unwrap(),
        Some(CompanyRole::Member)
    );

    // (2) OTP + login
    let token = app.login("a@x.com").await;

    // (3) bearer call resolves to the invitee with the preset selection
    let res = app.get("/users/me", Some(&token)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let profile = json_body(res).await;
    assert_eq!(profile["id"], invitee_id);
    assert_eq!(profile["selected_company"]["id"], company_id);
    assert_eq!(profile["is_owner"], false);

    // (4) selecting a company the invitee does not belong to is refused
    let res = app
        .post(
            "/companies/select",
            Some(&token),
            json!({ "company_id": other_company_id }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    assert_eq!(
        app.store.user(invitee_id).unwrap().selected_company_id,
        Some(company_id)
    );
    let profile = json_body(app.get("/users/me", Some(&token)).await).await;
    assert_eq!(profile["selected_company"]["id"], company_id);
}
