mod common;

use axum::http::StatusCode;
use common::{json_body, TestApp};
use serde_json::json;
use tenant_auth::{models::CompanyRole, services::CredentialStore};

#[tokio::test]
async fn test_create_company_selects_it_and_makes_caller_admin() {
    let app = TestApp::spawn();
    let (token, user_id, company_id) = app.owner_with_company("boss@example.com", "Acme").await;

    assert_eq!(
        app.store.user(user_id).unwrap().selected_company_id,
        Some(company_id)
    );

    let profile = json_body(app.get("/users/me", Some(&token)).await).await;
    assert_eq!(profile["selected_company"]["id"], company_id);
    assert_eq!(profile["selected_company"]["owner_id"], user_id);
    assert_eq!(profile["is_owner"], true);
    assert_eq!(profile["companies"][0]["role"], "admin");
    assert_eq!(profile["companies"][0]["is_owner"], true);
}

#[tokio::test]
async fn test_second_company_is_refused_without_changes() {
    let app = TestApp::spawn();
    let (token, user_id, company_id) = app.owner_with_company("boss@example.com", "Acme").await;

    let res = app
        .post("/companies", Some(&token), json!({ "name": "Acme Two" }))
        .await;
    assert_eq!(res.status(), StatusCode::PRECONDITION_FAILED);

    assert_eq!(app.store.get_user_companies(user_id).await.unwrap().len(), 1);
    assert_eq!(
        app.store.user(user_id).unwrap().selected_company_id,
        Some(company_id)
    );
}

#[tokio::test]
async fn test_create_company_requires_a_name() {
    let app = TestApp::spawn();
    let user = app.create_user("a@example.com", None).await;
    let token = app.login("a@example.com").await;

    let res = app
        .post("/companies", Some(&token), json!({ "name": "   " }))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(!app.store.is_user_company_owner(user.id).await.unwrap());
}

#[tokio::test]
async fn test_select_company_requires_membership() {
    let app = TestApp::spawn();
    let (_, _, acme) = app.owner_with_company("boss@example.com", "Acme").await;
    let (_, _, globex) = app.owner_with_company("rival@example.com", "Globex").await;

    let member = app.create_user("m@example.com", None).await;
    app.add_member(acme, member.id, CompanyRole::Member).await;
    let token = app.login("m@example.com").await;

    let res = app
        .post("/companies/select", Some(&token), json!({ "company_id": globex }))
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.store.user(member.id).unwrap().selected_company_id, None);

    let res = app
        .post("/companies/select", Some(&token), json!({ "company_id": acme }))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let selected = json_body(res).await;
    assert_eq!(selected["id"], acme);
    assert_eq!(selected["role"], "member");
    assert_eq!(selected["is_owner"], false);

    // Same token now carries the new selection
    let profile = json_body(app.get("/users/me", Some(&token)).await).await;
    assert_eq!(profile["selected_company"]["id"], acme);
    assert_eq!(app.store.token_lookups(), 0);
}

#[tokio::test]
async fn test_select_company_rejects_non_positive_id() {
    let app = TestApp::spawn();
    app.create_user("a@example.com", None).await;
    let token = app.login("a@example.com").await;

    let res = app
        .post("/companies/select", Some(&token), json!({ "company_id": 0 }))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invite_existing_user_keeps_their_selection() {
    let app = TestApp::spawn();
    let (admin, _, acme) = app.owner_with_company("boss@example.com", "Acme").await;
    let (_, rival_id, globex) = app.owner_with_company("rival@example.com", "Globex").await;

    let res = app
        .post(
            "/companies/invitations",
            Some(&admin),
            json!({ "email": "rival@example.com", "name": "Rival", "role": "admin" }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = json_body(res).await;
    assert_eq!(body["created"], false);
    assert_eq!(body["user_id"], rival_id);
    assert_eq!(body["role"], "admin");

    assert_eq!(
        app.store.user(rival_id).unwrap().selected_company_id,
        Some(globex)
    );
    assert_eq!(
        app.store.get_company_user_role(acme, rival_id).await.unwrap(),
        Some(CompanyRole::Admin)
    );
}

#[tokio::test]
async fn test_invite_duplicate_member_conflicts() {
    let app = TestApp::spawn();
    let (admin, _, _) = app.owner_with_company("boss@example.com", "Acme").await;
    let invite = json!({ "email": "a@x.com", "name": "A", "role": "member" });

    let res = app
        .post("/companies/invitations", Some(&admin), invite.clone())
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = app
        .post("/companies/invitations", Some(&admin), invite)
        .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_invite_refused_for_non_admin_whatever_the_target() {
    let app = TestApp::spawn();
    let (_, _, acme) = app.owner_with_company("boss@example.com", "Acme").await;
    let member = app.create_user("m@example.com", Some(acme)).await;
    app.add_member(acme, member.id, CompanyRole::Member).await;
    let token = app.login("m@example.com").await;

    for email in ["boss@example.com", "new@example.com"] {
        let res = app
            .post(
                "/companies/invitations",
                Some(&token),
                json!({ "email": email, "name": "X", "role": "member" }),
            )
            .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }
    assert!(app
        .store
        .find_user_by_email("new@example.com")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_invite_checks_selection_before_fields() {
    let app = TestApp::spawn();
    app.create_user("a@example.com", None).await;
    let token = app.login("a@example.com").await;

    // Invalid body, but the missing selection is reported first
    let res = app
        .post(
            "/companies/invitations",
            Some(&token),
            json!({ "email": "not-an-email", "name": "", "role": "owner" }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::PRECONDITION_FAILED);
}

#[tokio::test]
async fn test_invite_rejects_bad_fields() {
    let app = TestApp::spawn();
    let (admin, _, _) = app.owner_with_company("boss@example.com", "Acme").await;

    for body in [
        json!({ "email": "a@x.com", "name": "A", "role": "owner" }),
        json!({ "email": "not-an-email", "name": "A", "role": "member" }),
        json!({ "email": "a@x.com", "name": "", "role": "member" }),
    ] {
        let res = app
            .post("/companies/invitations", Some(&admin), body)
            .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_list_members_of_selected_company() {
    let app = TestApp::spawn();
    let (admin, owner_id, acme) = app.owner_with_company("boss@example.com", "Acme").await;
    let member = app.create_user("m@example.com", Some(acme)).await;
    app.add_member(acme, member.id, CompanyRole::Member).await;

    let res = app.get("/companies/members", Some(&admin)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let members = json_body(res).await;
    let members = members.as_array().unwrap();
    assert_eq!(members.len(), 2);
    assert!(members
        .iter()
        .any(|m| m["user_id"] == owner_id && m["role"] == "admin"));
    assert!(members
        .iter()
        .any(|m| m["user_id"] == member.id && m["email"] == "m@example.com"));

    // Plain members can list too
    let token = app.login("m@example.com").await;
    assert_eq!(
        app.get("/companies/members", Some(&token)).await.status(),
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_remove_member_revokes_their_selection() {
    let app = TestApp::spawn();
    let (admin, _, acme) = app.owner_with_company("boss@example.com", "Acme").await;
    let member = app.create_user("m@example.com", Some(acme)).await;
    app.add_member(acme, member.id, CompanyRole::Member).await;
    let member_token = app.login("m@example.com").await;

    let profile = json_body(app.get("/users/me", Some(&member_token)).await).await;
    assert_eq!(profile["selected_company"]["id"], acme);

    let res = app
        .delete(&format!("/companies/members/{}", member.id), Some(&admin))
        .await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    // Token still valid, but the stale selection is gone
    let res = app.get("/users/me", Some(&member_token)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let profile = json_body(res).await;
    assert!(profile["selected_company"].is_null());
    assert_eq!(profile["companies"].as_array().unwrap().len(), 0);

    let res = app.get("/companies/members", Some(&member_token)).await;
    assert_eq!(res.status(), StatusCode::PRECONDITION_FAILED);
}

#[tokio::test]
async fn test_remove_member_guards() {
    let app = TestApp::spawn();
    let (admin, owner_id, acme) = app.owner_with_company("boss@example.com", "Acme").await;

    let co_admin = app.create_user("co@example.com", Some(acme)).await;
    app.add_member(acme, co_admin.id, CompanyRole::Admin).await;
    let co_token = app.login("co@example.com").await;

    let member = app.create_user("m@example.com", Some(acme)).await;
    app.add_member(acme, member.id, CompanyRole::Member).await;
    let member_token = app.login("m@example.com").await;

    // Self removal
    let res = app
        .delete(&format!("/companies/members/{}", owner_id), Some(&admin))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Another admin cannot remove the owner
    let res = app
        .delete(&format!("/companies/members/{}", owner_id), Some(&co_token))
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Members cannot remove anyone
    let res = app
        .delete(&format!("/companies/members/{}", co_admin.id), Some(&member_token))
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Unknown target
    let res = app
        .delete("/companies/members/9999", Some(&admin))
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    assert_eq!(
        app.store.get_company_members(acme).await.unwrap().len(),
        3
    );
}
