//! Tests for the administration handlers.

use actix_web::http::StatusCode;
use actix_web::test;
use rstest::rstest;
use serde_json::json;

use crate::domain::SELF_DELETE_MESSAGE;
use crate::inbound::http::test_utils::{login_cookie, status_and_json};
use crate::server::build_app;
use crate::test_support::TestBackend;

const AUDIT_ROLE: u32 = 2;
const OPERATOR_ROLE: u32 = 3;

#[rstest]
#[case::list_users(test::TestRequest::get().uri("/admin/users"))]
#[case::list_roles(test::TestRequest::get().uri("/admin/roles"))]
#[case::create_role(test::TestRequest::post().uri("/admin/roles").set_json(json!({ "name": "Contractor" })))]
#[case::delete_role(test::TestRequest::delete().uri("/admin/roles/1"))]
#[actix_web::test]
async fn accounts_without_manage_users_are_forbidden(#[case] request: test::TestRequest) {
    let backend = TestBackend::new().await;
    backend.account("ada", "pw", "Engineer").await;
    let app = test::init_service(build_app(backend.app_dependencies())).await;
    let cookie = login_cookie(&app, "ada", "pw").await;

    let res = test::call_service(&app, request.cookie(cookie).to_request()).await;
    let (status, body) = status_and_json(res).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");
}

#[actix_web::test]
async fn managers_create_and_list_accounts() {
    let backend = TestBackend::new().await;
    backend.account("boss", "pw", "Manager").await;
    let app = test::init_service(build_app(backend.app_dependencies())).await;
    let cookie = login_cookie(&app, "boss", "pw").await;

    let create = |body| {
        test::TestRequest::post()
            .uri("/admin/users")
            .cookie(cookie.clone())
            .set_json(body)
            .to_request()
    };

    let res = test::call_service(
        &app,
        create(json!({ "username": "ada", "password": "pw", "role_id": AUDIT_ROLE })),
    )
    .await;
    let (status, created) = status_and_json(res).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["username"], "ada");
    assert_eq!(created["role_name"], "Audit");

    let res = test::call_service(
        &app,
        create(json!({ "username": "ada", "password": "pw", "role_id": AUDIT_ROLE })),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = test::call_service(
        &app,
        create(json!({ "username": "eve", "password": "pw", "role_id": 99 })),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = test::call_service(&app, create(json!({ "username": "eve", "password": "pw" }))).await;
    let (status, body) = status_and_json(res).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Role is required");

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/admin/users")
            .cookie(cookie.clone())
            .to_request(),
    )
    .await;
    let (_, listed) = status_and_json(res).await;
    let names: Vec<&str> = listed
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|row| row["username"].as_str())
        .collect();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"ada"));
    assert!(names.contains(&"boss"));

    // The new account can log in straight away.
    login_cookie(&app, "ada", "pw").await;
}

#[actix_web::test]
async fn managers_cannot_delete_themselves() {
    let backend = TestBackend::new().await;
    let boss = backend.account("boss", "pw", "Manager").await;
    let app = test::init_service(build_app(backend.app_dependencies())).await;
    let cookie = login_cookie(&app, "boss", "pw").await;

    let res = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/admin/users/{}", boss.id()))
            .cookie(cookie)
            .to_request(),
    )
    .await;
    let (status, body) = status_and_json(res).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], SELF_DELETE_MESSAGE);
}

#[rstest]
#[case::not_a_uuid("/admin/users/42")]
#[case::unknown("/admin/users/3fa85f64-5717-4562-b3fc-2c963f66afa6")]
#[actix_web::test]
async fn deleting_unknown_accounts_is_not_found(#[case] uri: &str) {
    let backend = TestBackend::new().await;
    backend.account("boss", "pw", "Manager").await;
    let app = test::init_service(build_app(backend.app_dependencies())).await;
    let cookie = login_cookie(&app, "boss", "pw").await;

    let res = test::call_service(
        &app,
        test::TestRequest::delete().uri(uri).cookie(cookie).to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn password_resets_and_role_changes_apply_immediately() {
    let backend = TestBackend::new().await;
    backend.account("boss", "pw", "Manager").await;
    let ada = backend.account("ada", "old", "Investor").await;
    let app = test::init_service(build_app(backend.app_dependencies())).await;
    let boss_cookie = login_cookie(&app, "boss", "pw").await;
    let ada_cookie = login_cookie(&app, "ada", "old").await;

    let res = test::call_service(
        &app,
        test::TestRequest::put()
            .uri(&format!("/admin/users/{}/role", ada.id()))
            .cookie(boss_cookie.clone())
            .set_json(json!({ "role_id": OPERATOR_ROLE }))
            .to_request(),
    )
    .await;
    let (status, body) = status_and_json(res).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role_name"], "Operator");

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/dashboard")
            .cookie(ada_cookie)
            .to_request(),
    )
    .await;
    let (_, dashboard) = status_and_json(res).await;
    assert_eq!(dashboard["role_name"], "Operator");
    assert_eq!(dashboard["panel_4"], true);

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/admin/users/{}/password", ada.id()))
            .cookie(boss_cookie)
            .set_json(json!({ "new_password": "new" }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    login_cookie(&app, "ada", "new").await;
}

#[actix_web::test]
async fn new_roles_start_undefined_until_permissions_are_set() {
    let backend = TestBackend::new().await;
    backend.account("boss", "pw", "Manager").await;
    let app = test::init_service(build_app(backend.app_dependencies())).await;
    let cookie = login_cookie(&app, "boss", "pw").await;

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/admin/roles")
            .cookie(cookie.clone())
            .set_json(json!({ "name": "Contractor" }))
            .to_request(),
    )
    .await;
    let (status, role) = status_and_json(res).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(role["name"], "Contractor");
    assert!(role["capabilities"].is_null());
    let role_id = role["id"].as_u64().expect("role id");

    let res = test::call_service(
        &app,
        test::TestRequest::put()
            .uri(&format!("/admin/roles/{role_id}/permissions"))
            .cookie(cookie.clone())
            .set_json(json!({ "can_view_panel_1": true, "can_export_data": true }))
            .to_request(),
    )
    .await;
    let (status, updated) = status_and_json(res).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["capabilities"]["can_view_panel_1"], true);
    assert_eq!(updated["capabilities"]["can_export_data"], true);
    assert_eq!(updated["capabilities"]["can_view_panel_2"], false);

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/admin/roles")
            .cookie(cookie)
            .set_json(json!({ "name": "Contractor" }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn roles_in_use_cannot_be_deleted() {
    let backend = TestBackend::new().await;
    backend.account("boss", "pw", "Manager").await;
    backend.account("ada", "pw", "Audit").await;
    let app = test::init_service(build_app(backend.app_dependencies())).await;
    let cookie = login_cookie(&app, "boss", "pw").await;
    let delete = |id: u32| {
        test::TestRequest::delete()
            .uri(&format!("/admin/roles/{id}"))
            .cookie(cookie.clone())
            .to_request()
    };

    let res = test::call_service(&app, delete(AUDIT_ROLE)).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = test::call_service(&app, delete(OPERATOR_ROLE)).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = test::call_service(&app, delete(OPERATOR_ROLE)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
