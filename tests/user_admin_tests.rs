#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use serde_json::json;

#[actix_web::test]
async fn test_add_user_and_list_users() {
    let app = setup_app!();

    let req = test::TestRequest::post()
        .uri("/api/add-user")
        .set_json(common::sign_up_body("dana_l"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    // Admin creation does not start a session.
    assert!(!resp.response().cookies().any(|c| c.name() == "token"));
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "User added successfully");

    let _ = sign_up!(app, "alice");

    let req = test::TestRequest::get().uri("/api/users").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    let users = body.as_array().expect("user list");
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u.get("password").is_none()));
}

#[actix_web::test]
async fn test_update_user_changes_profile() {
    let app = setup_app!();
    let (user_id, _) = sign_up!(app, "dana_l");

    let req = test::TestRequest::patch()
        .uri(&format!("/api/update-user/{}", user_id))
        .set_json(json!({"fullName": "Dana Cohen", "username": "dana_c"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "User updated successfully");
    assert_eq!(body["user"]["fullName"], "Dana Cohen");
    assert_eq!(body["user"]["username"], "dana_c");

    // The old username no longer signs in.
    let req = test::TestRequest::post()
        .uri("/api/sign-in")
        .set_json(json!({"username": "dana_l", "password": "secret12"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/sign-in")
        .set_json(json!({"username": "dana_c", "password": "secret12"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
}

#[actix_web::test]
async fn test_update_user_rejects_taken_username() {
    let app = setup_app!();
    let (user_id, _) = sign_up!(app, "dana_l");
    let _ = sign_up!(app, "alice");

    let req = test::TestRequest::patch()
        .uri(&format!("/api/update-user/{}", user_id))
        .set_json(json!({"username": "alice"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Username already exists");
}

#[actix_web::test]
async fn test_update_user_requires_a_field() {
    let app = setup_app!();
    let (user_id, _) = sign_up!(app, "dana_l");

    let req = test::TestRequest::patch()
        .uri(&format!("/api/update-user/{}", user_id))
        .set_json(json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_delete_user() {
    let app = setup_app!();
    let (user_id, cookie) = sign_up!(app, "dana_l");

    let req = test::TestRequest::delete()
        .uri(&format!("/api/delete-user/{}", user_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "User deleted successfully");

    // The session outlives the user but no longer resolves.
    let req = test::TestRequest::get()
        .uri("/api/me")
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri(&format!("/api/get-expenses/{}", user_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/delete-user/{}", user_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_admin_routes_validate_user_id() {
    let app = setup_app!();

    let req = test::TestRequest::delete()
        .uri("/api/delete-user/xyz")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Invalid user ID");

    let req = test::TestRequest::patch()
        .uri("/api/update-user/xyz")
        .set_json(json!({"fullName": "Dana Cohen"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
