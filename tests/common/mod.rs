#![allow(dead_code)]

use serde_json::{Value, json};

pub const TEST_SECRET: &str = "test-secret-key-for-integration-tests";

/// Builds an in-memory app with the full `/api` surface.
macro_rules! setup_app {
    () => {{
        let state = actix_web::web::Data::new(
            finance_tracker::presentation::handlers::AppState::new(
                std::sync::Arc::new(
                    finance_tracker::data::user_repository::InMemoryUserRepository::new(),
                ),
                std::sync::Arc::new(finance_tracker::data::memory::InMemoryEntryRepository::new()),
                std::sync::Arc::new(finance_tracker::data::memory::InMemoryEntryRepository::new()),
                common::TEST_SECRET.to_string(),
            ),
        );

        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(state.clone())
                .configure(finance_tracker::presentation::routes::configure),
        )
        .await
    }};
}

/// Signs a user up and yields `(user_id, session_cookie)`.
macro_rules! sign_up {
    ($app:expr, $username:expr) => {{
        let req = actix_web::test::TestRequest::post()
            .uri("/api/sign-up")
            .set_json(common::sign_up_body($username))
            .to_request();
        let resp = actix_web::test::call_service(&$app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::CREATED);
        let cookie = resp
            .response()
            .cookies()
            .find(|c| c.name() == "token")
            .expect("session cookie")
            .into_owned();
        let body: serde_json::Value = actix_web::test::read_body_json(resp).await;
        let user_id = body["user"]["_id"].as_str().expect("user id").to_string();
        (user_id, cookie)
    }};
}

pub fn sign_up_body(username: &str) -> Value {
    json!({
        "fullName": "Test User",
        "username": username,
        "email": format!("{}@example.com", username),
        "password": "secret12",
    })
}

pub fn expense_body(title: &str, amount: f64, tag: &str) -> Value {
    json!({
        "title": title,
        "description": "Morning",
        "amount": amount,
        "tag": tag,
    })
}
