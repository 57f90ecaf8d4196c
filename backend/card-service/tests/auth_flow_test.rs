mod common;

use actix_web::{body::to_bytes, test, App};
use serial_test::serial;
use uuid::Uuid;

use card_service::routes;

#[actix_web::test]
#[serial]
async fn register_then_login_returns_token_for_the_account() {
    let (_pg, pool) = common::start_postgres().await;
    let keys = common::test_keys();
    let app = test::init_service(App::new().configure(|cfg| {
        routes::configure(cfg, pool.clone(), keys.clone(), common::relaxed_limiters())
    }))
    .await;

    let req = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(serde_json::json!({ "username": "alice", "password": "hunter22" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), 201);

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(serde_json::json!({ "username": "alice", "password": "hunter22" }))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let token = body["token"].as_str().expect("login response carries a token");

    let claims = keys.decode(token).expect("token verifies with service keys");
    assert!(Uuid::parse_str(&claims.sub).is_ok());
    assert!(!claims.is_admin);
}

#[actix_web::test]
#[serial]
async fn registration_enforces_length_bounds() {
    let (_pg, pool) = common::start_postgres().await;
    let app = test::init_service(App::new().configure(|cfg| {
        routes::configure(
            cfg,
            pool.clone(),
            common::test_keys(),
            common::relaxed_limiters(),
        )
    }))
    .await;

    for payload in [
        serde_json::json!({ "username": "abc", "password": "validpass" }),
        serde_json::json!({ "username": "a".repeat(26), "password": "validpass" }),
        serde_json::json!({ "username": "validname", "password": "abc" }),
        serde_json::json!({ "username": "validname", "password": "a".repeat(26) }),
    ] {
        let req = test::TestRequest::post()
            .uri("/auth/register")
            .set_json(payload)
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), 400);

        let body: serde_json::Value = test::read_body_json(res).await;
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }
}

#[actix_web::test]
#[serial]
async fn duplicate_username_is_a_conflict() {
    let (_pg, pool) = common::start_postgres().await;
    let app = test::init_service(App::new().configure(|cfg| {
        routes::configure(
            cfg,
            pool.clone(),
            common::test_keys(),
            common::relaxed_limiters(),
        )
    }))
    .await;

    let payload = serde_json::json!({ "username": "alice", "password": "hunter22" });
    let req = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(payload.clone())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 201);

    let req = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(payload)
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), 409);

    let body: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(body["error"], "CONFLICT");
}

#[actix_web::test]
#[serial]
async fn login_failures_are_indistinguishable() {
    let (_pg, pool) = common::start_postgres().await;
    let app = test::init_service(App::new().configure(|cfg| {
        routes::configure(
            cfg,
            pool.clone(),
            common::test_keys(),
            common::relaxed_limiters(),
        )
    }))
    .await;

    let req = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(serde_json::json!({ "username": "alice", "password": "hunter22" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 201);

    // Unknown user.
    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(serde_json::json!({ "username": "nobody", "password": "whatever" }))
        .to_request();
    let unknown_user = test::call_service(&app, req).await;
    assert_eq!(unknown_user.status(), 401);
    let unknown_body: serde_json::Value = test::read_body_json(unknown_user).await;

    // Known user, wrong password.
    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(serde_json::json!({ "username": "alice", "password": "wrong" }))
        .to_request();
    let wrong_password = test::call_service(&app, req).await;
    assert_eq!(wrong_password.status(), 401);
    let wrong_body: serde_json::Value = test::read_body_json(wrong_password).await;

    // Identical bodies, so responses cannot be used to probe for
    // existing usernames.
    assert_eq!(unknown_body, wrong_body);
}

#[actix_web::test]
#[serial]
async fn login_requires_both_fields() {
    let (_pg, pool) = common::start_postgres().await;
    let app = test::init_service(App::new().configure(|cfg| {
        routes::configure(
            cfg,
            pool.clone(),
            common::test_keys(),
            common::relaxed_limiters(),
        )
    }))
    .await;

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(serde_json::json!({ "username": "  ", "password": "" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), 400);
}

#[actix_web::test]
#[serial]
async fn usernames_are_trimmed_before_storage() {
    let (_pg, pool) = common::start_postgres().await;
    let app = test::init_service(App::new().configure(|cfg| {
        routes::configure(
            cfg,
            pool.clone(),
            common::test_keys(),
            common::relaxed_limiters(),
        )
    }))
    .await;

    let req = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(serde_json::json!({ "username": "  alice  ", "password": "hunter22" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 201);

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(serde_json::json!({ "username": "alice", "password": "hunter22" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), 200);
}

#[actix_web::test]
#[serial]
async fn register_rate_limit_blocks_third_attempt_per_ip() {
    let (_pg, pool) = common::start_postgres().await;
    let app = test::init_service(App::new().configure(|cfg| {
        routes::configure(
            cfg,
            pool.clone(),
            common::test_keys(),
            common::default_limiters(),
        )
    }))
    .await;

    for name in ["user_one", "user_two"] {
        let req = test::TestRequest::post()
            .uri("/auth/register")
            .set_json(serde_json::json!({ "username": name, "password": "hunter22" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 201);
    }

    // Third attempt from the same client is throttled before the
    // handler runs.
    let req = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(serde_json::json!({ "username": "user_three", "password": "hunter22" }))
        .to_request();
    let err = test::try_call_service(&app, req)
        .await
        .expect_err("third registration should be rate limited");
    let res = err.as_response_error().error_response();
    assert_eq!(res.status(), 429);
    assert!(res.headers().contains_key("Retry-After"));

    let body = to_bytes(res.into_body()).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["error"], "RATE_LIMIT_EXCEEDED");
    let hint = body["retry_after_seconds"]
        .as_u64()
        .expect("429 body carries a retry hint");
    assert!(hint >= 1 && hint <= 60);

    // A different client IP is not affected.
    let req = test::TestRequest::post()
        .uri("/auth/register")
        .insert_header(("X-Forwarded-For", "10.1.2.3"))
        .set_json(serde_json::json!({ "username": "user_three", "password": "hunter22" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 201);
}

#[actix_web::test]
#[serial]
async fn login_rate_limit_blocks_fourth_attempt_per_ip() {
    let (_pg, pool) = common::start_postgres().await;
    let app = test::init_service(App::new().configure(|cfg| {
        routes::configure(
            cfg,
            pool.clone(),
            common::test_keys(),
            common::default_limiters(),
        )
    }))
    .await;

    let req = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(serde_json::json!({ "username": "alice", "password": "hunter22" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 201);

    // Failed attempts count against the window too.
    for _ in 0..3 {
        let req = test::TestRequest::post()
            .uri("/auth/login")
            .set_json(serde_json::json!({ "username": "alice", "password": "wrong" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 401);
    }

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(serde_json::json!({ "username": "alice", "password": "hunter22" }))
        .to_request();
    let err = test::try_call_service(&app, req)
        .await
        .expect_err("fourth login attempt should be rate limited");
    assert_eq!(err.as_response_error().status_code(), 429);
}

#[actix_web::test]
#[serial]
async fn card_routes_require_a_valid_token() {
    let (_pg, pool) = common::start_postgres().await;
    let app = test::init_service(App::new().configure(|cfg| {
        routes::configure(
            cfg,
            pool.clone(),
            common::test_keys(),
            common::relaxed_limiters(),
        )
    }))
    .await;

    let req = test::TestRequest::get().uri("/cards").to_request();
    let err = test::try_call_service(&app, req)
        .await
        .expect_err("missing token should be rejected");
    assert_eq!(err.as_response_error().status_code(), 401);

    let req = test::TestRequest::get()
        .uri("/cards")
        .insert_header(("Authorization", "Bearer not.a.token"))
        .to_request();
    let err = test::try_call_service(&app, req)
        .await
        .expect_err("garbage token should be rejected");
    assert_eq!(err.as_response_error().status_code(), 401);
}
