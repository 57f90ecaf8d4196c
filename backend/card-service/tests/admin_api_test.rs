mod common;

use actix_web::{test, App};
use serial_test::serial;
use uuid::Uuid;

use card_service::db;
use card_service::routes;

#[actix_web::test]
#[serial]
async fn admin_routes_reject_regular_accounts() {
    let (_pg, pool) = common::start_postgres().await;
    let keys = common::test_keys();
    let (_alice, token) = common::seed_user(&pool, &keys, "alice", false).await;
    let app = test::init_service(App::new().configure(|cfg| {
        routes::configure(cfg, pool.clone(), keys.clone(), common::relaxed_limiters())
    }))
    .await;

    let req = test::TestRequest::get()
        .uri("/admin/users")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let err = test::try_call_service(&app, req)
        .await
        .expect_err("non-admin should be rejected at the gate");
    assert_eq!(err.as_response_error().status_code(), 403);

    let req = test::TestRequest::delete()
        .uri(&format!("/admin/cards/{}", Uuid::new_v4()))
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let err = test::try_call_service(&app, req)
        .await
        .expect_err("non-admin should be rejected at the gate");
    assert_eq!(err.as_response_error().status_code(), 403);
}

#[actix_web::test]
#[serial]
async fn user_listing_never_exposes_credentials() {
    let (_pg, pool) = common::start_postgres().await;
    let keys = common::test_keys();
    let (_root, admin_token) = common::seed_user(&pool, &keys, "root", true).await;
    let (_alice, _) = common::seed_user(&pool, &keys, "alice", false).await;
    let app = test::init_service(App::new().configure(|cfg| {
        routes::configure(cfg, pool.clone(), keys.clone(), common::relaxed_limiters())
    }))
    .await;

    let req = test::TestRequest::get()
        .uri("/admin/users")
        .insert_header(("Authorization", format!("Bearer {admin_token}")))
        .to_request();
    let listed: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let users = listed.as_array().unwrap();
    assert_eq!(users.len(), 2);

    let usernames: Vec<&str> = users
        .iter()
        .map(|u| u["username"].as_str().unwrap())
        .collect();
    assert!(usernames.contains(&"root"));
    assert!(usernames.contains(&"alice"));
    for user in users {
        let fields = user.as_object().unwrap();
        assert!(!fields.contains_key("password_hash"));
        assert!(fields.contains_key("is_admin"));
    }
}

#[actix_web::test]
#[serial]
async fn admins_cannot_delete_their_own_account() {
    let (_pg, pool) = common::start_postgres().await;
    let keys = common::test_keys();
    let (root, admin_token) = common::seed_user(&pool, &keys, "root", true).await;
    let app = test::init_service(App::new().configure(|cfg| {
        routes::configure(cfg, pool.clone(), keys.clone(), common::relaxed_limiters())
    }))
    .await;

    let req = test::TestRequest::delete()
        .uri(&format!("/admin/users/{root}"))
        .insert_header(("Authorization", format!("Bearer {admin_token}")))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), 403);
    let body: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(body["error"], "FORBIDDEN");

    // The account is still there.
    let req = test::TestRequest::get()
        .uri("/admin/users")
        .insert_header(("Authorization", format!("Bearer {admin_token}")))
        .to_request();
    let listed: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[actix_web::test]
#[serial]
async fn deleting_a_user_removes_their_cards() {
    let (_pg, pool) = common::start_postgres().await;
    let keys = common::test_keys();
    let (_root, admin_token) = common::seed_user(&pool, &keys, "root", true).await;
    let (bob, _) = common::seed_user(&pool, &keys, "bob", false).await;
    let app = test::init_service(App::new().configure(|cfg| {
        routes::configure(cfg, pool.clone(), keys.clone(), common::relaxed_limiters())
    }))
    .await;

    for i in 1..=3 {
        db::cards::insert(&pool, bob, &format!("q{i}"), &format!("a{i}"))
            .await
            .unwrap();
    }

    let req = test::TestRequest::delete()
        .uri(&format!("/admin/users/{bob}"))
        .insert_header(("Authorization", format!("Bearer {admin_token}")))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 204);

    let req = test::TestRequest::get()
        .uri("/admin/users")
        .insert_header(("Authorization", format!("Bearer {admin_token}")))
        .to_request();
    let listed: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let usernames: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap())
        .collect();
    assert!(!usernames.contains(&"bob"));

    // The foreign key cascade removed the cards with the account.
    let count = db::cards::count_by_owner(&pool, bob).await.unwrap();
    assert_eq!(count, 0);
}

#[actix_web::test]
#[serial]
async fn deleting_an_unknown_user_is_a_404() {
    let (_pg, pool) = common::start_postgres().await;
    let keys = common::test_keys();
    let (_root, admin_token) = common::seed_user(&pool, &keys, "root", true).await;
    let app = test::init_service(App::new().configure(|cfg| {
        routes::configure(cfg, pool.clone(), keys.clone(), common::relaxed_limiters())
    }))
    .await;

    let req = test::TestRequest::delete()
        .uri(&format!("/admin/users/{}", Uuid::new_v4()))
        .insert_header(("Authorization", format!("Bearer {admin_token}")))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);

    let req = test::TestRequest::delete()
        .uri("/admin/users/not-a-uuid")
        .insert_header(("Authorization", format!("Bearer {admin_token}")))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);
}

#[actix_web::test]
#[serial]
async fn admins_can_delete_any_card() {
    let (_pg, pool) = common::start_postgres().await;
    let keys = common::test_keys();
    let (_root, admin_token) = common::seed_user(&pool, &keys, "root", true).await;
    let (bob, _) = common::seed_user(&pool, &keys, "bob", false).await;
    let app = test::init_service(App::new().configure(|cfg| {
        routes::configure(cfg, pool.clone(), keys.clone(), common::relaxed_limiters())
    }))
    .await;

    let card = db::cards::insert(&pool, bob, "reported question", "reported answer")
        .await
        .unwrap();

    let req = test::TestRequest::delete()
        .uri(&format!("/admin/cards/{}", card.id))
        .insert_header(("Authorization", format!("Bearer {admin_token}")))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 204);

    let req = test::TestRequest::delete()
        .uri(&format!("/admin/cards/{}", card.id))
        .insert_header(("Authorization", format!("Bearer {admin_token}")))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);

    let count = db::cards::count_by_owner(&pool, bob).await.unwrap();
    assert_eq!(count, 0);
}

#[actix_web::test]
#[serial]
async fn admins_can_inspect_any_collection() {
    let (_pg, pool) = common::start_postgres().await;
    let keys = common::test_keys();
    let (_root, admin_token) = common::seed_user(&pool, &keys, "root", true).await;
    let (bob, _) = common::seed_user(&pool, &keys, "bob", false).await;
    let (carol, _) = common::seed_user(&pool, &keys, "carol", false).await;
    let app = test::init_service(App::new().configure(|cfg| {
        routes::configure(cfg, pool.clone(), keys.clone(), common::relaxed_limiters())
    }))
    .await;

    db::cards::insert(&pool, bob, "bob's question", "bob's answer")
        .await
        .unwrap();

    let req = test::TestRequest::get()
        .uri(&format!("/admin/users/{bob}/cards"))
        .insert_header(("Authorization", format!("Bearer {admin_token}")))
        .to_request();
    let listed: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let cards = listed.as_array().unwrap();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0]["question"], "bob's question");

    // A user with no cards yields an empty list, not an error.
    let req = test::TestRequest::get()
        .uri(&format!("/admin/users/{carol}/cards"))
        .insert_header(("Authorization", format!("Bearer {admin_token}")))
        .to_request();
    let listed: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed.as_array().unwrap().len(), 0);
}
