//! End-to-end HTTP flows against a real Postgres.

mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use common::{bearer, TestContext, BASE_URL, PASSWORD, WEBHOOK_SECRET};
use movie_service::models::Role;
use movie_service::services::payment_gateway::sign_webhook_payload;
use rust_decimal::Decimal;
use serde_json::{json, Value};

#[actix_web::test]
async fn register_activate_login_and_logout_revokes_token() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/v1/accounts/register")
        .set_json(json!({"email": "New.User@Example.com", "password": PASSWORD}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["email"], "new.user@example.com");

    // Inactive accounts cannot log in yet
    let req = test::TestRequest::post()
        .uri("/api/v1/accounts/login")
        .set_json(json!({"email": "new.user@example.com", "password": PASSWORD}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let link = ctx
        .publisher
        .activation_link("new.user@example.com")
        .expect("activation email queued");
    let uri = link.strip_prefix(BASE_URL).expect("absolute link").to_string();
    let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(ctx
        .publisher
        .names()
        .contains(&"send_activation_complete_email"));

    let token = login!(app, "new.user@example.com");

    let req = test::TestRequest::get()
        .uri("/api/v1/cart")
        .insert_header(bearer(&token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/api/v1/accounts/logout")
        .insert_header(bearer(&token))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NO_CONTENT
    );

    let req = test::TestRequest::get()
        .uri("/api/v1/cart")
        .insert_header(bearer(&token))
        .to_request();
    let err = test::try_call_service(&app, req)
        .await
        .err()
        .expect("revoked token must be rejected");
    assert_eq!(
        err.as_response_error().status_code(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_web::test]
async fn duplicate_registration_conflicts() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);
    ctx.create_user("taken@example.com", Role::User).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/accounts/register")
        .set_json(json!({"email": "taken@example.com", "password": PASSWORD}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn updated_rating_replaces_previous_score() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);
    ctx.create_user("critic@example.com", Role::User).await;
    let movie_id = ctx.create_movie("Rated Movie", Decimal::new(999, 2)).await;
    let token = login!(app, "critic@example.com");

    for score in [4, 2] {
        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/movies/{movie_id}/rating"))
            .insert_header(bearer(&token))
            .set_json(json!({"rating": score}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/movies/{movie_id}"))
        .to_request();
    let movie: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(movie["rating_average"].as_f64(), Some(2.0));
    assert_eq!(movie["rating_count"], 1);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/movies/{movie_id}/rating"))
        .insert_header(bearer(&token))
        .set_json(json!({"rating": 11}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn paid_movie_cannot_be_bought_twice_and_paid_order_cannot_be_canceled() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);
    ctx.create_user("buyer@example.com", Role::User).await;
    let movie_id = ctx.create_movie("Bought Movie", Decimal::new(1250, 2)).await;
    let token = login!(app, "buyer@example.com");

    let req = test::TestRequest::post()
        .uri("/api/v1/cart/items")
        .insert_header(bearer(&token))
        .set_json(json!({"movie_id": movie_id}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/api/v1/orders")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let order: Value = test::read_body_json(resp).await;
    let order_id = order["id"].as_i64().expect("order id");
    assert_eq!(order["status"], "pending");

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/payments/orders/{order_id}/intent"))
        .insert_header(bearer(&token))
        .to_request();
    let intent: Value = test::call_and_read_body_json(&app, req).await;
    let intent_id = intent["external_payment_id"].as_str().expect("intent").to_string();

    let payload = json!({
        "type": "payment_intent.succeeded",
        "data": {"object": {"id": intent_id, "metadata": {"order_id": order_id.to_string()}}}
    })
    .to_string();
    let signature = sign_webhook_payload(
        payload.as_bytes(),
        WEBHOOK_SECRET,
        chrono::Utc::now().timestamp(),
    );

    for expected in ["ok", "already_processed"] {
        let req = test::TestRequest::post()
            .uri("/api/v1/payments/webhook")
            .insert_header(("Stripe-Signature", signature.clone()))
            .set_payload(payload.clone())
            .to_request();
        let ack: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(ack["status"], expected);
    }

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/orders/{order_id}"))
        .insert_header(bearer(&token))
        .to_request();
    let order: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(order["status"], "paid");

    // Paid movies leave the cart
    let req = test::TestRequest::get()
        .uri("/api/v1/cart")
        .insert_header(bearer(&token))
        .to_request();
    let cart: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(cart["items"].as_array().map(Vec::len), Some(0));

    let req = test::TestRequest::post()
        .uri("/api/v1/cart/items")
        .insert_header(bearer(&token))
        .set_json(json!({"movie_id": movie_id}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/orders/{order_id}/cancel"))
        .insert_header(bearer(&token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

    assert!(ctx.publisher.names().contains(&"send_payment_success_email"));
}

#[actix_web::test]
async fn webhook_with_bad_signature_is_rejected() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/v1/payments/webhook")
        .insert_header(("Stripe-Signature", "t=1,v1=deadbeef"))
        .set_payload(r#"{"type":"payment_intent.succeeded"}"#)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn replies_nest_under_parent_and_notify_its_author() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);
    let author_id = ctx.create_user("author@example.com", Role::User).await;
    ctx.create_user("replier@example.com", Role::User).await;
    let movie_id = ctx.create_movie("Discussed Movie", Decimal::new(500, 2)).await;
    let author = login!(app, "author@example.com");
    let replier = login!(app, "replier@example.com");

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/movies/{movie_id}/comments"))
        .insert_header(bearer(&author))
        .set_json(json!({"content": "Loved the soundtrack"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let root: Value = test::read_body_json(resp).await;
    let root_id = root["id"].as_i64().expect("comment id");

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/movies/{movie_id}/comments"))
        .insert_header(bearer(&replier))
        .set_json(json!({"content": "Same here", "parent_id": root_id}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/movies/{movie_id}/comments"))
        .insert_header(bearer(&replier))
        .to_request();
    let listing: Value = test::call_and_read_body_json(&app, req).await;
    let comments = listing["comments"].as_array().expect("comments");
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["user_id"], author_id);
    assert_eq!(comments[0]["replies"][0]["content"], "Same here");

    let req = test::TestRequest::get()
        .uri("/api/v1/notifications")
        .insert_header(bearer(&author))
        .to_request();
    let notifications: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(notifications.as_array().map(Vec::len), Some(1));
    assert!(ctx.publisher.names().contains(&"send_comment_reply_email"));

    // A reply to an unknown parent is refused
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/movies/{movie_id}/comments"))
        .insert_header(bearer(&replier))
        .set_json(json!({"content": "Orphan", "parent_id": 999_999}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn role_gates_on_staff_routes() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);
    ctx.create_user("plain@example.com", Role::User).await;
    ctx.create_user("mod@example.com", Role::Moderator).await;
    let plain = login!(app, "plain@example.com");
    let moderator = login!(app, "mod@example.com");

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/v1/moderator/users").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/v1/moderator/users")
        .insert_header(bearer(&plain))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri("/api/v1/moderator/users")
        .insert_header(bearer(&moderator))
        .to_request();
    let users: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(users["total_items"], 2);

    let req = test::TestRequest::get()
        .uri("/api/v1/admin/carts")
        .insert_header(bearer(&moderator))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn average_rating_is_mean_of_all_raters_and_clears_when_removed() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);
    ctx.create_user("first@example.com", Role::User).await;
    ctx.create_user("second@example.com", Role::User).await;
    let movie_id = ctx.create_movie("Shared Movie", Decimal::new(700, 2)).await;
    let first = login!(app, "first@example.com");
    let second = login!(app, "second@example.com");

    for (token, score) in [(&first, 4), (&second, 7)] {
        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/movies/{movie_id}/rating"))
            .insert_header(bearer(token))
            .set_json(json!({"rating": score}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
    }

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/movies/{movie_id}"))
        .to_request();
    let movie: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(movie["rating_average"].as_f64(), Some(5.5));
    assert_eq!(movie["rating_count"], 2);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/movies/{movie_id}/rating"))
        .insert_header(bearer(&second))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/movies/{movie_id}"))
        .to_request();
    let movie: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(movie["rating_average"].as_f64(), Some(4.0));
    assert_eq!(movie["rating_count"], 1);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/movies/{movie_id}/rating"))
        .insert_header(bearer(&first))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/movies/{movie_id}"))
        .to_request();
    let movie: Value = test::call_and_read_body_json(&app, req).await;
    assert!(movie["rating_average"].is_null());
    assert_eq!(movie["rating_count"], 0);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/movies/{movie_id}/rating"))
        .insert_header(bearer(&first))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/movies/{movie_id}/rating"))
        .insert_header(bearer(&first))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn empty_cart_checkout_is_rejected() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);
    ctx.create_user("empty@example.com", Role::User).await;
    let token = login!(app, "empty@example.com");

    let req = test::TestRequest::post()
        .uri("/api/v1/orders")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Cart is empty.");
}

#[actix_web::test]
async fn movies_in_a_pending_order_cannot_be_checked_out_again() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);
    ctx.create_user("twice@example.com", Role::User).await;
    let movie_id = ctx.create_movie("Pending Movie", Decimal::new(1000, 2)).await;
    let token = login!(app, "twice@example.com");

    let req = test::TestRequest::post()
        .uri("/api/v1/cart/items")
        .insert_header(bearer(&token))
        .set_json(json!({"movie_id": movie_id}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let checkout = || {
        test::TestRequest::post()
            .uri("/api/v1/orders")
            .insert_header(bearer(&token))
            .to_request()
    };
    assert_eq!(test::call_service(&app, checkout()).await.status(), StatusCode::CREATED);

    let resp = test::call_service(&app, checkout()).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Movies already in pending order.");

    let req = test::TestRequest::get()
        .uri("/api/v1/orders")
        .insert_header(bearer(&token))
        .to_request();
    let orders: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(orders.as_array().map(Vec::len), Some(1));
}

#[actix_web::test]
async fn canceling_pending_order_cancels_its_payment() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);
    ctx.create_user("undecided@example.com", Role::User).await;
    let movie_id = ctx.create_movie("Maybe Movie", Decimal::new(899, 2)).await;
    let token = login!(app, "undecided@example.com");

    let req = test::TestRequest::post()
        .uri("/api/v1/cart/items")
        .insert_header(bearer(&token))
        .set_json(json!({"movie_id": movie_id}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/api/v1/orders")
        .insert_header(bearer(&token))
        .to_request();
    let order: Value = test::call_and_read_body_json(&app, req).await;
    let order_id = order["id"].as_i64().expect("order id");

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/payments/orders/{order_id}/intent"))
        .insert_header(bearer(&token))
        .to_request();
    let intent: Value = test::call_and_read_body_json(&app, req).await;
    let intent_id = intent["external_payment_id"].as_str().expect("intent").to_string();

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/orders/{order_id}/cancel"))
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let canceled: Value = test::read_body_json(resp).await;
    assert_eq!(canceled["status"], "canceled");

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/orders/{order_id}/payment-status"))
        .insert_header(bearer(&token))
        .to_request();
    let progress: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(progress["status"], "canceled");

    let req = test::TestRequest::get()
        .uri("/api/v1/payments")
        .insert_header(bearer(&token))
        .to_request();
    let payments: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(payments[0]["order_id"], order_id);
    assert_eq!(payments[0]["status"], "canceled");
    assert_eq!(*ctx.gateway.canceled.lock().unwrap(), vec![intent_id]);

    // The cart still holds the movie, and it is free to check out again
    let req = test::TestRequest::post()
        .uri("/api/v1/orders")
        .insert_header(bearer(&token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
}

#[actix_web::test]
async fn reactions_and_favorites_toggle() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);
    ctx.create_user("fan@example.com", Role::User).await;
    let movie_id = ctx.create_movie("Liked Movie", Decimal::new(450, 2)).await;
    let token = login!(app, "fan@example.com");

    for (action, expected, likes, dislikes) in [
        ("like", json!("like"), 1, 0),
        ("dislike", json!("dislike"), 0, 1),
        ("dislike", Value::Null, 0, 0),
    ] {
        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/movies/{movie_id}/{action}"))
            .insert_header(bearer(&token))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["reaction"], expected, "after {action}");

        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/movies/{movie_id}"))
            .to_request();
        let movie: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(movie["like_count"], likes);
        assert_eq!(movie["dislike_count"], dislikes);
    }

    for (favorited, listed) in [(true, 1), (false, 0)] {
        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/movies/{movie_id}/favorite"))
            .insert_header(bearer(&token))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["favorited"], favorited);

        let req = test::TestRequest::get()
            .uri("/api/v1/movies/favorites")
            .insert_header(bearer(&token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let page: Value = test::read_body_json(resp).await;
        assert_eq!(page["total_items"], listed);
    }

    let remove = || {
        test::TestRequest::delete()
            .uri(&format!("/api/v1/movies/{movie_id}/favorite"))
            .insert_header(bearer(&token))
            .to_request()
    };
    assert_eq!(test::call_service(&app, remove()).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/movies/{movie_id}/favorite"))
        .insert_header(bearer(&token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    assert_eq!(test::call_service(&app, remove()).await.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::post()
        .uri("/api/v1/movies/999999/like")
        .insert_header(bearer(&token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn unaddressable_pages_are_not_found() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);
    ctx.create_user("pager@example.com", Role::Moderator).await;
    let movie_id = ctx.create_movie("Quiet Movie", Decimal::new(300, 2)).await;
    let token = login!(app, "pager@example.com");

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/moderator/users?page={}", i64::MAX))
        .insert_header(bearer(&token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/movies/{movie_id}/comments?page={}", i64::MAX))
        .insert_header(bearer(&token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn intent_for_order_closed_during_provider_call_is_voided() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);
    ctx.create_user("racer@example.com", Role::User).await;
    let movie_id = ctx.create_movie("Raced Movie", Decimal::new(1500, 2)).await;
    let token = login!(app, "racer@example.com");

    let req = test::TestRequest::post()
        .uri("/api/v1/cart/items")
        .insert_header(bearer(&token))
        .set_json(json!({"movie_id": movie_id}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/api/v1/orders")
        .insert_header(bearer(&token))
        .to_request();
    let order: Value = test::call_and_read_body_json(&app, req).await;
    let order_id = order["id"].as_i64().expect("order id");

    *ctx.gateway.close_order_on_intent.lock().unwrap() = Some((ctx.pool.clone(), order_id));

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/payments/orders/{order_id}/intent"))
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(*ctx.gateway.canceled.lock().unwrap(), vec!["pi_test_1".to_string()]);

    let external_id: Option<String> =
        sqlx::query_scalar("SELECT external_payment_id FROM payments WHERE order_id = $1")
            .bind(order_id)
            .fetch_one(&ctx.pool)
            .await
            .unwrap();
    assert!(external_id.is_none());
}
