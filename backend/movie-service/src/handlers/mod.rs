/// HTTP handlers for the movie store API
///
/// Handlers stay thin: extract, call a service, pick the status code.
/// [`configure`] mounts every route that lives under `/api/v1`.
pub mod accounts;
pub mod admin;
pub mod cart;
pub mod comments;
pub mod health;
pub mod moderator;
pub mod movies;
pub mod orders;
pub mod payments;
pub mod profiles;

use crate::error::AppError;
use actix_web::{error, web, HttpRequest};

/// Malformed JSON bodies are reported like any other validation failure
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req: &HttpRequest| {
        let message = err.to_string();
        error::Error::from(AppError::validation("body", message))
    })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req: &HttpRequest| {
        let message = err.to_string();
        error::Error::from(AppError::validation("query", message))
    })
}

pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|_err, _req: &HttpRequest| {
        error::Error::from(AppError::NotFound("Not found.".to_string()))
    })
}

/// Routes relative to the `/api/v1` scope
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/accounts")
            .route("/register", web::post().to(accounts::register))
            .service(
                web::resource("/activate")
                    .route(web::post().to(accounts::activate))
                    .route(web::get().to(accounts::activate_link)),
            )
            .route("/activation/resend", web::post().to(accounts::resend_activation))
            .route("/login", web::post().to(accounts::login))
            .route("/refresh", web::post().to(accounts::refresh))
            .route("/logout", web::post().to(accounts::logout))
            .route("/password/change", web::post().to(accounts::change_password))
            .route(
                "/password-reset/request",
                web::post().to(accounts::request_password_reset),
            )
            .route(
                "/password-reset/complete",
                web::post().to(accounts::complete_password_reset),
            ),
    )
    .service(
        web::resource("/profiles/users/{user_id}/profile")
            .route(web::post().to(profiles::create_profile))
            .route(web::get().to(profiles::get_profile)),
    )
    .service(
        web::scope("/movies")
            .route("", web::get().to(movies::list_movies))
            .route("/favorites", web::get().to(movies::list_favorites))
            .route("/{movie_id}", web::get().to(movies::get_movie))
            .service(
                web::resource("/{movie_id}/rating")
                    .route(web::post().to(movies::rate_movie))
                    .route(web::get().to(movies::get_rating))
                    .route(web::delete().to(movies::delete_rating)),
            )
            .route("/{movie_id}/like", web::post().to(movies::like_movie))
            .route("/{movie_id}/dislike", web::post().to(movies::dislike_movie))
            .service(
                web::resource("/{movie_id}/favorite")
                    .route(web::post().to(movies::toggle_favorite))
                    .route(web::delete().to(movies::remove_favorite)),
            )
            .service(
                web::resource("/{movie_id}/comments")
                    .route(web::post().to(comments::create_comment))
                    .route(web::get().to(comments::list_comments)),
            )
            .service(
                web::resource("/{movie_id}/comments/{comment_id}")
                    .route(web::get().to(comments::get_comment))
                    .route(web::patch().to(comments::update_comment))
                    .route(web::delete().to(comments::delete_comment)),
            ),
    )
    .service(
        web::scope("/genres")
            .route("", web::get().to(movies::list_genres))
            .route("/{genre_id}/movies", web::get().to(movies::genre_movies)),
    )
    .service(
        web::resource("/comments/{comment_id}/like")
            .route(web::post().to(comments::like_comment))
            .route(web::delete().to(comments::unlike_comment)),
    )
    .service(
        web::scope("/notifications")
            .route("", web::get().to(comments::list_notifications))
            .route(
                "/{notification_id}/read",
                web::post().to(comments::mark_notification_read),
            ),
    )
    .service(
        web::scope("/cart")
            .service(
                web::resource("")
                    .route(web::get().to(cart::get_cart))
                    .route(web::delete().to(cart::clear_cart)),
            )
            .route("/items", web::post().to(cart::add_item))
            .route("/items/{movie_id}", web::delete().to(cart::remove_item)),
    )
    .service(
        web::scope("/orders")
            .service(
                web::resource("")
                    .route(web::post().to(orders::checkout))
                    .route(web::get().to(orders::list_orders)),
            )
            .route("/{order_id}", web::get().to(orders::get_order))
            .route("/{order_id}/cancel", web::post().to(orders::cancel_order))
            .route(
                "/{order_id}/payment-status",
                web::get().to(orders::payment_status),
            ),
    )
    .service(
        web::scope("/payments")
            .route("", web::get().to(payments::list_payments))
            .route("/webhook", web::post().to(payments::webhook))
            .route(
                "/orders/{order_id}/intent",
                web::post().to(payments::create_intent),
            )
            .route("/{payment_id}", web::get().to(payments::get_payment))
            .route("/{payment_id}/cancel", web::post().to(payments::cancel_payment)),
    )
    .service(
        web::scope("/moderator")
            .route("/users", web::get().to(moderator::list_users))
            .route("/users/{user_id}", web::get().to(moderator::get_user))
            .route("/movies", web::post().to(moderator::create_movie))
            .service(
                web::resource("/movies/{movie_id}")
                    .route(web::patch().to(moderator::update_movie))
                    .route(web::delete().to(moderator::delete_movie)),
            ),
    )
    .service(
        web::scope("/admin")
            .route("/users/{user_id}/group", web::patch().to(admin::change_group))
            .route(
                "/users/{user_id}/activation",
                web::patch().to(admin::set_activation),
            )
            .route("/users/{user_id}/cart", web::get().to(admin::user_cart))
            .route(
                "/movies/recount-counters",
                web::post().to(admin::recount_counters),
            )
            .route("/carts", web::get().to(admin::list_carts))
            .route("/orders", web::get().to(admin::list_orders))
            .route("/payments", web::get().to(admin::list_payments))
            .route(
                "/payments/{payment_id}/refund",
                web::post().to(admin::refund_payment),
            ),
    );
}
