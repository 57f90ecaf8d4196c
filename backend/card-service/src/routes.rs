use std::sync::Arc;

use actix_web::web;
use sqlx::PgPool;

use crate::error::AppError;
use crate::handlers;
use crate::metrics;
use crate::middleware::{JwtAuth, RateLimit, RateLimiters, RequireAdmin};
use crate::openapi;
use crate::security::TokenKeys;

/// Wires every route, guard and shared piece of state. Tests call this
/// with their own pool, keys and limiters to get the exact production
/// surface.
pub fn configure(
    cfg: &mut web::ServiceConfig,
    pool: PgPool,
    keys: Arc<TokenKeys>,
    limiters: RateLimiters,
) {
    cfg.app_data(web::Data::new(pool))
        .app_data(web::Data::from(keys.clone()))
        // Malformed path ids and bodies produce the same error shape as
        // every other failure.
        .app_data(web::PathConfig::default().error_handler(|err, _req| {
            AppError::Validation(format!("invalid identifier: {err}")).into()
        }))
        .app_data(web::JsonConfig::default().error_handler(|err, _req| {
            AppError::Validation(format!("invalid request body: {err}")).into()
        }))
        .route("/health", web::get().to(handlers::health::health))
        .route("/health/ready", web::get().to(handlers::health::readiness))
        .route("/metrics", web::get().to(metrics::serve_metrics))
        .route(
            "/api-docs/openapi.json",
            web::get().to(openapi::serve_openapi),
        )
        .service(
            web::scope("/auth")
                .service(
                    web::resource("/register")
                        .wrap(RateLimit::new("register", limiters.register.clone()))
                        .route(web::post().to(handlers::auth::register)),
                )
                .service(
                    web::resource("/login")
                        .wrap(RateLimit::new("login", limiters.login.clone()))
                        .route(web::post().to(handlers::auth::login)),
                ),
        )
        .service(
            web::scope("/cards")
                .wrap(JwtAuth::new(keys.clone()))
                // Fixed segments must be registered ahead of the id
                // pattern or they would be swallowed by it.
                .service(
                    web::resource("/bulk")
                        .wrap(RateLimit::new("bulk_import", limiters.bulk_import.clone()))
                        .route(web::post().to(handlers::cards::bulk_import)),
                )
                .route("/all", web::delete().to(handlers::cards::delete_all))
                .service(
                    web::resource("")
                        .route(web::get().to(handlers::cards::list))
                        .route(web::post().to(handlers::cards::create)),
                )
                .service(
                    web::resource("/{id}")
                        .route(web::put().to(handlers::cards::update))
                        .route(web::delete().to(handlers::cards::delete)),
                ),
        )
        .service(
            web::scope("/admin")
                .wrap(RequireAdmin)
                .wrap(JwtAuth::new(keys))
                .route("/users", web::get().to(handlers::admin::list_users))
                .route(
                    "/users/{id}",
                    web::delete().to(handlers::admin::delete_user),
                )
                .route(
                    "/users/{id}/cards",
                    web::get().to(handlers::admin::list_user_cards),
                )
                .route(
                    "/cards/{id}",
                    web::delete().to(handlers::admin::delete_card),
                ),
        );
}
