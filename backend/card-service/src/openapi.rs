use actix_web::HttpResponse;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Card Service API",
        description = "Personal flashcard manager: accounts, cards, bulk import and admin tools",
        version = "0.1.0",
    ),
    paths(
        crate::handlers::auth::register,
        crate::handlers::auth::login,
        crate::handlers::cards::list,
        crate::handlers::cards::create,
        crate::handlers::cards::update,
        crate::handlers::cards::delete,
        crate::handlers::cards::delete_all,
        crate::handlers::cards::bulk_import,
        crate::handlers::admin::list_users,
        crate::handlers::admin::delete_user,
        crate::handlers::admin::list_user_cards,
        crate::handlers::admin::delete_card,
        crate::handlers::health::health,
        crate::handlers::health::readiness,
    ),
    components(schemas(
        crate::models::RegisterRequest,
        crate::models::LoginRequest,
        crate::models::LoginResponse,
        crate::models::PublicUser,
        crate::models::Card,
        crate::models::CardPayload,
        crate::models::ImportSummary,
        crate::error::ErrorResponse,
    )),
    tags(
        (name = "auth", description = "Registration and login"),
        (name = "cards", description = "Card collection management"),
        (name = "admin", description = "Administrator tools"),
        (name = "health", description = "Service probes"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub async fn serve_openapi() -> HttpResponse {
    HttpResponse::Ok().json(ApiDoc::openapi())
}
