use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db;
use crate::error::{AppError, ErrorResponse};
use crate::middleware::AuthenticatedUser;
use crate::models::{Card, PublicUser};

/// List every account
#[utoipa::path(
    get,
    path = "/admin/users",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All accounts, without credential material", body = [PublicUser]),
        (status = 403, description = "Caller is not an administrator", body = ErrorResponse)
    )
)]
pub async fn list_users(pool: web::Data<PgPool>) -> Result<HttpResponse, AppError> {
    let users = db::users::list_users(&pool).await?;
    let public: Vec<PublicUser> = users.into_iter().map(PublicUser::from).collect();
    Ok(HttpResponse::Ok().json(public))
}

/// Delete an account and everything it owns
#[utoipa::path(
    delete,
    path = "/admin/users/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 204, description = "Account and its cards deleted"),
        (status = 400, description = "Malformed user id", body = ErrorResponse),
        (status = 403, description = "Administrators cannot delete themselves", body = ErrorResponse),
        (status = 404, description = "No such user", body = ErrorResponse)
    )
)]
pub async fn delete_user(
    pool: web::Data<PgPool>,
    admin: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let target = path.into_inner();

    if target == admin.id {
        return Err(AppError::Forbidden(
            "administrators cannot delete their own account".to_string(),
        ));
    }

    let removed = db::users::delete_user(&pool, target).await?;
    if removed == 0 {
        return Err(AppError::NotFound("user not found".to_string()));
    }

    tracing::info!(admin_id = %admin.id, user_id = %target, "account deleted by administrator");
    Ok(HttpResponse::NoContent().finish())
}

/// Inspect any user's cards
#[utoipa::path(
    get,
    path = "/admin/users/{id}/cards",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "The user's cards; empty for an unknown user", body = [Card]),
        (status = 403, description = "Caller is not an administrator", body = ErrorResponse)
    )
)]
pub async fn list_user_cards(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let cards = db::cards::list_by_owner(&pool, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(cards))
}

/// Delete any card, regardless of owner
#[utoipa::path(
    delete,
    path = "/admin/cards/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Card id")),
    responses(
        (status = 204, description = "Card deleted"),
        (status = 404, description = "No such card", body = ErrorResponse)
    )
)]
pub async fn delete_card(
    pool: web::Data<PgPool>,
    admin: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let card_id = path.into_inner();
    let removed = db::cards::delete_by_id(&pool, card_id).await?;
    if removed == 0 {
        return Err(AppError::NotFound("card not found".to_string()));
    }

    tracing::info!(admin_id = %admin.id, card_id = %card_id, "card deleted by administrator");
    Ok(HttpResponse::NoContent().finish())
}
