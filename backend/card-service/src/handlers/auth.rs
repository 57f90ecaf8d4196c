use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use validator::Validate;

use crate::db;
use crate::error::{AppError, ErrorResponse};
use crate::metrics;
use crate::models::{LoginRequest, LoginResponse, RegisterRequest};
use crate::security::{hash_password, verify_password, TokenKeys};

/// Register a new account
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created"),
        (status = 400, description = "Invalid username or password", body = ErrorResponse),
        (status = 409, description = "Username already taken", body = ErrorResponse),
        (status = 429, description = "Too many attempts", body = ErrorResponse)
    )
)]
pub async fn register(
    pool: web::Data<PgPool>,
    payload: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let mut request = payload.into_inner();
    request.username = request.username.trim().to_string();
    request.validate()?;

    if db::users::username_exists(&pool, &request.username).await? {
        return Err(AppError::Conflict("username is already taken".to_string()));
    }

    let password_hash = hash_password(&request.password)?;
    let user = db::users::create_user(&pool, &request.username, &password_hash).await?;

    metrics::REGISTRATIONS_TOTAL.inc();
    tracing::info!(user_id = %user.id, "account registered");

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "registration successful"
    })))
}

/// Exchange credentials for a bearer token
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 400, description = "Missing username or password", body = ErrorResponse),
        (status = 401, description = "Unknown user or wrong password", body = ErrorResponse),
        (status = 429, description = "Too many attempts", body = ErrorResponse)
    )
)]
pub async fn login(
    pool: web::Data<PgPool>,
    keys: web::Data<TokenKeys>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let request = payload.into_inner();
    let username = request.username.trim();

    if username.is_empty() || request.password.is_empty() {
        return Err(AppError::Validation(
            "username and password are required".to_string(),
        ));
    }

    // Unknown usernames and wrong passwords produce the same error so
    // responses cannot be used to enumerate accounts.
    let user = match db::users::find_by_username(&pool, username).await? {
        Some(user) => user,
        None => {
            metrics::LOGIN_ATTEMPTS.with_label_values(&["failure"]).inc();
            return Err(AppError::InvalidCredentials);
        }
    };

    if !verify_password(&request.password, &user.password_hash) {
        metrics::LOGIN_ATTEMPTS.with_label_values(&["failure"]).inc();
        return Err(AppError::InvalidCredentials);
    }

    let token = keys.issue(user.id, user.is_admin)?;
    metrics::LOGIN_ATTEMPTS.with_label_values(&["success"]).inc();
    tracing::info!(user_id = %user.id, "login succeeded");

    Ok(HttpResponse::Ok().json(LoginResponse { token }))
}
