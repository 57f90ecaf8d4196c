use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{self, cards::BulkInsertOutcome};
use crate::error::{AppError, ErrorResponse};
use crate::metrics;
use crate::middleware::AuthenticatedUser;
use crate::models::{Card, CardPayload, ImportSummary, MAX_CARDS_PER_USER};
use crate::sanitize::clean_card_text;

/// Sanitizes a card payload and rejects it when either side ends up
/// empty. Input that is nothing but markup counts as empty.
fn clean_payload(payload: CardPayload) -> Result<CardPayload, AppError> {
    let question = clean_card_text(&payload.question);
    let answer = clean_card_text(&payload.answer);
    if question.is_empty() || answer.is_empty() {
        return Err(AppError::Validation(
            "question and answer are required".to_string(),
        ));
    }
    Ok(CardPayload { question, answer })
}

/// List the caller's cards, oldest first
#[utoipa::path(
    get,
    path = "/cards",
    tag = "cards",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The caller's cards", body = [Card]),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    )
)]
pub async fn list(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let cards = db::cards::list_by_owner(&pool, user.id).await?;
    Ok(HttpResponse::Ok().json(cards))
}

/// Create a card
#[utoipa::path(
    post,
    path = "/cards",
    tag = "cards",
    security(("bearer_auth" = [])),
    request_body = CardPayload,
    responses(
        (status = 201, description = "Card created", body = Card),
        (status = 400, description = "Empty question or answer", body = ErrorResponse),
        (status = 403, description = "Card limit reached", body = ErrorResponse)
    )
)]
pub async fn create(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    payload: web::Json<CardPayload>,
) -> Result<HttpResponse, AppError> {
    let payload = clean_payload(payload.into_inner())?;

    let current = db::cards::count_by_owner(&pool, user.id).await?;
    if current >= MAX_CARDS_PER_USER {
        return Err(AppError::CardLimitExceeded {
            limit: MAX_CARDS_PER_USER,
        });
    }

    let card = db::cards::insert(&pool, user.id, &payload.question, &payload.answer).await?;
    Ok(HttpResponse::Created().json(card))
}

/// Update one of the caller's cards
#[utoipa::path(
    put,
    path = "/cards/{id}",
    tag = "cards",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Card id")),
    request_body = CardPayload,
    responses(
        (status = 200, description = "Updated card", body = Card),
        (status = 400, description = "Empty question or answer", body = ErrorResponse),
        (status = 404, description = "No such card in the caller's collection", body = ErrorResponse)
    )
)]
pub async fn update(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    payload: web::Json<CardPayload>,
) -> Result<HttpResponse, AppError> {
    let card_id = path.into_inner();
    let payload = clean_payload(payload.into_inner())?;

    match db::cards::update_owned(&pool, card_id, user.id, &payload.question, &payload.answer)
        .await?
    {
        Some(card) => Ok(HttpResponse::Ok().json(card)),
        None => Err(AppError::NotFound("card not found".to_string())),
    }
}

/// Delete one of the caller's cards
#[utoipa::path(
    delete,
    path = "/cards/{id}",
    tag = "cards",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Card id")),
    responses(
        (status = 204, description = "Card deleted"),
        (status = 404, description = "No such card in the caller's collection", body = ErrorResponse)
    )
)]
pub async fn delete(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let removed = db::cards::delete_owned(&pool, path.into_inner(), user.id).await?;
    if removed == 0 {
        return Err(AppError::NotFound("card not found".to_string()));
    }
    Ok(HttpResponse::NoContent().finish())
}

/// Delete every card the caller owns
#[utoipa::path(
    delete,
    path = "/cards/all",
    tag = "cards",
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Collection cleared, even if it was already empty")
    )
)]
pub async fn delete_all(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let removed = db::cards::delete_all_for_owner(&pool, user.id).await?;
    tracing::debug!(user_id = %user.id, removed, "cleared card collection");
    Ok(HttpResponse::NoContent().finish())
}

/// Import a batch of cards atomically
#[utoipa::path(
    post,
    path = "/cards/bulk",
    tag = "cards",
    security(("bearer_auth" = [])),
    request_body = Vec<CardPayload>,
    responses(
        (status = 201, description = "Batch imported", body = ImportSummary),
        (status = 400, description = "Empty batch or an invalid entry; nothing imported", body = ErrorResponse),
        (status = 403, description = "Batch would exceed the card limit; nothing imported", body = ErrorResponse),
        (status = 429, description = "Too many imports", body = ErrorResponse)
    )
)]
pub async fn bulk_import(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    payload: web::Json<Vec<CardPayload>>,
) -> Result<HttpResponse, AppError> {
    let entries = payload.into_inner();
    if entries.is_empty() {
        return Err(AppError::Validation(
            "request body must be a non-empty array of cards".to_string(),
        ));
    }

    // One invalid entry rejects the whole batch.
    let mut cleaned = Vec::with_capacity(entries.len());
    for entry in entries {
        let card = clean_payload(entry).map_err(|_| {
            AppError::Validation("each card must have a non-empty question and answer".to_string())
        })?;
        cleaned.push(card);
    }

    match db::cards::bulk_insert(&pool, user.id, &cleaned).await? {
        BulkInsertOutcome::Imported(count) => {
            metrics::CARDS_IMPORTED_TOTAL.inc_by(count);
            tracing::info!(user_id = %user.id, count, "bulk import committed");
            Ok(HttpResponse::Created().json(ImportSummary {
                imported_count: count,
            }))
        }
        BulkInsertOutcome::LimitExceeded { current } => {
            tracing::warn!(
                user_id = %user.id,
                current,
                attempted = cleaned.len(),
                "bulk import would exceed card limit"
            );
            Err(AppError::CardLimitExceeded {
                limit: MAX_CARDS_PER_USER,
            })
        }
    }
}
