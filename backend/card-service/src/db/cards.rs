use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Card, CardPayload, MAX_CARDS_PER_USER};

/// Result of a bulk insert attempt. The caller decides how to surface
/// a limit rejection; nothing is persisted in that case.
pub enum BulkInsertOutcome {
    Imported(u64),
    LimitExceeded { current: i64 },
}

pub async fn list_by_owner(pool: &PgPool, owner_id: Uuid) -> Result<Vec<Card>, sqlx::Error> {
    sqlx::query_as::<_, Card>(
        r#"
        SELECT id, question, answer, owner_id, created_at
        FROM cards
        WHERE owner_id = $1
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(owner_id)
    .fetch_all(pool)
    .await
}

pub async fn count_by_owner(pool: &PgPool, owner_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM cards WHERE owner_id = $1")
        .bind(owner_id)
        .fetch_one(pool)
        .await
}

pub async fn insert(
    pool: &PgPool,
    owner_id: Uuid,
    question: &str,
    answer: &str,
) -> Result<Card, sqlx::Error> {
    sqlx::query_as::<_, Card>(
        r#"
        INSERT INTO cards (question, answer, owner_id)
        VALUES ($1, $2, $3)
        RETURNING id, question, answer, owner_id, created_at
        "#,
    )
    .bind(question)
    .bind(answer)
    .bind(owner_id)
    .fetch_one(pool)
    .await
}

/// Updates a card only if it belongs to `owner_id`. Returns `None`
/// when the card is absent or owned by someone else; the API treats
/// both the same way.
pub async fn update_owned(
    pool: &PgPool,
    card_id: Uuid,
    owner_id: Uuid,
    question: &str,
    answer: &str,
) -> Result<Option<Card>, sqlx::Error> {
    sqlx::query_as::<_, Card>(
        r#"
        UPDATE cards
        SET question = $1, answer = $2
        WHERE id = $3 AND owner_id = $4
        RETURNING id, question, answer, owner_id, created_at
        "#,
    )
    .bind(question)
    .bind(answer)
    .bind(card_id)
    .bind(owner_id)
    .fetch_optional(pool)
    .await
}

pub async fn delete_owned(pool: &PgPool, card_id: Uuid, owner_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cards WHERE id = $1 AND owner_id = $2")
        .bind(card_id)
        .bind(owner_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete_all_for_owner(pool: &PgPool, owner_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cards WHERE owner_id = $1")
        .bind(owner_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Unscoped delete for administrators.
pub async fn delete_by_id(pool: &PgPool, card_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cards WHERE id = $1")
        .bind(card_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Inserts a batch of cards atomically. The owner row is locked for
/// the duration of the transaction so two concurrent imports cannot
/// both pass the count check and push the account past the ceiling.
pub async fn bulk_insert(
    pool: &PgPool,
    owner_id: Uuid,
    cards: &[CardPayload],
) -> Result<BulkInsertOutcome, sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
        .bind(owner_id)
        .fetch_one(&mut *tx)
        .await?;

    let current = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM cards WHERE owner_id = $1")
        .bind(owner_id)
        .fetch_one(&mut *tx)
        .await?;

    if current + cards.len() as i64 > MAX_CARDS_PER_USER {
        tx.rollback().await?;
        return Ok(BulkInsertOutcome::LimitExceeded { current });
    }

    for card in cards {
        sqlx::query("INSERT INTO cards (question, answer, owner_id) VALUES ($1, $2, $3)")
            .bind(&card.question)
            .bind(&card.answer)
            .bind(owner_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(BulkInsertOutcome::Imported(cards.len() as u64))
}
