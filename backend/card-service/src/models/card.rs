use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Hard ceiling on cards per account.
pub const MAX_CARDS_PER_USER: i64 = 500;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Card {
    pub id: Uuid,
    pub question: String,
    pub answer: String,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Request body for creating or updating a card. Bulk import takes a
/// plain JSON array of these.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CardPayload {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ImportSummary {
    #[serde(rename = "importedCount")]
    pub imported_count: u64,
}
