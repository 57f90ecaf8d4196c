use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A card as the server returns it. Extra response fields such as the
/// owner id and timestamps are ignored; the client never needs them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Card {
    pub id: Uuid,
    pub question: String,
    pub answer: String,
}

/// The question/answer pair sent on create, update and bulk import,
/// and produced by export. Missing fields deserialize as empty strings
/// so a sloppy import file can be filtered instead of rejected whole.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardContent {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

impl CardContent {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Splits raw import entries into the ones worth sending and a count
/// of the ones dropped for having an empty question or answer. Kept
/// entries are trimmed; the server validates again on its side.
pub fn partition_importable<I>(entries: I) -> (Vec<CardContent>, usize)
where
    I: IntoIterator<Item = CardContent>,
{
    let mut importable = Vec::new();
    let mut skipped = 0;
    for entry in entries {
        let question = entry.question.trim();
        let answer = entry.answer.trim();
        if question.is_empty() || answer.is_empty() {
            skipped += 1;
        } else {
            importable.push(CardContent::new(question, answer));
        }
    }
    (importable, skipped)
}

/// Strips ids from a card list, leaving the pairs a later import
/// accepts.
pub fn export_content(cards: &[Card]) -> Vec<CardContent> {
    cards
        .iter()
        .map(|card| CardContent::new(card.question.clone(), card.answer.clone()))
        .collect()
}

/// Renders a card list as the JSON document the import side reads.
pub fn export_json(cards: &[Card]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&export_content(cards))
}

/// Parses an exported (or hand-written) JSON document back into import
/// entries. Entries with missing fields come back empty and fall to
/// [`partition_importable`].
pub fn parse_import(json: &str) -> serde_json::Result<Vec<CardContent>> {
    serde_json::from_str(json)
}
