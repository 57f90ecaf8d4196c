use rand::seq::SliceRandom;
use rand::Rng;
use uuid::Uuid;

use crate::card::Card;

/// Which face of a card shows before flipping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Side {
    #[default]
    Question,
    Answer,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Question => Side::Answer,
            Side::Answer => Side::Question,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

/// A transient status message for the shell to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub severity: Severity,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Info,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Success,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Error,
        }
    }
}

/// Everything the shell dispatches into the reducer. Mutating variants
/// carry the server's result; the reducer never talks to the network
/// itself.
#[derive(Debug, Clone)]
pub enum Action {
    /// Server truth arrived: the initial fetch or a post-import refresh.
    CardsLoaded(Vec<Card>),
    SearchChanged(String),
    Next,
    Previous,
    Random,
    Shuffle,
    Flip,
    SetRevealSide(Side),
    CardAdded(Card),
    CardUpdated(Card),
    CardRemoved(Uuid),
    CardsRemoved(Vec<Uuid>),
    AllCardsRemoved,
    SessionEnded,
}

/// The whole client view in one value.
///
/// `derived` holds indices into `cards` matching the active search
/// term, in presentation order; `cursor` is a position within
/// `derived`. The invariant throughout: `cursor` is `None` exactly
/// when `derived` is empty, and otherwise in bounds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub cards: Vec<Card>,
    pub search_term: String,
    pub derived: Vec<usize>,
    pub cursor: Option<usize>,
    pub reveal_side: Side,
    pub flipped: bool,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The card the cursor points at, if any.
    pub fn active_card(&self) -> Option<&Card> {
        let pos = self.cursor?;
        let idx = *self.derived.get(pos)?;
        self.cards.get(idx)
    }

    /// Cards currently in view, in presentation order.
    pub fn visible_cards(&self) -> impl Iterator<Item = &Card> {
        self.derived.iter().filter_map(|&idx| self.cards.get(idx))
    }

    /// The side of the active card currently facing the user.
    pub fn displayed_side(&self) -> Side {
        if self.flipped {
            self.reveal_side.opposite()
        } else {
            self.reveal_side
        }
    }

    /// Text the shell should render for the active card.
    pub fn displayed_text(&self) -> Option<&str> {
        let card = self.active_card()?;
        Some(match self.displayed_side() {
            Side::Question => card.question.as_str(),
            Side::Answer => card.answer.as_str(),
        })
    }

    fn active_id(&self) -> Option<Uuid> {
        self.active_card().map(|card| card.id)
    }

    /// Recomputes `derived` and re-anchors the cursor on the card that
    /// was showing, falling back to the first match.
    fn rederive_following(&mut self, previous: Option<Uuid>) {
        self.derived = derive_matches(&self.cards, &self.search_term);
        self.cursor = previous
            .and_then(|id| position_of(&self.cards, &self.derived, id))
            .or(if self.derived.is_empty() { None } else { Some(0) });
    }

    /// Recomputes `derived` and re-anchors the cursor on the card that
    /// was showing; when it is gone the old position is kept, clamped
    /// into bounds, so a delete lands on the neighbouring card.
    fn rederive_clamping(&mut self, previous: Option<Uuid>, old_pos: Option<usize>) {
        self.derived = derive_matches(&self.cards, &self.search_term);
        self.cursor = previous
            .and_then(|id| position_of(&self.cards, &self.derived, id))
            .or_else(|| {
                if self.derived.is_empty() {
                    None
                } else {
                    Some(old_pos.unwrap_or(0).min(self.derived.len() - 1))
                }
            });
    }
}

fn derive_matches(cards: &[Card], term: &str) -> Vec<usize> {
    let needle = term.trim().to_lowercase();
    cards
        .iter()
        .enumerate()
        .filter(|(_, card)| {
            needle.is_empty()
                || card.question.to_lowercase().contains(&needle)
                || card.answer.to_lowercase().contains(&needle)
        })
        .map(|(idx, _)| idx)
        .collect()
}

fn position_of(cards: &[Card], derived: &[usize], id: Uuid) -> Option<usize> {
    derived.iter().position(|&idx| cards[idx].id == id)
}

/// One reducer step: the next state plus an optional message.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub state: ViewState,
    pub notice: Option<Notice>,
}

impl Step {
    fn quiet(state: ViewState) -> Self {
        Self {
            state,
            notice: None,
        }
    }

    fn with_notice(state: ViewState, notice: Notice) -> Self {
        Self {
            state,
            notice: Some(notice),
        }
    }
}

/// Advances the view by one action. Pure apart from the injected
/// randomness; the shell owns all API calls and dispatches their
/// results in here.
pub fn reduce<R: Rng + ?Sized>(mut state: ViewState, action: Action, rng: &mut R) -> Step {
    match action {
        Action::CardsLoaded(cards) => {
            let previous = state.active_id();
            state.cards = cards;
            state.rederive_following(previous);
            state.flipped = false;
            Step::quiet(state)
        }
        Action::SearchChanged(term) => {
            let previous = state.active_id();
            state.search_term = term;
            state.rederive_following(previous);
            state.flipped = false;
            Step::quiet(state)
        }
        Action::Next => {
            if let Some(pos) = state.cursor {
                if pos + 1 < state.derived.len() {
                    state.cursor = Some(pos + 1);
                    state.flipped = false;
                }
            }
            Step::quiet(state)
        }
        Action::Previous => {
            if let Some(pos) = state.cursor {
                if pos > 0 {
                    state.cursor = Some(pos - 1);
                    state.flipped = false;
                }
            }
            Step::quiet(state)
        }
        Action::Random => {
            if state.derived.len() < 2 {
                return Step::with_notice(
                    state,
                    Notice::info("need at least two cards in view to jump randomly"),
                );
            }
            let current = state.cursor.unwrap_or(0);
            // Uniform over every position except the current one.
            let mut target = rng.gen_range(0..state.derived.len() - 1);
            if target >= current {
                target += 1;
            }
            state.cursor = Some(target);
            state.flipped = false;
            Step::quiet(state)
        }
        Action::Shuffle => {
            state.derived.shuffle(rng);
            state.cursor = if state.derived.is_empty() {
                None
            } else {
                Some(0)
            };
            state.flipped = false;
            Step::quiet(state)
        }
        Action::Flip => {
            if state.cursor.is_some() {
                state.flipped = !state.flipped;
            }
            Step::quiet(state)
        }
        Action::SetRevealSide(side) => {
            state.reveal_side = side;
            state.flipped = false;
            Step::quiet(state)
        }
        Action::CardAdded(card) => {
            let added = card.id;
            let previous = state.active_id();
            state.cards.push(card);
            state.derived = derive_matches(&state.cards, &state.search_term);
            state.cursor = match position_of(&state.cards, &state.derived, added) {
                // Navigate to the new card when it is in view.
                Some(pos) => Some(pos),
                // Filtered out; stay on whatever was showing.
                None => previous
                    .and_then(|id| position_of(&state.cards, &state.derived, id))
                    .or(if state.derived.is_empty() { None } else { Some(0) }),
            };
            state.flipped = false;
            Step::with_notice(state, Notice::success("card added"))
        }
        Action::CardUpdated(card) => {
            let previous = state.active_id();
            let updated = card.id;
            match state.cards.iter().position(|existing| existing.id == updated) {
                Some(idx) => state.cards[idx] = card,
                // Unknown id; the next full fetch reconciles the mirror.
                None => return Step::quiet(state),
            }
            state.rederive_following(previous);
            state.flipped = false;
            Step::with_notice(state, Notice::success("card updated"))
        }
        Action::CardRemoved(id) => {
            let previous = state.active_id().filter(|&active| active != id);
            let old_pos = state.cursor;
            let before = state.cards.len();
            state.cards.retain(|card| card.id != id);
            if state.cards.len() == before {
                return Step::quiet(state);
            }
            state.rederive_clamping(previous, old_pos);
            state.flipped = false;
            Step::with_notice(state, Notice::success("card deleted"))
        }
        Action::CardsRemoved(ids) => {
            let previous = state.active_id().filter(|active| !ids.contains(active));
            let old_pos = state.cursor;
            let before = state.cards.len();
            state.cards.retain(|card| !ids.contains(&card.id));
            let removed = before - state.cards.len();
            if removed == 0 {
                return Step::quiet(state);
            }
            state.rederive_clamping(previous, old_pos);
            state.flipped = false;
            let message = if removed == 1 {
                "1 card deleted".to_string()
            } else {
                format!("{removed} cards deleted")
            };
            Step::with_notice(state, Notice::success(message))
        }
        Action::AllCardsRemoved => {
            state.cards.clear();
            state.derived.clear();
            state.cursor = None;
            state.flipped = false;
            Step::with_notice(state, Notice::success("all cards deleted"))
        }
        Action::SessionEnded => Step::quiet(ViewState::default()),
    }
}
