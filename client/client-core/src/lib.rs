//! Headless core of the flashcard client: a pure view-state reducer,
//! a typed API client for the card service, and session/token
//! handling. Rendering and input belong to the embedding shell; this
//! crate is fully testable without either.

pub mod api;
pub mod card;
pub mod session;
pub mod state;

pub use api::{ApiClient, ClientError, DeleteOutcome};
pub use card::{
    export_content, export_json, parse_import, partition_importable, Card, CardContent,
};
pub use session::{MemoryTokenStore, Session, TokenStore};
pub use state::{reduce, Action, Notice, Severity, Side, Step, ViewState};
