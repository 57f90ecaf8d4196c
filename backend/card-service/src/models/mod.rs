pub mod card;
pub mod user;

pub use card::{Card, CardPayload, ImportSummary, MAX_CARDS_PER_USER};
pub use user::{LoginRequest, LoginResponse, PublicUser, RegisterRequest, User};
