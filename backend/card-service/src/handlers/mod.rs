pub mod admin;
pub mod auth;
pub mod cards;
pub mod health;
