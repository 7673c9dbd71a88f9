use crate::state::AppState;
use axum::Router;

pub mod client;
pub mod dto;
pub mod enrich;
pub mod error;
pub mod handlers;
pub mod normalize;
pub mod nutrition;
pub mod prompt;
pub mod services;

pub fn router() -> Router<AppState> {
    handlers::analyze_routes()
}
