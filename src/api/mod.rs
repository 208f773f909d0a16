/// API routes and handlers
pub mod guild;
pub mod health;
pub mod middleware;

use crate::context::AppContext;
use axum::Router;

/// Build API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(guild::routes())
        .merge(health::routes())
}
