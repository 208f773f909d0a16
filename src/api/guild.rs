/// Guild lookup endpoint
///
/// `POST /guild` verifies a signed message and returns the named communities
/// with the signer's role access.
use crate::{
    aggregate::{ResultItem, SignedRequest},
    context::AppContext,
    error::GuildResult,
};
use axum::{extract::State, routing::post, Json, Router};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct GuildLookupResponse {
    pub items: Vec<ResultItem>,
}

/// Build guild routes
pub fn routes() -> Router<AppContext> {
    Router::new().route("/guild", post(lookup))
}

async fn lookup(
    State(ctx): State<AppContext>,
    Json(req): Json<SignedRequest>,
) -> GuildResult<Json<GuildLookupResponse>> {
    let items = ctx.aggregator.handle(&req).await?;
    Ok(Json(GuildLookupResponse { items }))
}
