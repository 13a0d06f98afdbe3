//! Binds the acting user from a request header to the request task.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::audit::auditor::scope_actor;
use crate::http::server::AppState;

/// Run the rest of the stack with the header's actor as the current auditor.
///
/// Requests without the header fall through to the auditor's default.
pub async fn scope_request_actor(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let actor = request
        .headers()
        .get(&state.actor_header)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned);

    match actor {
        Some(actor) => {
            tracing::trace!(%actor, "Request actor bound");
            scope_actor(actor, next.run(request)).await
        }
        None => next.run(request).await,
    }
}
