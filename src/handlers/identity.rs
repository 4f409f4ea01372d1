use crate::extractors::Authenticated;
use crate::models::Claims;
use axum::Json;

/// Echoes the claims of the caller's bearer token.
pub async fn whoami(Authenticated(claims): Authenticated) -> Json<Claims> {
    Json(claims)
}
