use crate::extractors::error_response;
use crate::models::Claims;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::Response,
};

/// Claims of the bearer token accepted by
/// [`AuthenticationLayer`](crate::layers::AuthenticationLayer).
#[derive(Debug, Clone)]
pub struct Authenticated(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(Authenticated)
            .ok_or_else(|| {
                tracing::warn!("no validated claims on request");
                error_response(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "token missing")
            })
    }
}
