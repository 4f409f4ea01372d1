// validate the bearer token and hand its claims to the inner service
use crate::extractors::{error_response, parse_bearer_jwt_from_auth_header};
use crate::models::TokenError;
use crate::services::jwt_service::TokenValidator;
use axum::body::Body;
use axum::{
    http::{header::AUTHORIZATION, Request, StatusCode},
    response::Response,
};
use futures_util::future::BoxFuture;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

#[derive(Clone)]
pub struct AuthenticationLayer {
    validator: Arc<TokenValidator>,
}

impl AuthenticationLayer {
    pub fn new(validator: Arc<TokenValidator>) -> Self {
        AuthenticationLayer { validator }
    }
}

impl<S> Layer<S> for AuthenticationLayer {
    type Service = AuthenticationService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthenticationService {
            inner,
            validator: self.validator.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AuthenticationService<S> {
    inner: S,
    validator: Arc<TokenValidator>,
}

impl<S> Service<Request<Body>> for AuthenticationService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        // the clone that was polled ready is the one that has to serve the call
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let validator = self.validator.clone();
        let (mut parts, body) = request.into_parts();
        Box::pin(async move {
            let claims = parts
                .headers
                .get(AUTHORIZATION)
                .ok_or(TokenError::InvalidHeader)
                .and_then(|value| value.to_str().map_err(|_| TokenError::InvalidHeader))
                .and_then(|header| parse_bearer_jwt_from_auth_header(header, &validator));

            match claims {
                Ok(claims) => {
                    parts.extensions.insert(claims);
                }
                Err(err) => {
                    tracing::warn!(path = %parts.uri.path(), "rejected bearer token: {}", err);
                    return Ok(error_response(
                        StatusCode::UNAUTHORIZED,
                        "UNAUTHORIZED",
                        &err.to_string(),
                    ));
                }
            }

            let request = Request::from_parts(parts, body);
            inner.call(request).await
        })
    }
}
