use crate::models::ErrorResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

pub mod authenticated;
pub mod bearer;

pub use self::{
    authenticated::Authenticated,
    bearer::{parse_bearer_from_env, parse_bearer_jwt_from_auth_header},
};

pub fn error_response(status_code: StatusCode, code: &str, message: &str) -> Response {
    (
        status_code,
        Json(ErrorResponse {
            code: code.to_owned(),
            message: message.to_owned(),
        }),
    )
        .into_response()
}
