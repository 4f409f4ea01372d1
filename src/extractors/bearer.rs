use crate::models::{Claims, TokenError};
use crate::services::jwt_service::TokenValidator;
use itertools::Itertools;

/// Parses an `Authorization` value of the form `Bearer <token>` and validates
/// the token. The scheme is matched case-insensitively.
pub fn parse_bearer_jwt_from_auth_header(
    header: &str,
    validator: &TokenValidator,
) -> Result<Claims, TokenError> {
    let token = bearer_token(header)?;
    validator.validate(token)
}

/// Same as [`parse_bearer_jwt_from_auth_header`] with the validate key read
/// from the environment.
pub fn parse_bearer_from_env(header: &str) -> Result<Claims, TokenError> {
    let token = bearer_token(header)?;
    TokenValidator::from_env()?.validate(token)
}

pub fn bearer_token(header: &str) -> Result<&str, TokenError> {
    let (scheme, token) = header
        .split(' ')
        .collect_tuple()
        .ok_or(TokenError::InvalidHeader)?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(TokenError::UnsupportedScheme(scheme.to_owned()));
    }

    if token.is_empty() {
        return Err(TokenError::EmptyToken);
    }

    Ok(token)
}
