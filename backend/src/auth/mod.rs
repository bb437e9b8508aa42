use axum::{
    Json, async_trait,
    extract::FromRequestParts,
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{axum_http::error_responses::ErrorResponse, config::config_loader};

#[derive(Debug, Serialize, Deserialize)]
pub struct SupabaseClaims {
    pub sub: String,
    pub role: String,
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    pub exp: usize,
}

/// The partner behind a request, taken from the Supabase access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub role: String,
}

#[derive(Debug)]
pub struct AuthError(String);

impl AuthError {
    fn new(message: impl Into<String>) -> Self {
        AuthError(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = StatusCode::UNAUTHORIZED;
        (
            status,
            Json(ErrorResponse {
                code: status.as_u16(),
                message: format!("Unauthorized: {}", self.0),
                errors: None,
            }),
        )
            .into_response()
    }
}

pub fn validate_supabase_jwt(token: &str) -> Result<SupabaseClaims, AuthError> {
    let secret = config_loader::get_supabase_jwt_secret()
        .map_err(|err| AuthError::new(format!("Failed to load config: {}", err)))?;

    validate_supabase_jwt_with_secret(token, &secret)
}

pub fn validate_supabase_jwt_with_secret(
    token: &str,
    secret: &str,
) -> Result<SupabaseClaims, AuthError> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
    validation.set_audience(&["authenticated"]);

    let token_data = decode::<SupabaseClaims>(token, &decoding_key, &validation)
        .map_err(|err| AuthError::new(format!("JWT validation failed: {}", err)))?;

    Ok(token_data.claims)
}

pub(crate) fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let auth_header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AuthError::new("Missing Authorization header"))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AuthError::new("Invalid Authorization header"))?;

    auth_str
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AuthError::new("Invalid Authorization header format"))
}

pub(crate) fn auth_user_from_claims(claims: SupabaseClaims) -> Result<AuthUser, AuthError> {
    let user_id =
        Uuid::parse_str(&claims.sub).map_err(|_| AuthError::new("Invalid user ID in token"))?;

    Ok(AuthUser {
        user_id,
        email: claims.email,
        role: claims.role,
    })
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = validate_supabase_jwt(token)?;

        auth_user_from_claims(claims)
    }
}
