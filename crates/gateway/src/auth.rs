//! Bearer token authentication for the chat API.
//!
//! Tokens are HS256 JWTs carrying the user id in `sub`. The middleware
//! verifies signature and expiry, then hands the caller's id to handlers as
//! an [`AuthedUser`] extension. Which user's data a request may touch is a
//! separate check made per handler against the path.

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ApiError;
use crate::SharedState;

/// How long issued tokens stay valid.
pub const TOKEN_TTL_DAYS: i64 = 7;

/// Claims carried by an access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,

    /// User email, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Issued at (unix seconds).
    pub iat: i64,

    /// Expiry (unix seconds).
    pub exp: i64,
}

/// Checks bearer tokens against the configured HS256 secret.
#[derive(Clone)]
pub struct AuthVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl AuthVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Verify a raw token and return its claims.
    ///
    /// Expired tokens get their own message so clients know to re-issue
    /// rather than treat the credential as wrong.
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => ApiError::Auth("Token has expired".into()),
                _ => ApiError::Auth("Invalid token".into()),
            })
    }
}

/// The authenticated caller's user id, inserted by [`authenticate`].
#[derive(Debug, Clone)]
pub struct AuthedUser(pub String);

/// Middleware requiring a valid `Authorization: Bearer <token>` header on
/// every route it wraps.
pub async fn authenticate(
    State(state): State<SharedState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Auth("Missing authorization header".into()))?;

    let token = header_value
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Auth("Invalid authorization header".into()))?;

    let claims = state.verifier.verify(token).map_err(|e| {
        warn!(path = %req.uri().path(), "Rejected bearer token");
        e
    })?;

    req.extensions_mut().insert(AuthedUser(claims.sub));
    Ok(next.run(req).await)
}

/// Mint a signed token for `sub`, valid for [`TOKEN_TTL_DAYS`].
///
/// Used by the onboarding CLI; there is no login endpoint in this service.
pub fn issue_token(
    secret: &str,
    sub: &str,
    email: Option<&str>,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: sub.to_string(),
        email: email.map(str::to_string),
        iat: now.timestamp(),
        exp: (now + Duration::days(TOKEN_TTL_DAYS)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}
