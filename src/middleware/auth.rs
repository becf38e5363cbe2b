use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::role::{Actor, Role};
use crate::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: Option<String>,
}

impl Claims {
    /// The actor these claims describe. Tokens without a known role are
    /// authenticated but may not do anything.
    pub fn actor(&self) -> Result<Actor> {
        let role = self
            .role
            .as_deref()
            .ok_or_else(|| Error::Forbidden("token carries no role".to_string()))?
            .parse::<Role>()
            .map_err(|_| Error::Forbidden("token carries an unknown role".to_string()))?;
        Ok(Actor::new(self.sub.clone(), role))
    }
}

fn bearer_token(req: &Request) -> Result<&str> {
    let header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| Error::Unauthorized("missing_authorization".to_string()))?;
    let value = header
        .to_str()
        .map_err(|_| Error::Unauthorized("bad_authorization".to_string()))?;
    value
        .strip_prefix("Bearer ")
        .ok_or_else(|| Error::Unauthorized("unsupported_scheme".to_string()))
}

pub fn decode_claims(token: &str, secret: &str) -> Result<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|_| Error::Unauthorized("invalid_token".to_string()))
}

/// Mints an HS256 token for `actor`, valid for `ttl_secs`.
pub fn issue_token(actor: &Actor, secret: &str, ttl_secs: i64) -> Result<String> {
    let exp = (chrono::Utc::now().timestamp() + ttl_secs).max(0) as usize;
    let claims = Claims {
        sub: actor.id.clone(),
        exp,
        role: Some(actor.role.as_str().to_string()),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| Error::Internal(format!("failed to sign token: {}", e)))
}

/// Verifies the bearer token and makes the caller available to handlers as
/// an `Extension<Actor>`.
pub async fn require_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let actor = match bearer_token(&req)
        .and_then(|token| decode_claims(token, &state.jwt_secret))
        .and_then(|claims| claims.actor())
    {
        Ok(actor) => actor,
        Err(err) => return err.into_response(),
    };
    req.extensions_mut().insert(actor);
    next.run(req).await
}
