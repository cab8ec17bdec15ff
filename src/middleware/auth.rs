use axum::{extract::FromRequestParts, http::header};
use jsonwebtoken::{DecodingKey, Validation, decode};
use uuid::Uuid;

use crate::{audit::AuditContext, dto::auth::Claims, error::AppError, models::CartOwner};

const CART_SESSION_HEADER: &str = "x-cart-session";
const MAX_SESSION_KEY_LEN: usize = 100;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: String,
}

pub fn ensure_role(user: &AuthUser, role: &str) -> Result<(), AppError> {
    if user.role != role {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, "admin")
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;
    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::BadRequest("Missing Authorization header".into()))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::BadRequest("Invalid Authorization header".into()))?;

        if !auth_str.starts_with("Bearer ") {
            return Err(AppError::BadRequest("Invalid Authorization scheme".into()));
        }
        let token = auth_str.trim_start_matches("Bearer ").trim();

        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))?;

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| AppError::BadRequest("Invalid or expired token".into()))?;

        let user_id = Uuid::parse_str(&decoded.claims.sub)
            .map_err(|_| AppError::BadRequest("Invalid user id in token".into()))?;

        Ok(AuthUser {
            user_id,
            role: decoded.claims.role.clone(),
        })
    }
}

/// Request identity for storefront endpoints: an authenticated customer when
/// a Bearer token is present, otherwise an anonymous shopper identified by a
/// client-held `x-cart-session` key. A present-but-invalid token is rejected
/// rather than silently downgraded to a guest.
#[derive(Debug, Clone)]
pub struct Shopper {
    pub owner: CartOwner,
}

impl Shopper {
    pub fn audit(&self) -> AuditContext {
        match &self.owner {
            CartOwner::Customer(user_id) => AuditContext::customer(*user_id),
            CartOwner::Guest(_) => AuditContext::anonymous(),
        }
    }
}

impl<S> FromRequestParts<S> for Shopper
where
    S: Send + Sync,
{
    type Rejection = AppError;
    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        if parts.headers.contains_key(header::AUTHORIZATION) {
            let user = AuthUser::from_request_parts(parts, state).await?;
            return Ok(Shopper {
                owner: CartOwner::Customer(user.user_id),
            });
        }

        let session_key = parts
            .headers
            .get(CART_SESSION_HEADER)
            .ok_or_else(|| {
                AppError::BadRequest("Missing Authorization or x-cart-session header".into())
            })?
            .to_str()
            .map_err(|_| AppError::BadRequest("Invalid x-cart-session header".into()))?
            .trim();

        if session_key.is_empty() || session_key.len() > MAX_SESSION_KEY_LEN {
            return Err(AppError::BadRequest("Invalid x-cart-session header".into()));
        }

        Ok(Shopper {
            owner: CartOwner::Guest(session_key.to_string()),
        })
    }
}
