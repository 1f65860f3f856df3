use crate::errors::AppError;
use axum::extract::{FromRef, FromRequestParts, OptionalFromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

/// Claims carried by bearer tokens issued by the account service.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub id: i32,
    pub role: Role,
    pub exp: usize,
}

/// HS256 keys derived from the shared secret.
#[derive(Clone)]
pub struct AuthKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl AuthKeys {
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    pub fn sign(&self, user_id: i32, role: Role, ttl: Duration) -> anyhow::Result<String> {
        let claims = Claims {
            id: user_id,
            role,
            exp: (Utc::now() + ttl).timestamp().max(0) as usize,
        };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding, &Validation::default()).map(|data| data.claims)
    }
}

/// Caller identity taken from `Authorization: Bearer <token>`.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: i32,
    pub role: Role,
}

impl AuthUser {
    pub fn require_teacher(&self) -> Result<(), AppError> {
        match self.role {
            Role::Teacher => Ok(()),
            _ => Err(AppError::Forbidden("Teacher role required".to_string())),
        }
    }
}

/// An authenticated caller holding the teacher role. Rejects with 403
/// before the request body is read.
#[derive(Debug, Clone, Copy)]
pub struct TeacherUser(pub AuthUser);

impl<S> FromRequestParts<S> for TeacherUser
where
    AuthKeys: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = <AuthUser as FromRequestParts<S>>::from_request_parts(parts, state).await?;
        user.require_teacher()?;
        Ok(TeacherUser(user))
    }
}

fn bearer_token(parts: &Parts) -> Option<Result<&str, AppError>> {
    let header = parts.headers.get(AUTHORIZATION)?;
    Some(
        header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::Unauthorized("Malformed authorization header".to_string())),
    )
}

fn authenticate(keys: &AuthKeys, token: &str) -> Result<AuthUser, AppError> {
    let claims = keys.verify(token).map_err(|err| {
        debug!("Rejected bearer token: {}", err);
        AppError::Unauthorized("Invalid or expired token".to_string())
    })?;
    Ok(AuthUser {
        user_id: claims.id,
        role: claims.role,
    })
}

impl<S> FromRequestParts<S> for AuthUser
where
    AuthKeys: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("No token provided".to_string()))??;
        authenticate(&AuthKeys::from_ref(state), token)
    }
}

/// Anonymous when no `Authorization` header is sent; a present but invalid
/// token is still rejected.
impl<S> OptionalFromRequestParts<S> for AuthUser
where
    AuthKeys: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        match bearer_token(parts) {
            None => Ok(None),
            Some(token) => authenticate(&AuthKeys::from_ref(state), token?).map(Some),
        }
    }
}
