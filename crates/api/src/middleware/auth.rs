//! # Authentication Module
//!
//! Every `/api` route runs [`authenticate`]: it reads the bearer credential,
//! resolves it through the identity service once, and stores the resulting
//! [`Caller`] in the request extensions. Handlers then declare what they need
//! with an extractor:
//!
//! - [`CurrentCaller`] admits any authenticated caller.
//! - [`Authorized<P>`] additionally requires one of the roles of policy `P`.
//!
//! A missing or malformed header is `401`; a valid caller without the
//! required role is `403`.

use std::marker::PhantomData;
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use timetable_core::{
    errors::{TimeError, TimeResult},
    models::identity::{Caller, Credential, Role},
    policy::{self, ROOM_VIEWERS, TIMETABLE_MANAGERS},
};

use crate::ApiState;
use crate::middleware::error_handling::AppError;

/// Extracts the credential from an `Authorization: Bearer <token>` header.
///
/// The scheme is case-insensitive and the header must have exactly two
/// whitespace-separated parts.
pub fn bearer_credential(headers: &HeaderMap) -> TimeResult<Credential> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| TimeError::Authentication("Authorization header required".to_string()))?;

    let value = value.to_str().map_err(|_| malformed_header())?;
    let parts: Vec<&str> = value.split_whitespace().collect();

    match parts.as_slice() {
        [scheme, token] if scheme.eq_ignore_ascii_case("bearer") => Ok(Credential::new(*token)),
        _ => Err(malformed_header()),
    }
}

fn malformed_header() -> TimeError {
    TimeError::Authentication("Authorization header format must be 'Bearer {token}'".to_string())
}

/// Resolves the caller and hands the request on.
pub async fn authenticate(
    State(state): State<Arc<ApiState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let credential = bearer_credential(request.headers())?;
    let caller = policy::authenticate(state.identity.as_ref(), credential).await?;

    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}

fn caller_from(parts: &Parts) -> Result<Caller, AppError> {
    parts
        .extensions
        .get::<Caller>()
        .cloned()
        .ok_or_else(|| AppError(TimeError::Authentication("Authorization header required".to_string())))
}

/// Any authenticated caller.
#[derive(Debug, Clone)]
pub struct CurrentCaller(pub Caller);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentCaller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        caller_from(parts).map(CurrentCaller)
    }
}

/// A set of roles that admits a caller.
pub trait RolePolicy: Send + Sync + 'static {
    const ROLES: &'static [Role];
}

/// Admin or manager.
pub struct TimetableManagers;

impl RolePolicy for TimetableManagers {
    const ROLES: &'static [Role] = TIMETABLE_MANAGERS;
}

/// Admin, manager or doctor.
pub struct RoomViewers;

impl RolePolicy for RoomViewers {
    const ROLES: &'static [Role] = ROOM_VIEWERS;
}

/// An authenticated caller holding one of `P::ROLES`.
pub struct Authorized<P: RolePolicy>(pub Caller, PhantomData<P>);

impl<P: RolePolicy> Authorized<P> {
    pub fn caller(&self) -> &Caller {
        &self.0
    }
}

#[axum::async_trait]
impl<S, P> FromRequestParts<S> for Authorized<P>
where
    S: Send + Sync,
    P: RolePolicy,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let caller = caller_from(parts)?;
        policy::authorize(&caller.identity, P::ROLES)?;
        Ok(Authorized(caller, PhantomData))
    }
}
