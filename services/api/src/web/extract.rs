//! services/api/src/web/extract.rs
//!
//! Request extractors whose rejections are rendered through the same
//! `{error, message}` body as every other failure.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
    Json,
};
use classroom_core::ServiceError;
use uuid::Uuid;

use crate::web::rest::{reject, Rejection};

/// A JSON request body. Malformed or mistyped bodies become `invalid_input`.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = Rejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(reject(ServiceError::invalid(rejection.body_text()))),
        }
    }
}

/// The `{id}` segment of a resource path.
///
/// An id that is not a UUID cannot name any stored resource, so it is reported
/// as `not_found`.
#[derive(Debug, Clone, Copy)]
pub struct ResourceId(pub Uuid);

impl<S> FromRequestParts<S> for ResourceId
where
    S: Send + Sync,
{
    type Rejection = Rejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<Uuid>::from_request_parts(parts, state).await {
            Ok(Path(id)) => Ok(Self(id)),
            Err(rejection) => {
                tracing::debug!("Unparseable resource id: {}", rejection.body_text());
                Err(reject(ServiceError::not_found("Resource not found")))
            }
        }
    }
}
