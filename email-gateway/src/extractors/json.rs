//! JSON extractor with gateway-shaped rejections

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::GatewayError;

/// `Json<T>` whose rejections use the uniform error body
///
/// # Example
///
/// ```rust,no_run
/// use email_gateway::extractors::{ApiJson, SendEmailRequest};
///
/// async fn handler(ApiJson(request): ApiJson<SendEmailRequest>) -> String {
///     format!("{} recipients", request.to.len())
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = GatewayError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(rejection_error)?;

        Ok(Self(value))
    }
}

fn rejection_error(rejection: JsonRejection) -> GatewayError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        GatewayError::body_too_large(rejection.body_text())
    } else {
        GatewayError::BadRequest(rejection.body_text())
    }
}
