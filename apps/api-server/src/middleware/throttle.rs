//! Attempt throttling for login and approval routes.

use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::middleware::Next;
use actix_web::{Error, ResponseError, web};

use rysetor_core::ports::Verdict;

use crate::middleware::error::AppError;
use crate::state::AppState;

/// Counts the request against the peer's IP address and answers 429 with
/// `Retry-After` once the client has used up its attempts.
///
/// `X-Forwarded-For` and `Forwarded` are ignored: a client can set them to
/// anything and would get a fresh budget per request.
pub async fn throttle_attempts<B: MessageBody>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<EitherBody<B>>, Error> {
    let verdict = req.app_data::<web::Data<AppState>>().map(|state| {
        let client = req
            .peer_addr()
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_owned());
        (state.throttle.attempt(&client), client)
    });

    if let Some((Verdict::Wait(delay), client)) = verdict {
        let retry_after = delay.as_secs().max(1);
        tracing::warn!(client = %client, path = %req.path(), retry_after, "Attempt throttled");

        let response = AppError::TooManyAttempts { retry_after }.error_response();
        return Ok(req.into_response(response).map_into_right_body());
    }

    next.call(req).await.map(ServiceResponse::map_into_left_body)
}
