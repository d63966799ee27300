//! Request correlation.
//!
//! Every request runs inside a `request` span carrying an ID. A sane
//! `X-Request-ID` from a proxy is reused; otherwise a fresh UUID is minted.
//! The ID is echoed back on the response.

use actix_web::Error;
use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::middleware::Next;
use tracing::Instrument;
use uuid::Uuid;

const REQUEST_ID: &str = "x-request-id";

fn usable(id: &HeaderValue) -> bool {
    let len = id.len();
    (1..=128).contains(&len) && id.to_str().is_ok()
}

pub async fn correlate<B: MessageBody>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<B>, Error> {
    let id = match req.headers().get(REQUEST_ID) {
        Some(supplied) if usable(supplied) => supplied.clone(),
        _ => HeaderValue::from_str(&Uuid::new_v4().to_string())
            .unwrap_or_else(|_| HeaderValue::from_static("unknown")),
    };

    let span = tracing::info_span!(
        "request",
        request_id = id.to_str().unwrap_or_default(),
        method = %req.method(),
        path = %req.path(),
    );

    let mut res = next.call(req).instrument(span).await?;
    res.headers_mut().insert(HeaderName::from_static(REQUEST_ID), id);
    Ok(res)
}
