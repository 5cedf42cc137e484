use axum::{
    extract::{Request, State},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

use crate::correlation::{CorrelationGenerator, TRACEPARENT_FIELD};
use crate::fields;
use crate::logger::ScopedLogger;
use crate::scope::RequestScope;

/// Request-scope middleware.
///
/// Derives a per-request logger from `base` carrying a fresh correlation
/// token, logs the start and end of the request and exposes a
/// [`RequestScope`] to downstream handlers through the request extensions.
/// The token is echoed in the `traceparent` response header.
///
/// Install with `axum::middleware::from_fn_with_state(base, request_scope)`.
pub async fn request_scope(
    State(base): State<ScopedLogger>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = CorrelationGenerator::global().generate();
    let log = base.with(&fields![TRACEPARENT_FIELD, token.to_string()]);

    log.info(
        "request started",
        &fields!["method", request.method().as_str(), "path", request.uri().path()],
    );
    let start = Instant::now();

    let scope = RequestScope::new().with_correlation(token).attach(log.clone());
    request.extensions_mut().insert(scope);

    let mut response = next.run(request).await;

    log.info(
        "request completed",
        &fields!["status", response.status().as_u16(), "duration", start.elapsed()],
    );

    if let Ok(value) = HeaderValue::from_str(&token.to_string()) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(TRACEPARENT_FIELD), value);
    }
    response
}
