use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::convert::Infallible;

use crate::correlation::CorrelationToken;
use crate::logger::ScopedLogger;

/// Request-scoped carrier threaded explicitly through handlers, services and
/// repositories.
///
/// Scopes are values: [`attach`](Self::attach) and
/// [`with_correlation`](Self::with_correlation) return a new scope and leave
/// the receiver as it was.
#[derive(Clone, Debug, Default)]
pub struct RequestScope {
    logger: Option<ScopedLogger>,
    correlation: Option<CorrelationToken>,
}

impl RequestScope {
    /// Empty scope; its logger is the no-op logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// New scope carrying `logger`.
    pub fn attach(&self, logger: ScopedLogger) -> RequestScope {
        RequestScope {
            logger: Some(logger),
            correlation: self.correlation,
        }
    }

    /// Logger attached to this scope, or the no-op logger if none is.
    pub fn logger(&self) -> ScopedLogger {
        self.logger.clone().unwrap_or_else(ScopedLogger::noop)
    }

    pub fn with_correlation(&self, token: CorrelationToken) -> RequestScope {
        RequestScope {
            logger: self.logger.clone(),
            correlation: Some(token),
        }
    }

    pub fn correlation(&self) -> Option<CorrelationToken> {
        self.correlation
    }
}

/// Handlers take the scope as an extractor. Requests that did not pass
/// through [`request_scope`](crate::middleware::request_scope) get an empty
/// scope.
#[async_trait]
impl<S> FromRequestParts<S> for RequestScope
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestScope>()
            .cloned()
            .unwrap_or_default())
    }
}
