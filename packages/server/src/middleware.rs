//! Function middleware for panic recovery, the request deadline and bearer
//! authentication, plus the [`Caller`] extractor handlers read the
//! authenticated principal through.

use std::any::Any;
use std::future::{Ready, ready};
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use actix_web::body::{BoxBody, MessageBody};
use actix_web::dev::{Payload, ServiceRequest, ServiceResponse};
use actix_web::http::header::AUTHORIZATION;
use actix_web::middleware::Next;
use actix_web::{FromRequest, HttpMessage as _, HttpRequest, ResponseError as _, web};
use futures::FutureExt as _;
use works_portal_report_models::Principal;
use works_portal_service::ServiceError;
use works_portal_service::auth::AuthService;

use crate::error::ApiError;

/// Deadline applied when none is registered.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(10);

/// Per-request deadline, registered as app data.
#[derive(Debug, Clone, Copy)]
pub struct RequestDeadline(pub Duration);

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Turns a panicking handler into a redacted `500` and errors raised by
/// the inner middleware into envelope responses.
///
/// # Errors
///
/// Never; the `Result` is required by [`actix_web::middleware::from_fn`].
pub async fn recover(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<BoxBody>, actix_web::Error> {
    let request = req.request().clone();
    let path = req.path().to_string();

    match AssertUnwindSafe(next.call(req)).catch_unwind().await {
        Ok(Ok(res)) => Ok(res.map_into_boxed_body()),
        Ok(Err(e)) => Ok(ServiceResponse::new(request, e.error_response())),
        Err(panic) => {
            let error = ApiError(ServiceError::Internal(format!(
                "handler for {path} panicked: {}",
                panic_message(panic.as_ref())
            )));
            Ok(ServiceResponse::new(request, error.error_response()))
        }
    }
}

/// Drops the inner future, and with it any pending I/O, once the
/// [`RequestDeadline`] passes.
///
/// # Errors
///
/// Returns a `504` on expiry and passes through errors of the inner
/// service.
pub async fn deadline(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    let limit = req
        .app_data::<RequestDeadline>()
        .map_or(DEFAULT_DEADLINE, |d| d.0);
    let path = req.path().to_string();

    tokio::time::timeout(limit, next.call(req))
        .await
        .unwrap_or_else(|_| {
            log::warn!("{path} exceeded its {}ms deadline", limit.as_millis());
            Err(ApiError(ServiceError::RequestTimeout).into())
        })
}

fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Verifies an `Authorization: Bearer` header and stores the
/// [`Principal`] in the request extensions. Requests without the header
/// pass through anonymously; handlers decide whether that is allowed.
///
/// # Errors
///
/// Returns a `401` for a malformed header or an invalid token.
pub async fn authenticate(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    let principal = match req.headers().get(AUTHORIZATION) {
        None => None,
        Some(header) => {
            let token = header.to_str().ok().and_then(bearer_token).ok_or_else(|| {
                ApiError(ServiceError::Unauthorized(
                    "Malformed Authorization header".into(),
                ))
            })?;
            let auth = req.app_data::<web::Data<AuthService>>().ok_or_else(|| {
                ApiError(ServiceError::Internal("AuthService is not registered".into()))
            })?;
            Some(auth.verify(token).map_err(ApiError)?)
        }
    };

    if let Some(principal) = principal {
        req.extensions_mut().insert(principal);
    }
    next.call(req).await
}

/// The principal stored by [`authenticate`], if any.
#[derive(Debug, Clone, Default)]
pub struct Caller(pub Option<Principal>);

impl Caller {
    #[must_use]
    pub const fn principal(&self) -> Option<&Principal> {
        self.0.as_ref()
    }

    /// # Errors
    ///
    /// Returns a `401` when the request carried no token.
    pub fn require(&self) -> Result<&Principal, ApiError> {
        self.principal().ok_or_else(|| {
            ApiError(ServiceError::Unauthorized("Authentication required".into()))
        })
    }
}

impl FromRequest for Caller {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(Self(req.extensions().get::<Principal>().cloned())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bearer_scheme_case_insensitively() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("bearer  abc "), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("abc"), None);
    }

    #[test]
    fn reads_string_and_str_panics() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(boxed.as_ref()), "bang");
    }
}
