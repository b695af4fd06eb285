use axum::response::{IntoResponse, Response};
use http::{header, HeaderMap, StatusCode};

use crate::backend::SessionCredentials;

/// Name of the cookie carrying the visitor's access token.
pub const SESSION_COOKIE: &str = "sb-access-token";

/// A general purpose HTTP error type that can be converted into an `IntoResponse`.
pub struct HTTPError {
    status: StatusCode,
    message: String,
    location: Option<String>,
}

impl HTTPError {
    /// Creates a new HTTP error with the given status code and message.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        HTTPError {
            status,
            message: message.into(),
            location: None,
        }
    }

    /// Creates a `303 See Other` rejection pointing the client at `location`.
    pub fn see_other(location: impl Into<String>) -> Self {
        let location = location.into();
        HTTPError {
            status: StatusCode::SEE_OTHER,
            message: format!("redirecting to {location}"),
            location: Some(location),
        }
    }
}

/// Converts our `HTTPError` into an HTTP response.
impl IntoResponse for HTTPError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message }).to_string();
        let mut builder = Response::builder()
            .status(self.status)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(location) = &self.location {
            builder = builder.header(header::LOCATION, location);
        }
        builder.body(body.into()).unwrap()
    }
}

/// Pulls a bearer token out of the `Authorization` header, if one is present.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = raw.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Finds `name` in the `Cookie` header. Splits on `;` rather than doing full
/// RFC 6265 parsing; the values we set never need quoting.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    for pair in raw.split(';') {
        if let Some((key, value)) = pair.split_once('=') {
            if key.trim() == name {
                let value = value.trim();
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
    }
    None
}

/// Credentials the visitor presented on this request. The `Authorization`
/// header wins over the session cookie.
pub fn session_credentials(headers: &HeaderMap) -> SessionCredentials {
    bearer_token(headers)
        .or_else(|| cookie_value(headers, SESSION_COOKIE))
        .map(SessionCredentials::bearer)
        .unwrap_or_else(SessionCredentials::anonymous)
}
