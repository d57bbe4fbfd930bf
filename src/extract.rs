use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Path, Request, rejection::PathRejection},
    http::{HeaderMap, header, request::Parts},
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::AppError;

/// JSON body extractor for the API.
///
/// An empty body reads as `{}` so that a missing root key surfaces as a
/// missing parameter rather than a parse failure. A body sent with any
/// other content type is refused.
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let json_content = has_json_content_type(req.headers());
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| AppError::bad_request(rejection.body_text()))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return parse(b"{}").map(Self);
        }
        if !json_content {
            return Err(AppError::UnsupportedFormat);
        }
        parse(&bytes).map(Self)
    }
}

/// Path parameters for the API.
///
/// An id that does not parse cannot name a stored record, so it is reported
/// as not found in the usual error envelope.
#[derive(Debug, Clone)]
pub struct ApiPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(PathRejection::FailedToDeserializePathParams(rejection)) => {
                debug!(path = %parts.uri.path(), error = %rejection.body_text(), "unparseable path parameter");
                Err(AppError::not_found("Resource not found"))
            }
            Err(rejection) => Err(AppError::bad_request(rejection.body_text())),
        }
    }
}

fn parse<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, AppError> {
    serde_json::from_slice(bytes).map_err(|err| AppError::bad_request(err.to_string()))
}

fn has_json_content_type(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
    else {
        return false;
    };
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}

/// Whether an `Accept` header admits a JSON response. A missing header does.
pub fn accepts_json(headers: &HeaderMap) -> bool {
    let Some(accept) = headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
    else {
        return true;
    };
    accept.split(',').any(|range| {
        let mime = range
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        matches!(
            mime.as_str(),
            "application/json" | "application/*" | "*/*" | ""
        )
    })
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(name: header::HeaderName, value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn accept_negotiation() {
        assert!(accepts_json(&HeaderMap::new()));
        assert!(accepts_json(&headers(header::ACCEPT, "application/json")));
        assert!(accepts_json(&headers(header::ACCEPT, "text/html, */*;q=0.8")));
        assert!(accepts_json(&headers(header::ACCEPT, "Application/JSON")));
        assert!(accepts_json(&headers(header::ACCEPT, "APPLICATION/*; q=0.5")));
        assert!(!accepts_json(&headers(header::ACCEPT, "text/html")));
        assert!(!accepts_json(&headers(
            header::ACCEPT,
            "text/vnd.turbo-stream.html"
        )));
    }

    #[test]
    fn content_type_detection() {
        assert!(has_json_content_type(&headers(
            header::CONTENT_TYPE,
            "application/json; charset=utf-8"
        )));
        assert!(has_json_content_type(&headers(
            header::CONTENT_TYPE,
            "application/merge-patch+json"
        )));
        assert!(!has_json_content_type(&headers(
            header::CONTENT_TYPE,
            "application/x-www-form-urlencoded"
        )));
        assert!(!has_json_content_type(&HeaderMap::new()));
    }
}
