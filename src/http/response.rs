//! Rejection responses shared by the middleware stack.

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// JSON body for every rejection produced by the shield.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-distinguishable reason code.
    pub code: String,
    /// Human-readable message. May be generic when the config asks for
    /// rejection reasons to be collapsed.
    pub message: String,
    /// Present on overload rejections: when to try again.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

/// Build a JSON rejection response.
pub fn reject(status: StatusCode, code: &str, message: &str) -> Response {
    let body = ErrorBody {
        code: code.to_string(),
        message: message.to_string(),
        retry_after: None,
    };
    json_response(status, &body)
}

/// Build a 429 response with retry guidance.
pub fn rate_limited(code: &str, message: &str, retry_after: u64) -> Response {
    let body = ErrorBody {
        code: code.to_string(),
        message: message.to_string(),
        retry_after: Some(retry_after),
    };
    let mut response = json_response(StatusCode::TOO_MANY_REQUESTS, &body);
    if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
        response.headers_mut().insert(header::RETRY_AFTER, value);
    }
    response
}

fn json_response(status: StatusCode, body: &ErrorBody) -> Response {
    match serde_json::to_string(body) {
        Ok(json) => {
            let mut response = Response::new(Body::from(json));
            *response.status_mut() = status;
            response.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
            response
        }
        Err(_) => status.into_response(),
    }
}
