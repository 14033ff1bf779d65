//! Signature enforcement middleware.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Method, Request, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::http::response::reject;
use crate::observability::metrics;
use crate::signature::replay::{ReplayGuard, VerifyError};
use crate::signature::{NONCE_HEADER, SIGNATURE_HEADER, TIMESTAMP_HEADER};

/// Maximum buffered request body, in bytes.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// State for the signature middleware.
#[derive(Clone)]
pub struct SignatureState {
    pub guard: Arc<ReplayGuard>,
}

fn header_str<'a>(headers: &'a HeaderMap, name: &'static str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Middleware verifying the request signature headers.
///
/// Bodyless methods are signed over their sorted query string; everything
/// else is signed over the raw body. When signatures are optional,
/// requests carrying none of the three headers pass through unsigned;
/// a partial header set is always rejected.
pub async fn signature_middleware(
    State(state): State<SignatureState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let config = state.guard.config();
    if !config.enabled {
        return next.run(request).await;
    }

    let headers = request.headers();
    let timestamp = header_str(headers, TIMESTAMP_HEADER);
    let nonce = header_str(headers, NONCE_HEADER);
    let signature = header_str(headers, SIGNATURE_HEADER);

    if !config.require_signature
        && timestamp.is_none()
        && nonce.is_none()
        && signature.is_none()
    {
        return next.run(request).await;
    }

    let (timestamp, nonce, signature) = match (timestamp, nonce, signature) {
        (Some(t), Some(n), Some(s)) => (t, n.to_string(), s.to_string()),
        (None, _, _) => return deny(&state, VerifyError::MissingHeader(TIMESTAMP_HEADER)),
        (_, None, _) => return deny(&state, VerifyError::MissingHeader(NONCE_HEADER)),
        (_, _, None) => return deny(&state, VerifyError::MissingHeader(SIGNATURE_HEADER)),
    };

    let timestamp: u64 = match timestamp.parse() {
        Ok(ts) => ts,
        Err(_) => return deny(&state, VerifyError::MalformedTimestamp),
    };

    let method = request.method().clone();
    let path = request.uri().path().to_string();

    if matches!(method, Method::GET | Method::HEAD | Method::DELETE) {
        let query = request.uri().query().unwrap_or("").to_string();
        let params: Vec<(&str, &str)> = query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
            .collect();

        if let Err(e) = state.guard.verify_with_query(
            method.as_str(),
            &path,
            timestamp,
            &nonce,
            params,
            &signature,
        ) {
            return deny(&state, e);
        }
        return next.run(request).await;
    }

    let (parts, body) = request.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => {
            metrics::record_rejected("signature", "body_too_large");
            return reject(
                StatusCode::PAYLOAD_TOO_LARGE,
                "body_too_large",
                "Request body too large",
            );
        }
    };
    let body_text = String::from_utf8_lossy(&bytes);

    if let Err(e) = state.guard.verify(
        method.as_str(),
        &path,
        timestamp,
        &nonce,
        &body_text,
        &signature,
    ) {
        return deny(&state, e);
    }

    let request = Request::from_parts(parts, Body::from(bytes));
    next.run(request).await
}

/// Build the rejection response for a verification failure.
///
/// The precise reason always reaches logs and metrics. When configured
/// for generic errors, the client sees one undifferentiated message so
/// probing cannot distinguish a bad digest from a consumed nonce.
fn deny(state: &SignatureState, error: VerifyError) -> Response {
    let reason = error.reason();
    tracing::warn!(reason, %error, "signature verification failed");
    metrics::record_rejected("signature", reason);

    let status = match error {
        VerifyError::MalformedTimestamp => StatusCode::BAD_REQUEST,
        VerifyError::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::UNAUTHORIZED,
    };

    if state.guard.config().generic_errors {
        reject(status, "signature_invalid", "Signature verification failed")
    } else {
        reject(status, reason, &error.to_string())
    }
}
