//! Authentication middleware for Axum

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::auth::{AuthError, SharedAccessVerifier};
use crate::interfaces::http::common::ApiError;

#[derive(Clone)]
pub struct AuthState {
    pub verifier: SharedAccessVerifier,
}

/// Bearer-token middleware.
///
/// On success the verified [`Caller`](crate::auth::Caller) is inserted into
/// request extensions; otherwise the request is answered with 401.
pub async fn auth_middleware(
    State(auth_state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let Some(auth_header) = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    else {
        return ApiError::from(AuthError::MissingToken).into_response();
    };

    match auth_state.verifier.verify(auth_header) {
        Ok(caller) => {
            request.extensions_mut().insert(caller);
            next.run(request).await
        }
        Err(e) => {
            debug!(error = %e, "Rejected bearer token");
            ApiError::from(e).into_response()
        }
    }
}
