use std::str;
use std::sync::Arc;

use axum::Extension;
use axum::extract::Request;
use axum::http::{StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64ct::{Base64, Encoding};
use secrecy::ExposeSecret;
use tracing::debug;

use crate::config::AuthConfig;

pub(super) async fn ingest_basic_auth(
    Extension(auth): Extension<Arc<AuthConfig>>,
    req: Request,
    next: Next,
) -> Response {
    fn need_auth() -> Response {
        let authn = [(header::WWW_AUTHENTICATE, "Basic realm=\"ingest\"")];
        (StatusCode::UNAUTHORIZED, authn).into_response()
    }
    let Some(authz) = req.headers().get(header::AUTHORIZATION) else {
        return need_auth();
    };

    let Ok(cred) = authz.to_str() else {
        return need_auth();
    };
    let Some(cred) = cred
        .strip_prefix("Basic ")
        .map(str::trim)
        .and_then(|b64| Base64::decode_vec(b64).ok())
        .and_then(|b| String::from_utf8(b).ok())
    else {
        return need_auth();
    };

    let Some((user, password)) = cred.split_once(':') else {
        return need_auth();
    };

    if user != auth.username || password != auth.password.expose_secret() {
        debug!(target: "http", %user, "rejected credentials");
        return need_auth();
    }

    next.run(req).await
}
