use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

pub(super) struct LdJson<T>(pub(super) Json<T>);

impl<T> IntoResponse for LdJson<T>
where
    T: Serialize,
{
    fn into_response(self) -> Response {
        let mut response = self.0.into_response();
        if response.status() != StatusCode::INTERNAL_SERVER_ERROR {
            response.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/ld+json"),
            );
        }
        response
    }
}
