mod auth;
mod content_type;
mod render;

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router, middleware};
use serde_json::{Value as JsonValue, json};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::catalog::{BundleRegistry, Catalog};
use crate::config::{AuthConfig, RuntimeConfig};
use crate::ingest::{Ingestor, Outcome};
use crate::store::{RecordRepo, RecordStore};

use self::auth::ingest_basic_auth;
use self::content_type::LdJson;
use self::render::render_record;

const BUNDLE_HEADER: &str = "x-islandora-bundle";

#[derive(Clone)]
pub(crate) struct AppState {
    catalog: Arc<Catalog>,
    ingestor: Ingestor,
    records: Arc<dyn RecordStore>,
    auth: Option<Arc<AuthConfig>>,
}

impl AppState {
    pub(crate) fn new(config: RuntimeConfig) -> Result<AppState> {
        let RuntimeConfig { mut init, keyspace } = config;
        let catalog = Arc::new(Catalog::new(&init));
        let records: Arc<dyn RecordStore> = Arc::new(RecordRepo::new(
            keyspace,
            &init.server.base_url,
            &init.server.record_type,
        )?);
        let ingestor = Ingestor::new(
            catalog.clone(),
            catalog.clone(),
            records.clone(),
            init.ingest.strategy,
            init.ingest.missing_mapping,
        );
        Ok(AppState {
            catalog,
            ingestor,
            records,
            auth: init.server.auth.take().map(Arc::new),
        })
    }
}

pub(crate) fn router(state: AppState) -> Router {
    let record_type = state.catalog.record_type().to_owned();

    let mut ingest = Router::new().route(&format!("/{record_type}"), post(post_record));
    if let Some(auth) = &state.auth {
        ingest = ingest
            .route_layer(middleware::from_fn(ingest_basic_auth))
            .route_layer(Extension(auth.clone()));
    }

    Router::new()
        .route(&format!("/{record_type}/{{id}}"), get(get_record))
        .route(&format!("/{record_type}/context/{{bundle}}"), get(get_context))
        .merge(ingest)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub(crate) async fn serve(
    state: AppState,
    addr: &str,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let app = router(state);
    let listener = TcpListener::bind(addr).await?;
    info!(target: "http", "listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

fn reply(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "data": message }))).into_response()
}

fn creation_failed() -> Response {
    reply(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create entity.")
}

async fn post_record(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let Some(bundle) = headers
        .get(BUNDLE_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|bundle| !bundle.is_empty())
    else {
        return reply(
            StatusCode::BAD_REQUEST,
            "X-Islandora-Bundle header not defined",
        );
    };
    let record_type = state.catalog.record_type().to_owned();
    if !state.catalog.bundle_exists(&record_type, bundle) {
        return reply(StatusCode::BAD_REQUEST, "Bundle not found.");
    }
    let document: JsonValue = match serde_json::from_slice(&body) {
        Ok(document) => document,
        Err(err) => {
            error!(target: "http", %bundle, "unable to parse request body: {err}");
            return creation_failed();
        }
    };

    let bundle = bundle.to_owned();
    let ingestor = state.ingestor.clone();
    let task_bundle = bundle.clone();
    let result = tokio::task::spawn_blocking(move || {
        ingestor.create_record(&record_type, &task_bundle, &document)
    })
    .await;

    match result {
        Ok(Ok(Outcome::Created(saved))) => {
            let message = format!("created entity with id {}", saved.id);
            let mut response = reply(StatusCode::CREATED, &message);
            match HeaderValue::from_str(&saved.url) {
                Ok(location) => {
                    response.headers_mut().insert(header::LOCATION, location);
                }
                Err(err) => error!(target: "http", url = %saved.url, "invalid location: {err}"),
            }
            response
        }
        Ok(Ok(Outcome::NothingToMap)) => {
            reply(StatusCode::INTERNAL_SERVER_ERROR, "RDF Mapping not set.")
        }
        Ok(Err(err)) => {
            let err = anyhow::Error::from(err);
            error!(target: "http", %bundle, "failed to create entity: {err:#}");
            creation_failed()
        }
        Err(err) => {
            error!(target: "http", %bundle, "creation task failed: {err}");
            creation_failed()
        }
    }
}

async fn get_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<LdJson<JsonValue>, StatusCode> {
    if let Some(record) = state.records.find_one(&id).map_err(ise)? {
        let url = state.records.location(&id);
        return Ok(LdJson(Json(render_record(&state.catalog, &url, &record))));
    }
    Err(StatusCode::NOT_FOUND)
}

async fn get_context(State(state): State<AppState>, Path(bundle): Path<String>) -> Response {
    let record_type = state.catalog.record_type();
    match state.catalog.context_document(record_type, &bundle) {
        Some(document) => LdJson(Json(document)).into_response(),
        None => reply(StatusCode::NOT_FOUND, "Bundle not found."),
    }
}

fn ise(error: anyhow::Error) -> StatusCode {
    error!(target: "http", "{error:#}");
    StatusCode::INTERNAL_SERVER_ERROR
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, Response, StatusCode, header};
    use fjall::Keyspace;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tempfile::{TempDir, tempdir};
    use tower::ServiceExt;

    use crate::config::{Config, RuntimeConfig, TEST_CONFIG};

    use super::{AppState, router};

    const AUTH: &str = r#"
[server.auth]
username = "admin"
password = "secret"
"#;

    fn test_app(extra: &str) -> Result<(TempDir, Router)> {
        let tmp_dir = tempdir()?;
        let keyspace = Keyspace::open(fjall::Config::new(tmp_dir.path()).temporary(true))?;
        let init: Config = toml::from_str(&format!("{TEST_CONFIG}{extra}"))?;
        let state = AppState::new(RuntimeConfig { init, keyspace })?;
        Ok((tmp_dir, router(state)))
    }

    fn post(bundle: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/fedora_resource")
            .header(header::CONTENT_TYPE, "application/ld+json");
        if let Some(bundle) = bundle {
            builder = builder.header("X-Islandora-Bundle", bundle);
        }
        builder.body(Body::from(body.to_owned())).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_body(response: Response<Body>) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn document() -> String {
        json!({
            "@type": ["http://pcdm.org/models#Object"],
            "http://purl.org/dc/elements/1.1/title": [{ "@value": "A title" }],
            "http://example.com/unknown": [{ "@value": "dropped" }]
        })
        .to_string()
    }

    #[tokio::test]
    async fn bundle_header_is_required() -> Result<()> {
        let (_tmp_dir, app) = test_app("")?;
        for request in [post(None, &document()), post(Some(""), &document())] {
            let response = app.clone().oneshot(request).await?;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(
                json_body(response).await,
                json!({ "data": "X-Islandora-Bundle header not defined" })
            );
        }
        Ok(())
    }

    #[tokio::test]
    async fn bundle_must_exist() -> Result<()> {
        let (_tmp_dir, app) = test_app("")?;
        let response = app.oneshot(post(Some("image"), &document())).await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await, json!({ "data": "Bundle not found." }));
        Ok(())
    }

    #[tokio::test]
    async fn create_then_fetch() -> Result<()> {
        let (_tmp_dir, app) = test_app("")?;
        let response = app
            .clone()
            .oneshot(post(Some("rdf_source"), &document()))
            .await?;
        assert_eq!(response.status(), StatusCode::CREATED);
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
            .expect("location header");
        let body = json_body(response).await;
        let message = body["data"].as_str().unwrap_or_default();
        let id = message
            .strip_prefix("created entity with id ")
            .expect("success message");
        assert_eq!(location, format!("http://localhost:8080/fedora_resource/{id}"));

        let response = app
            .oneshot(get(&format!("/fedora_resource/{id}")))
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).map(|v| v.as_bytes()),
            Some(&b"application/ld+json"[..])
        );
        let record = json_body(response).await;
        assert_eq!(record["@id"], json!(location));
        assert_eq!(record["dc11:title"], json!("A title"));
        Ok(())
    }

    #[tokio::test]
    async fn malformed_documents_fail() -> Result<()> {
        let (_tmp_dir, app) = test_app("")?;
        let empty_value = json!({ "http://purl.org/dc/elements/1.1/title": [] }).to_string();
        for body in [empty_value.as_str(), "not json", "[]"] {
            let response = app.clone().oneshot(post(Some("rdf_source"), body)).await?;
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(
                json_body(response).await,
                json!({ "data": "Failed to create entity." })
            );
        }
        Ok(())
    }

    #[tokio::test]
    async fn bundles_without_mapped_attributes() -> Result<()> {
        let (_tmp_dir, app) = test_app("")?;
        for bundle in ["collection", "binary"] {
            let response = app.clone().oneshot(post(Some(bundle), &document())).await?;
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(
                json_body(response).await,
                json!({ "data": "RDF Mapping not set." })
            );
        }
        Ok(())
    }

    #[tokio::test]
    async fn fatal_missing_mapping() -> Result<()> {
        let (_tmp_dir, app) = test_app("\n[ingest]\nmissing_mapping = \"fatal\"\n")?;
        let response = app.oneshot(post(Some("binary"), &document())).await?;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await,
            json!({ "data": "Failed to create entity." })
        );
        Ok(())
    }

    #[tokio::test]
    async fn unknown_records() -> Result<()> {
        let (_tmp_dir, app) = test_app("")?;
        for uri in [
            "/fedora_resource/0192f0c3b7a47c0e8a1b2c3d4e5f6a7b",
            "/fedora_resource/not-an-id",
        ] {
            let response = app.clone().oneshot(get(uri)).await?;
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
        }
        Ok(())
    }

    #[tokio::test]
    async fn bundle_contexts() -> Result<()> {
        let (_tmp_dir, app) = test_app("")?;
        let response = app
            .clone()
            .oneshot(get("/fedora_resource/context/rdf_source"))
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        let context = json_body(response).await;
        assert_eq!(
            context["@context"]["dcterms"],
            json!("http://purl.org/dc/terms/")
        );

        let response = app.oneshot(get("/fedora_resource/context/image")).await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await, json!({ "data": "Bundle not found." }));
        Ok(())
    }

    #[tokio::test]
    async fn basic_auth_guards_ingest() -> Result<()> {
        let (_tmp_dir, app) = test_app(AUTH)?;

        let response = app
            .clone()
            .oneshot(post(Some("rdf_source"), &document()))
            .await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).map(|v| v.as_bytes()),
            Some(&b"Basic realm=\"ingest\""[..])
        );

        let mut request = post(Some("rdf_source"), &document());
        request.headers_mut().insert(
            header::AUTHORIZATION,
            "Basic YWRtaW46c2VjcmV0".parse()?,
        );
        let response = app.clone().oneshot(request).await?;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .oneshot(get("/fedora_resource/context/rdf_source"))
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        Ok(())
    }
}
