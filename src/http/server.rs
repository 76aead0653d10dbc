//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the runtime state (collaborators, gate, call sites) from config
//! - Create the Axum Router with all handlers
//! - Wire up middleware (tracing, request ID, outer timeout, metrics)
//! - Swap runtime state on config reload
//! - Serve until the shutdown signal fires

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::http::middleware::{callback_auth_middleware, track_requests, upload_auth_middleware};
use crate::http::request::{make_request_span, RequestIdLayer};
use crate::http::response::{onboarding_response, rejection_response};
use crate::identity::{Credentials, HttpIdentityProvider, IdentityProvider};
use crate::observability::metrics;
use crate::onboarding::OnboardingPage;
use crate::profile::{HttpProfileStore, ProfileStore};
use crate::resilience::{DeadlineGate, TracingSink};
use crate::upload::{on_upload_complete, FileDescriptor, FileRoute, UploadAuthorizer, UploadCompletion, UploadContext};

/// Errors building the server's runtime state.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid {field}: {source}")]
    InvalidUrl {
        field: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Where the identity provider and profile store come from.
#[derive(Clone)]
pub enum Collaborators {
    /// Built from the configured base URLs on every (re)load.
    Http(reqwest::Client),
    /// Supplied by the embedder; config reloads only change deadlines and limits.
    Fixed {
        identity: Arc<dyn IdentityProvider>,
        profiles: Arc<dyn ProfileStore>,
    },
}

impl Collaborators {
    pub fn http() -> Result<Self, ServerError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("onboarding-gate/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Collaborators::Http(client))
    }

    fn resolve(&self, config: &AppConfig) -> Result<(Arc<dyn IdentityProvider>, Arc<dyn ProfileStore>), ServerError> {
        match self {
            Collaborators::Http(client) => {
                let identity = HttpIdentityProvider::new(
                    client.clone(),
                    &config.identity.base_url,
                    &config.identity.session_path,
                )
                .map_err(|source| ServerError::InvalidUrl {
                    field: "identity.base_url",
                    source,
                })?;
                let profiles = HttpProfileStore::new(client.clone(), &config.profiles.base_url).map_err(|source| {
                    ServerError::InvalidUrl {
                        field: "profiles.base_url",
                        source,
                    }
                })?;
                Ok((Arc::new(identity), Arc::new(profiles)))
            }
            Collaborators::Fixed { identity, profiles } => Ok((identity.clone(), profiles.clone())),
        }
    }
}

/// Everything a request needs, rebuilt as a unit on config reload.
pub struct RuntimeState {
    pub config: AppConfig,
    pub page: OnboardingPage,
    pub uploads: UploadAuthorizer,
}

impl RuntimeState {
    pub fn build(config: AppConfig, collaborators: &Collaborators) -> Result<Self, ServerError> {
        let (identity, profiles) = collaborators.resolve(&config)?;
        let gate = DeadlineGate::new(Arc::new(TracingSink)).with_policy(config.gate.on_timeout);

        let page = OnboardingPage::new(gate.clone(), identity.clone(), profiles)
            .with_deadlines(config.identity.page_deadline_ms, config.profiles.deadline_ms)
            .with_home_path(config.onboarding.home_path.clone());
        let uploads = UploadAuthorizer::new(gate, identity, FileRoute::from_config(&config.upload))
            .with_deadline(config.identity.upload_deadline_ms);

        Ok(Self { config, page, uploads })
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<ArcSwap<RuntimeState>>,
    collaborators: Collaborators,
}

impl AppState {
    /// Rebuild runtime state from a new config. On error the current state stays.
    pub fn reload(&self, config: AppConfig) -> Result<(), ServerError> {
        let next = RuntimeState::build(config, &self.collaborators)?;
        self.inner.store(Arc::new(next));
        Ok(())
    }
}

/// HTTP server for the onboarding page and upload routes.
pub struct GateServer {
    router: Router,
    config: AppConfig,
    state: AppState,
}

impl GateServer {
    /// Create a server whose collaborators are reached over HTTP.
    pub fn new(config: AppConfig) -> Result<Self, ServerError> {
        Self::with_collaborators(config, Collaborators::http()?)
    }

    pub fn with_collaborators(config: AppConfig, collaborators: Collaborators) -> Result<Self, ServerError> {
        let runtime = RuntimeState::build(config.clone(), &collaborators)?;
        let state = AppState {
            inner: Arc::new(ArcSwap::from_pointee(runtime)),
            collaborators,
        };
        let router = Self::build_router(&config, state.clone());
        Ok(Self { router, config, state })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: AppState) -> Router {
        let uploads = Router::new()
            .route("/api/uploads/{slug}", post(upload_handler))
            .route_layer(middleware::from_fn_with_state(state.clone(), upload_auth_middleware));

        let callbacks = Router::new()
            .route("/api/uploads/{slug}/complete", post(upload_complete_handler))
            .route_layer(middleware::from_fn_with_state(state.clone(), callback_auth_middleware));

        Router::new()
            .route("/health", get(health_handler))
            .route("/onboarding", get(onboarding_handler))
            .merge(uploads)
            .merge(callbacks)
            .with_state(state)
            .layer(middleware::from_fn(track_requests))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(RequestIdLayer::propagate())
            .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
            .layer(RequestIdLayer::set())
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Applies every config received on `config_updates` and stops when
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<AppConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let state = self.state.clone();
        let startup_config = self.config.clone();
        let reloader = tokio::spawn(async move {
            while let Some(new_config) = config_updates.recv().await {
                if new_config.listener.bind_address != startup_config.listener.bind_address {
                    tracing::warn!("listener.bind_address changed; restart required to rebind");
                }
                match state.reload(new_config) {
                    Ok(()) => tracing::info!("Configuration reloaded"),
                    Err(e) => tracing::error!(error = %e, "Failed to apply reloaded config, keeping current state"),
                }
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the startup config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn state(&self) -> AppState {
        self.state.clone()
    }
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn onboarding_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let runtime = state.inner.load_full();
    let view = runtime.page.load(Credentials::from_headers(&headers)).await;
    onboarding_response(view)
}

/// Body of an upload request: the files the client is about to send.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRequest {
    pub files: Vec<FileDescriptor>,
}

async fn upload_handler(
    State(state): State<AppState>,
    Extension(context): Extension<UploadContext>,
    Json(request): Json<UploadRequest>,
) -> Response {
    let runtime = state.inner.load_full();
    match runtime.uploads.permit(context, &request.files) {
        Ok(authorization) => {
            metrics::record_upload_authorization("authorized");
            Json(authorization).into_response()
        }
        Err(rejection) => {
            metrics::record_upload_authorization(rejection.kind());
            rejection_response(&rejection)
        }
    }
}

async fn upload_complete_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(completion): Json<UploadCompletion>,
) -> Response {
    let runtime = state.inner.load_full();
    if runtime.uploads.route().slug != slug {
        return (StatusCode::NOT_FOUND, "No such upload route").into_response();
    }
    Json(on_upload_complete(&completion)).into_response()
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Request};
    use tower::ServiceExt;

    use super::*;
    use crate::identity::{MemoryIdentityProvider, Session};
    use crate::profile::{MemoryProfileStore, ProfileRecord};
    use crate::resilience::Deadline;

    const SECRET: &str = "callback-secret";

    fn server(identity: MemoryIdentityProvider, profiles: MemoryProfileStore) -> GateServer {
        let mut config = AppConfig::default();
        config.upload.callback_secret = SECRET.into();
        GateServer::with_collaborators(
            config,
            Collaborators::Fixed {
                identity: Arc::new(identity),
                profiles: Arc::new(profiles),
            },
        )
        .unwrap()
    }

    fn signed_in(latency: Option<Duration>) -> MemoryIdentityProvider {
        let mut identity = MemoryIdentityProvider::new();
        if let Some(latency) = latency {
            identity = identity.with_latency(latency);
        }
        identity.insert("tok", Session::new("user_1"));
        identity
    }

    fn onboarded() -> MemoryProfileStore {
        let profiles = MemoryProfileStore::new();
        profiles.upsert(ProfileRecord {
            object_id: "obj_1".into(),
            user_id: "user_1".into(),
            onboarded: true,
            ..Default::default()
        });
        profiles
    }

    async fn send(server: &GateServer, request: Request<Body>) -> Response {
        server.router.clone().oneshot(request).await.unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn upload_request(path: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::post(path).header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder
            .body(Body::from(
                r#"{"files":[{"name":"avatar.png","size":2048,"type":"image/png"}]}"#,
            ))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let server = server(MemoryIdentityProvider::new(), MemoryProfileStore::new());
        let response = send(&server, Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_onboarded_user_is_redirected_home() {
        let server = server(signed_in(None), onboarded());
        let request = Request::get("/onboarding")
            .header(header::AUTHORIZATION, "Bearer tok")
            .body(Body::empty())
            .unwrap();
        let response = send(&server, request).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");
    }

    #[tokio::test(start_paused = true)]
    async fn test_anonymous_visitor_gets_empty_page() {
        let server = server(signed_in(None), onboarded());
        let response = send(&server, Request::get("/onboarding").body(Body::empty()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["state"], "empty");
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_identity_renders_connection_error() {
        let server = server(signed_in(Some(Duration::from_secs(20))), onboarded());
        let request = Request::get("/onboarding")
            .header(header::COOKIE, "__session=tok")
            .body(Body::empty())
            .unwrap();
        let response = send(&server, request).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = body_json(response).await;
        assert_eq!(body["state"], "error");
        assert_eq!(body["title"], "Connection Error");
        assert_eq!(body["retry"], true);
    }

    #[tokio::test(start_paused = true)]
    async fn test_upload_authorized_for_signed_in_user() {
        let server = server(signed_in(None), MemoryProfileStore::new());
        let response = send(&server, upload_request("/api/uploads/media", Some("tok"))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["authorized"], true);
        assert_eq!(body["context"]["userId"], "user_1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_upload_rejections() {
        let server = server(signed_in(Some(Duration::from_secs(20))), MemoryProfileStore::new());

        let response = send(&server, upload_request("/api/uploads/media", Some("tok"))).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            body_json(response).await["error"],
            "Authentication timeout - please try again"
        );

        let response = send(&server, upload_request("/api/uploads/media", Some("unknown"))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send(&server, upload_request("/api/uploads/videos", Some("tok"))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_completion_requires_callback_secret() {
        let server = server(MemoryIdentityProvider::new(), MemoryProfileStore::new());
        let payload = r#"{"metadata":{"userId":"user_1"},"file":{"url":"https://files.example/a.png"}}"#;

        let request = Request::post("/api/uploads/media/complete")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload))
            .unwrap();
        assert_eq!(send(&server, request).await.status(), StatusCode::UNAUTHORIZED);

        let request = Request::post("/api/uploads/media/complete")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, format!("Bearer {}", SECRET))
            .body(Body::from(payload))
            .unwrap();
        let response = send(&server, request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"uploadedBy": "user_1", "fileUrl": "https://files.example/a.png"})
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_applies_new_deadline() {
        let server = server(signed_in(Some(Duration::from_secs(3))), onboarded());
        let request = || {
            Request::get("/onboarding")
                .header(header::AUTHORIZATION, "Bearer tok")
                .body(Body::empty())
                .unwrap()
        };
        assert_eq!(send(&server, request()).await.status(), StatusCode::SEE_OTHER);

        let mut config = server.config().clone();
        config.identity.page_deadline_ms = Deadline::from_millis(1000);
        server.state().reload(config).unwrap();
        assert_eq!(send(&server, request()).await.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
