/// HTTP surface
///
/// Thin axum layer over the triage pipeline: five routes, one per
/// boundary operation. A plain fixed-window limiter throttles raw request
/// volume per identity before the pipeline's unique-key admission even
/// runs; all real shielding lives in the pipeline.
use axum::{
    extract::{ConnectInfo, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::json;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::timeout;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::cache::Cache;
use crate::classify::KeywordClassifier;
use crate::config::Config;
use crate::error::{InsightError, InsightResult};
use crate::limiter::{Admission, RateLimiter};
use crate::pipeline::TriagePipeline;
use crate::source::YouTubeClient;
use crate::types::Tier;

/// Main server structure
pub struct InsightServer {
    app: Router,
    config: Config,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Triage pipeline behind every route
    pipeline: Arc<TriagePipeline>,
    /// Plain per-identity request throttle
    request_limiter: Arc<RateLimiter>,
    /// Plain requests allowed per minute
    request_limit: u32,
    /// Per-request timeout at the orchestration boundary
    request_timeout: Duration,
}

impl InsightServer {
    /// Build the server and all its collaborators from configuration
    pub async fn new(config: Config) -> InsightResult<Self> {
        let cache = Cache::from_config(&config.cache).await?;
        let admission_limiter = Arc::new(
            RateLimiter::new(
                Duration::from_secs(config.limiter.window_secs),
                Duration::from_secs(config.limiter.block_secs),
            )
            .with_fail_open(config.limiter.fail_open),
        );

        let pipeline = Arc::new(TriagePipeline::new(
            cache,
            admission_limiter,
            Arc::new(YouTubeClient::new(config.source.api_key.clone())),
            Arc::new(KeywordClassifier),
            config.source.classify_batch_size,
        ));

        let state = AppState {
            pipeline,
            request_limiter: Arc::new(RateLimiter::new(
                Duration::from_secs(60),
                Duration::from_secs(60),
            )),
            request_limit: config.server.rate_limit_per_minute,
            request_timeout: Duration::from_millis(config.server.request_timeout_ms),
        };

        Ok(Self {
            app: build_router(state),
            config,
        })
    }

    /// Serve until the process is stopped
    pub async fn run(self) -> InsightResult<()> {
        let addr = format!("{}:{}", self.config.server.host, self.config.server.port);
        info!("Listening on {}", addr);
        let listener = TcpListener::bind(&addr).await?;
        axum::serve(
            listener,
            self.app
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
            .map_err(|e| InsightError::Internal(format!("server error: {}", e)))
    }
}

/// Assemble the route table over the given state
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/channel_info", get(channel_info))
        .route("/multi_video_trend", get(multi_video_trend))
        .route("/video_analysis", get(video_analysis))
        .route("/most_liked", get(most_liked))
        .route("/comment_trend", get(comment_trend))
        .layer(cors)
        .with_state(state)
}

/// Query parameters for channel-scoped routes
#[derive(Debug, Deserialize)]
struct ChannelQuery {
    channel_name: String,
    #[serde(default)]
    is_premium: bool,
}

/// Query parameters for video-scoped routes
#[derive(Debug, Deserialize)]
struct VideoQuery {
    video_id: String,
    #[serde(default)]
    is_premium: bool,
    batch_size: Option<usize>,
}

/// Client identity for admission control: forwarded header when present
/// (proxied deployments), otherwise the peer address, so direct clients
/// never collapse into one shared bucket
fn client_identity(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    for header in ["x-forwarded-for", "x-real-ip"] {
        if let Some(value) = headers.get(header).and_then(|v| v.to_str().ok()) {
            if let Some(first) = value.split(',').next() {
                let trimmed = first.trim();
                if !trimmed.is_empty() {
                    return trimmed.to_string();
                }
            }
        }
    }
    match peer {
        Some(addr) => addr.ip().to_string(),
        None => "anonymous".to_string(),
    }
}

/// Shared preamble and timeout wrapper for every route
async fn guarded<T, Fut>(state: &AppState, identity: &str, op: Fut) -> Result<Json<T>, ApiError>
where
    Fut: Future<Output = InsightResult<T>>,
{
    match state.request_limiter.admit(identity, state.request_limit) {
        Admission::Denied { retry_after } => {
            warn!("Request throttled for identity {}", identity);
            return Err(ApiError(InsightError::RateLimitExceeded { retry_after }));
        }
        Admission::Allowed => {}
    }

    match timeout(state.request_timeout, op).await {
        Ok(Ok(result)) => Ok(Json(result)),
        Ok(Err(e)) => Err(ApiError(e)),
        Err(_) => Err(ApiError(InsightError::Timeout)),
    }
}

async fn channel_info(
    State(state): State<AppState>,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
    Query(query): Query<ChannelQuery>,
) -> Response {
    let identity = client_identity(&headers, peer.map(|ConnectInfo(addr)| addr));
    let tier = Tier::from_premium_flag(query.is_premium);
    let result = guarded(
        &state,
        &identity,
        state
            .pipeline
            .channel_summary(&identity, &query.channel_name, tier),
    )
    .await;
    result.into_response()
}

async fn multi_video_trend(
    State(state): State<AppState>,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
    Query(query): Query<ChannelQuery>,
) -> Response {
    let identity = client_identity(&headers, peer.map(|ConnectInfo(addr)| addr));
    let tier = Tier::from_premium_flag(query.is_premium);
    let result = guarded(
        &state,
        &identity,
        state
            .pipeline
            .multi_video_trend(&identity, &query.channel_name, tier),
    )
    .await;
    result.into_response()
}

async fn video_analysis(
    State(state): State<AppState>,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
    Query(query): Query<VideoQuery>,
) -> Response {
    let identity = client_identity(&headers, peer.map(|ConnectInfo(addr)| addr));
    let tier = Tier::from_premium_flag(query.is_premium);
    let result = guarded(
        &state,
        &identity,
        state
            .pipeline
            .video_analysis(&identity, &query.video_id, tier, query.batch_size),
    )
    .await;
    result.into_response()
}

async fn most_liked(
    State(state): State<AppState>,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
    Query(query): Query<VideoQuery>,
) -> Response {
    let identity = client_identity(&headers, peer.map(|ConnectInfo(addr)| addr));
    let tier = Tier::from_premium_flag(query.is_premium);
    let result = guarded(
        &state,
        &identity,
        state.pipeline.most_liked(&identity, &query.video_id, tier),
    )
    .await;
    result.into_response()
}

async fn comment_trend(
    State(state): State<AppState>,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
    Query(query): Query<VideoQuery>,
) -> Response {
    let identity = client_identity(&headers, peer.map(|ConnectInfo(addr)| addr));
    let tier = Tier::from_premium_flag(query.is_premium);
    let result = guarded(
        &state,
        &identity,
        state
            .pipeline
            .comment_trend(&identity, &query.video_id, tier),
    )
    .await;
    result.into_response()
}

/// Newtype mapping service errors to HTTP responses
struct ApiError(InsightError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut body = json!({ "error": self.0.to_string() });
        if let InsightError::RateLimitExceeded { retry_after } = &self.0 {
            body["retry_after"] = json!(retry_after);
        }
        (status, Json(body)).into_response()
    }
}
