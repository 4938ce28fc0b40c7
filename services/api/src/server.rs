use crate::cli::ServeArgs;
use crate::gemini::GeminiGenerator;
use crate::infra::{AppState, InMemoryDomainStore, InMemoryPolicyStore};
use crate::routes::with_policy_routes;
use axum::http::{header, Method};
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use policyscope::config::AppConfig;
use policyscope::error::AppError;
use policyscope::policies::{
    CannedAnalyzer, GenerativeAnalyzer, HttpContentFetcher, PolicyAnalyzer, PolicyService,
};
use policyscope::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let fetcher = Arc::new(HttpContentFetcher::new(&config.fetch)?);

    if let Some(api_key) = config.llm.api_key.clone() {
        let generator = GeminiGenerator::new(api_key, &config.llm)?;
        let analyzer = Arc::new(GenerativeAnalyzer::new(
            generator,
            config.llm.model.clone(),
            config.llm.prompt.clone(),
        ));
        serve(config, fetcher, analyzer).await
    } else {
        warn!("LLM_API_KEY is not set, falling back to the canned analyzer");
        serve(config, fetcher, Arc::new(CannedAnalyzer)).await
    }
}

async fn serve<A>(
    config: AppConfig,
    fetcher: Arc<HttpContentFetcher>,
    analyzer: Arc<A>,
) -> Result<(), AppError>
where
    A: PolicyAnalyzer + 'static,
{
    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let domains = Arc::new(InMemoryDomainStore::default());
    let policies = Arc::new(InMemoryPolicyStore::default());
    let service = Arc::new(PolicyService::new(domains, policies, fetcher, analyzer));

    // The extension client runs cross-origin, so preflight must pass on the
    // state-changing routes.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let app = with_policy_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer)
        .layer(cors);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "policy analysis service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
