use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use tandem_match::config::{LoggingSettings, Settings};
use tandem_match::core::Matcher;
use tandem_match::routes::{self, matches::AppState};
use tandem_match::services::{
    AccountServiceClient, CacheManager, MatchingService, PostgresClient, ProfileAggregator,
};

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

fn init_logging(logging: &LoggingSettings) {
    // LOG_LEVEL / LOG_FORMAT override the [logging] section; RUST_LOG wins over both
    let logging = logging.with_env_overrides();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    match logging.format.as_str() {
        "pretty" => subscriber.pretty().init(),
        "json" => subscriber.json().init(),
        _ => subscriber.init(),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load();

    let defaults = LoggingSettings::default();
    init_logging(settings.as_ref().map(|s| &s.logging).unwrap_or(&defaults));

    info!("Starting Tandem matching service...");

    let settings = settings.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    info!("Configuration loaded successfully");

    let accounts = AccountServiceClient::new(
        settings.account_service.endpoint.clone(),
        settings.account_service.api_key.clone(),
        settings.account_service.project_id.clone(),
        settings.account_service.timeout_secs,
    )
    .map_err(|e| {
        error!("Failed to create account service client: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;

    info!("Account service client initialized");

    let mut aggregator = ProfileAggregator::new(Arc::new(accounts));

    // Profile cache is optional; Redis only adds a shared second tier
    if settings.cache.enabled {
        let ttl = settings.cache.ttl_secs.unwrap_or(60);
        let l1_size = settings.cache.l1_cache_size.unwrap_or(10_000);

        let cache = match &settings.cache.redis_url {
            Some(url) => match CacheManager::new(url, l1_size, ttl).await {
                Ok(cache) => cache,
                Err(e) => {
                    warn!("Failed to connect to Redis ({}), using in-process cache only", e);
                    CacheManager::local(l1_size, ttl)
                }
            },
            None => CacheManager::local(l1_size, ttl),
        };

        info!(
            "Profile cache initialized (L1: {} entries, TTL: {}s, Redis: {})",
            l1_size,
            ttl,
            cache.has_redis()
        );
        aggregator = aggregator.with_cache(Arc::new(cache));
    }

    let postgres = PostgresClient::from_settings(
        &settings.database.url,
        settings.database.max_connections,
        settings.database.min_connections,
        settings.database.acquire_timeout_secs,
        settings.database.idle_timeout_secs,
    )
    .await
    .map_err(|e| {
        error!("Failed to connect to PostgreSQL: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;

    info!("PostgreSQL client initialized");

    let weights = settings
        .scoring
        .weights
        .to_weights()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;
    let rules = settings.matching.rules();
    let matcher = Matcher::new(weights, rules);

    info!("Matcher initialized with weights: {:?}, rules: {:?}", weights, rules);

    let app_state = AppState {
        matching: MatchingService::new(
            Arc::new(aggregator),
            matcher,
            settings.matching.fetch_concurrency,
        ),
        postgres: Some(Arc::new(postgres)),
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
