use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

pub fn create_logging_layer(
) -> TraceLayer<tower_http::classify::SharedClassifier<tower_http::classify::ServerErrorsAsFailures>>
{
    TraceLayer::new_for_http()
        .make_span_with(tower_http::trace::DefaultMakeSpan::new().level(Level::DEBUG))
        .on_response(tower_http::trace::DefaultOnResponse::new().level(Level::DEBUG))
}

/// Logs each request and its outcome under a per-request correlation id.
pub async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let correlation_id = Uuid::new_v4().to_string();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start_time = Instant::now();

    let user_agent = request
        .headers()
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    tracing::debug!(
        correlation_id = %correlation_id,
        method = %method,
        uri = %uri,
        user_agent = %user_agent,
        "incoming request"
    );

    let response = next.run(request).await;
    let status = response.status();
    let duration_ms = start_time.elapsed().as_millis();

    if status.is_server_error() {
        tracing::warn!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = duration_ms,
            "request failed"
        );
    } else {
        tracing::debug!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = duration_ms,
            "request completed"
        );
    }

    response
}

/// Maps a configured level name to a tracing level, falling back to INFO.
pub fn parse_log_level(log_level: &str) -> Level {
    match log_level.to_uppercase().as_str() {
        "TRACE" => Level::TRACE,
        "DEBUG" => Level::DEBUG,
        "INFO" => Level::INFO,
        "WARN" | "WARNING" => Level::WARN,
        "ERROR" => Level::ERROR,
        _ => {
            eprintln!("Invalid log level '{}', defaulting to INFO", log_level);
            Level::INFO
        }
    }
}

pub fn init_logging(log_level: &str, log_format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let level = parse_log_level(log_level);

    // The configured level wins over RUST_LOG
    let filter_string = format!("forensics_backend={},tower_http=info,sqlx=warn", level);
    let env_filter = tracing_subscriber::EnvFilter::try_new(filter_string)?;

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if log_format.eq_ignore_ascii_case("plain") || log_format.eq_ignore_ascii_case("text") {
        let plain_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(true);
        subscriber.with(plain_layer).try_init()?;
    } else {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_thread_ids(true);
        subscriber.with(json_layer).try_init()?;
    }

    tracing::info!(
        log_level = %log_level,
        log_format = %log_format,
        "logging initialized"
    );

    Ok(())
}
