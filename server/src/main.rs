use crate::captcha::CaptchaStore;
use crate::cfg::Config;
use crate::cli::{Cli, Command, UserCommand};
use crate::db::{run_migrations, seed_db, DbConnectionPool};
use crate::revocation_redis::RedisRevocationStore;
use crate::state::{State, StateRef};
use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::header::HeaderName;
use axum::http::Request;
use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;
use clap::Parser;
use diesel_async::pooled_connection::bb8::Pool;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::AsyncPgConnection;
use sentinel::limiter::SlidingWindowLimiter;
use sentinel::revocation::{MemoryRevocationStore, RevocationStore};
use sentinel::TokenCodec;
use std::iter::once;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::request_id::MakeRequestUuid;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tower_http::ServiceBuilderExt;
use tracing::{info, span, warn, Level};

//--------------------------------------------------------------------------------------------------

mod captcha;
mod cfg;
mod cli;
mod db;
mod db_models;
mod handler_proxy;
mod handlers;
mod queries;
mod rate_limit;
mod response;
mod revocation_redis;
mod roles;
mod schema;
mod state;
mod types;

//--------------------------------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config
    let cfg: Config = config::Config::builder()
        .add_source(config::File::with_name(&cli.config_file).required(false))
        .add_source(config::File::with_name(&format!("{}.local", cli.config_file)).required(false))
        .add_source(config::Environment::with_prefix("SENTINEL").separator("__"))
        .build()?
        .try_deserialize()?;

    // Initialize tracing
    let mut fmt_sub = tracing_subscriber::fmt();
    if cfg.debug {
        fmt_sub = fmt_sub.with_max_level(Level::DEBUG);
    } else {
        fmt_sub = fmt_sub.with_max_level(Level::INFO);
    }
    fmt_sub.init();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(cfg).await,
        Command::Migrate => run_migrations(cfg.postgres_connection_string).await,
        Command::User { command } => {
            let pool = open_pool(&cfg).await?;
            match command {
                UserCommand::Create {
                    username,
                    role,
                    nickname,
                } => cli::user_create(&pool, username, role, nickname).await,
                UserCommand::List => cli::user_list(&pool).await,
                UserCommand::Remove { username } => cli::user_remove(&pool, username).await,
            }
        }
    }
}

//--------------------------------------------------------------------------------------------------

async fn open_pool(cfg: &Config) -> Result<DbConnectionPool> {
    let db_cfg = AsyncDieselConnectionManager::<AsyncPgConnection>::new(
        cfg.postgres_connection_string.clone(),
    );
    let pool = Pool::builder().build(db_cfg).await?;

    Ok(pool)
}

async fn serve(cfg: Config) -> Result<()> {
    // The signing secret has no safe default; an empty one must stop the process here
    let codec = TokenCodec::new(
        &cfg.jwt.secret,
        time::Duration::hours(cfg.jwt.validity_hours),
        cfg.jwt.issuer.clone(),
    )
    .context("invalid JWT configuration")?;

    // Run the migrations
    run_migrations(cfg.postgres_connection_string.clone()).await?;

    // Open the database pool
    let pool = open_pool(&cfg).await?;

    // Seed the DB
    seed_db(&pool).await?;

    // Revocation backend: Redis when configured, else process-local
    let revocations: Arc<dyn RevocationStore> = match &cfg.redis_url {
        Some(url) => Arc::new(RedisRevocationStore::connect(url).await?),
        None => {
            warn!("No Redis configured - revocations are process-local");
            Arc::new(MemoryRevocationStore::new())
        }
    };

    let limiter = SlidingWindowLimiter::new(
        cfg.rate_limit.limit,
        Duration::from_secs(cfg.rate_limit.window_secs),
    );

    // Create state
    let state: StateRef = Arc::new(State::new(
        pool,
        codec,
        revocations,
        limiter,
        CaptchaStore::new(),
        cfg.upload.clone(),
        cfg.captcha.login,
    ));

    // Setup the API
    let app = Router::new()
        .route("/liveness", get(handler_proxy::liveness))
        .route("/readiness", get(handler_proxy::readiness))
        .route("/v1/users/login", post(handler_proxy::login))
        .route("/v1/users/logout", post(handler_proxy::logout))
        .route("/v1/users/me", get(handler_proxy::current_user))
        .route("/v1/users", get(handler_proxy::list_users))
        .route("/v1/users", post(handler_proxy::create_user))
        .route("/v1/users/:username", delete(handler_proxy::remove_user))
        .route("/v1/images/upload", post(handler_proxy::upload_image))
        .route("/v1/captcha/generate", get(handler_proxy::generate_captcha))
        // Admission starts at the rate limiter, ahead of any token handling
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::rate_limit,
        ))
        .layer(DefaultBodyLimit::max(
            (cfg.upload.max_size_mb as usize + 1) * 1024 * 1024,
        ))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .sensitive_headers(once(HeaderName::from_static("token")))
                .set_x_request_id(MakeRequestUuid)
                .decompression()
                .compression()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(|request: &Request<Body>| {
                            let request_id = request
                                .headers()
                                .get("x-request-id")
                                .and_then(|hv| hv.to_str().ok())
                                .unwrap_or("unknown");
                            span!(
                                Level::INFO,
                                "http_request",
                                request_id,
                                http_request.request_method = request.method().as_str(),
                                http_request.request_url = request.uri().path()
                            )
                        })
                        .on_request(DefaultOnRequest::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .propagate_x_request_id()
                .layer(TimeoutLayer::new(Duration::from_secs(10))),
        );

    // Run the API
    let bind_addr = format!("0.0.0.0:{}", cfg.http_port.unwrap_or(3001));
    info!("Listening on {}", bind_addr);
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

//--------------------------------------------------------------------------------------------------
