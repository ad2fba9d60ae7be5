use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use account_backend::{
    AppState,
    cache::RedisUserCache,
    config::Config,
    middleware::{auth_middleware, log_errors},
    repository::UserRepository,
    routes,
    service::AccountService,
    sms::NoopCodeVerifier,
    store::PgUserStore,
    token::TokenIssuer,
};
use axum::{
    Router,
    routing::{get, post},
};
use sqlx::Executor;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env().expect("Failed to load configuration");

    // 设置数据库连接池
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute("SET application_name = 'account_backend';")
                    .await?;
                Ok(())
            })
        })
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to Postgres");

    // 设置 Redis 客户端
    let redis_client =
        redis::Client::open(config.redis_url.clone()).expect("Failed to create Redis client");

    // 组装仓储和服务：dao -> cache -> repository -> service
    let store = Arc::new(PgUserStore::new(pool));
    let cache = Arc::new(RedisUserCache::new(Arc::new(redis_client)));
    let repo = UserRepository::new(store, cache, config.cache_ttl(), config.call_timeout());
    let service = Arc::new(AccountService::new(repo));
    let issuer = Arc::new(TokenIssuer::new(&config.jwt_secret, config.jwt_expiration()));

    let state = AppState {
        service,
        issuer,
        verifier: Arc::new(NoopCodeVerifier),
        config: config.clone(),
    };

    // 将路由分为公开路由和受保护路由
    let public_routes = Router::new()
        .route("/users/signup", post(routes::user::signup))
        .route("/users/login", post(routes::user::login))
        .route("/users/login_sms/code/send", post(routes::user::send_sms_code))
        .route("/users/login_sms", post(routes::user::login_sms));

    let protected_routes = Router::new()
        .route("/users/edit", post(routes::user::edit))
        .route("/users/profile", get(routes::user::profile))
        // 应用认证中间件
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(axum::middleware::from_fn(log_errors));

    // 根据编译模式决定是否添加CORS
    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding CORS layer for development mode");
        router.layer(tower_http::cors::CorsLayer::permissive())
    };

    let app = router.with_state(state.clone());

    // 启动服务器
    let addr = SocketAddr::new(
        state.config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        state.config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}
