//! Campusbeat - A college community content platform

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use campusbeat::{
    api::{self, AppState},
    cache::create_cache,
    config::Config,
    db::{
        self,
        repositories::{
            SqlxArticleRepository, SqlxCommentRepository, SqlxMediaRepository,
            SqlxProfileRepository, SqlxSessionRepository, SqlxTrafficRepository,
            SqlxUserRepository,
        },
    },
    realtime::{EventBus, PresenceRegistry},
    services::{
        AnalyticsService, ArticleService, CommentService, LoginRateLimiter, MediaService,
        ProfileService, StatsService, UserService,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campusbeat=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Campusbeat...");

    // Load configuration (env vars override the file)
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    pool.ping().await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    // Run migrations
    let pending = db::migrations::pending_count(&pool).await?;
    if pending > 0 {
        tracing::info!(pending, "Applying database migrations");
    }
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Initialize cache
    let cache = create_cache(&config.cache);
    tracing::info!("Cache initialized");

    // Realtime bus and presence tracking
    let bus = Arc::new(EventBus::with_capacity(config.realtime.channel_capacity));
    let presence = Arc::new(PresenceRegistry::new(bus.clone()));

    // Create repositories
    let user_repo = SqlxUserRepository::boxed(pool.clone());
    let session_repo = SqlxSessionRepository::boxed(pool.clone());
    let article_repo = SqlxArticleRepository::boxed(pool.clone());
    let comment_repo = SqlxCommentRepository::boxed(pool.clone());
    let media_repo = SqlxMediaRepository::boxed(pool.clone());
    let profile_repo = SqlxProfileRepository::boxed(pool.clone());
    let traffic_repo = SqlxTrafficRepository::boxed(pool.clone());

    // Initialize services
    let upload_config = Arc::new(config.upload.clone());
    let user_service = Arc::new(UserService::with_session_expiration(
        user_repo.clone(),
        session_repo,
        config.session.expiration_days,
    ));
    let article_service = Arc::new(ArticleService::new(
        article_repo.clone(),
        cache.clone(),
        bus.clone(),
    ));
    let comment_service = Arc::new(CommentService::new(
        comment_repo,
        article_repo.clone(),
        profile_repo.clone(),
    ));
    let media_service = Arc::new(MediaService::new(
        media_repo,
        article_repo.clone(),
        upload_config.clone(),
    ));
    let profile_service = Arc::new(ProfileService::new(profile_repo));
    let analytics_service = Arc::new(AnalyticsService::new(traffic_repo));
    let stats_service = Arc::new(StatsService::new(article_repo, user_repo, cache.clone()));
    let rate_limiter = Arc::new(LoginRateLimiter::new());

    // Build application state
    let state = AppState {
        user_service: user_service.clone(),
        article_service,
        comment_service,
        media_service,
        profile_service,
        analytics_service: analytics_service.clone(),
        stats_service,
        rate_limiter: rate_limiter.clone(),
        bus,
        presence,
        upload_config,
        realtime_config: Arc::new(config.realtime.clone()),
        session_expiration_days: config.session.expiration_days,
    };

    // Background maintenance: expired sessions, rate limiter windows,
    // traffic retention. All are cheap and idempotent.
    {
        let user_service = user_service.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(3600));
            loop {
                interval.tick().await;
                match user_service.cleanup_expired_sessions().await {
                    Ok(removed) if removed > 0 => {
                        tracing::info!("Removed {} expired sessions", removed)
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!("Session cleanup failed: {}", e),
                }
            }
        });
    }
    {
        let limiter = rate_limiter.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(300));
            loop {
                interval.tick().await;
                limiter.cleanup().await;
            }
        });
    }
    {
        let analytics = analytics_service.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(86400));
            loop {
                interval.tick().await;
                match analytics.prune().await {
                    Ok(removed) if removed > 0 => {
                        tracing::info!("Pruned {} old traffic events", removed)
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!("Traffic prune failed: {}", e),
                }
            }
        });
    }

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => tracing::error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutting down");
}
