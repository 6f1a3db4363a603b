//! AI Registry - a catalog and registry service for AI modules

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use airegistry::{
    api::{self, AppState},
    cache::create_cache,
    config::Config,
    db::{
        self,
        repositories::{
            RevokedTokenRepository, SqlxAnalyticsRepository, SqlxAuditRepository,
            SqlxCountryRepository, SqlxFileRepository, SqlxModuleRepository,
            SqlxPublicationRepository, SqlxRevokedTokenRepository, SqlxTagRepository,
            SqlxUserRepository,
        },
    },
    services::{
        AnalyticsService, AuditService, AuthService, EmailService, FileService, ModuleService,
        PublicationService, TagService, UserService,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "airegistry=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting AI Registry...");

    // Load configuration
    let config = Arc::new(Config::load(Path::new("config.toml"))?);
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {}", config.database.url);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Initialize cache
    let cache = create_cache(&config.cache);
    tracing::info!("Cache initialized");

    // Create repositories
    let user_repo = SqlxUserRepository::boxed(pool.clone());
    let token_repo = SqlxRevokedTokenRepository::boxed(pool.clone());
    let module_repo = SqlxModuleRepository::boxed(pool.clone());
    let tag_repo = SqlxTagRepository::boxed(pool.clone());
    let publication_repo = SqlxPublicationRepository::boxed(pool.clone());
    let file_repo = SqlxFileRepository::boxed(pool.clone());
    let audit_repo = SqlxAuditRepository::boxed(pool.clone());
    let analytics_repo = SqlxAnalyticsRepository::boxed(pool.clone());
    let country_repo = SqlxCountryRepository::boxed(pool.clone());

    // Initialize services
    let audit_service = Arc::new(AuditService::new(audit_repo));
    let email_service = Arc::new(EmailService::new(config.email.clone()));
    let auth_service = Arc::new(AuthService::new(
        user_repo.clone(),
        token_repo.clone(),
        config.auth.clone(),
    ));
    let tag_service = Arc::new(TagService::new(tag_repo, cache.clone()));
    let file_service = Arc::new(FileService::new(
        file_repo,
        audit_service.clone(),
        config.upload.dir.clone(),
        config.upload.max_size_bytes,
    ));
    let publication_service = Arc::new(PublicationService::new(publication_repo.clone()));
    let user_service = Arc::new(UserService::new(
        user_repo.clone(),
        publication_repo.clone(),
        audit_service.clone(),
        email_service.clone(),
    ));
    let module_service = Arc::new(ModuleService::new(
        module_repo,
        publication_repo,
        user_repo,
        tag_service.clone(),
        file_service.clone(),
        audit_service.clone(),
        email_service,
        cache.clone(),
    ));
    let analytics_service = Arc::new(AnalyticsService::new(analytics_repo, cache));

    // Periodically drop expired entries from the token blacklist
    {
        let tokens = token_repo;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(3600));
            loop {
                interval.tick().await;
                match tokens.purge_expired().await {
                    Ok(0) => {}
                    Ok(n) => tracing::debug!("Purged {} expired revoked tokens", n),
                    Err(e) => tracing::warn!("Token blacklist purge failed: {}", e),
                }
            }
        });
    }

    // Build application state
    let state = AppState {
        pool: pool.clone(),
        config: config.clone(),
        auth_service,
        user_service,
        module_service,
        tag_service,
        publication_service,
        file_service,
        analytics_service,
        audit_service,
        country_repo,
    };

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
