//! Tenant Ledger server binary.

use std::net::SocketAddr;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tenant_ledger::adapters::auth::{JwksSessionValidator, OidcConfig, SharedSecretValidator};
use tenant_ledger::adapters::events::RealtimeHub;
use tenant_ledger::adapters::http::{self, AppState, WebhookVerifiers};
use tenant_ledger::adapters::identity::{HttpIdentityMirror, IdentityMirrorConfig, NoopIdentityMirror};
use tenant_ledger::adapters::postgres;
use tenant_ledger::adapters::rate_limiter::{InMemoryRateLimiter, RedisRateLimiter};
use tenant_ledger::config::AppConfig;
use tenant_ledger::domain::payment::{RevenueMonsterVerifier, StripeWebhookVerifier};
use tenant_ledger::ports::{IdentityProviderMirror, RateLimiter, SessionValidator};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate()?;

    info!(
        environment = ?config.server.environment,
        "Starting tenant-ledger v{}",
        env!("CARGO_PKG_VERSION")
    );

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;
    info!("Connected to database");

    if config.database.run_migrations {
        postgres::MIGRATOR.run(&pool).await?;
        info!("Migrations applied");
    }

    let validator: Arc<dyn SessionValidator> = match config.auth.shared_secret() {
        Some(secret) => {
            warn!("Using shared-secret token validation; not for production");
            Arc::new(SharedSecretValidator::new(
                secret,
                config.auth.issuer.clone(),
                config.auth.audience.clone(),
            ))
        }
        None => Arc::new(JwksSessionValidator::new(
            OidcConfig::new(config.auth.issuer.clone(), config.auth.audience.clone())
                .with_cache_duration(config.auth.jwks_cache_ttl()),
        )?),
    };

    let mirror: Arc<dyn IdentityProviderMirror> = match config.identity_mirror.endpoint() {
        Some((url, token)) => Arc::new(HttpIdentityMirror::new(
            IdentityMirrorConfig::new(url, token).with_timeout(config.identity_mirror.timeout()),
        )?),
        None => {
            info!("Identity provider mirror disabled; roles are stored locally only");
            Arc::new(NoopIdentityMirror)
        }
    };

    let rate_limiter: Option<Arc<dyn RateLimiter>> = if !config.rate_limit.enabled {
        None
    } else if let Some(url) = config.redis.url() {
        Some(Arc::new(RedisRateLimiter::connect(url, config.rate_limit.policy()).await?))
    } else {
        Some(Arc::new(InMemoryRateLimiter::new(config.rate_limit.policy())))
    };

    let hub = Arc::new(RealtimeHub::default());
    let state = AppState::new(
        postgres::repositories(pool),
        validator,
        hub.clone(),
        hub,
        mirror,
        webhook_verifiers(&config)?,
    );

    let app = http::router(state, rate_limiter, &config.server);
    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    let registry = tracing_subscriber::registry().with(filter);
    if config.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn webhook_verifiers(config: &AppConfig) -> Result<WebhookVerifiers, BoxError> {
    let stripe = config.payment.stripe_secret().map(|secret| {
        StripeWebhookVerifier::new(secret).with_tolerance(config.payment.webhook_tolerance_secs)
    });
    let revenue_monster = match config.payment.revenue_monster() {
        Some((key, notify_url)) => Some(RevenueMonsterVerifier::from_pem(key, notify_url)?),
        None => None,
    };
    if stripe.is_none() {
        warn!("Stripe webhook secret not set; Stripe webhooks will be rejected");
    }
    Ok(WebhookVerifiers {
        stripe,
        revenue_monster,
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => warn!(error = %e, "Failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
