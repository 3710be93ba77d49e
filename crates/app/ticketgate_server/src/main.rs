//! Ticketgate auth API server binary.
//!
//! Reads `ApiConfig` from the environment (and `.env`), lets CLI flags
//! override the listener and database, then wires the cache, mail and SMS
//! backends into the router.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use ticketgate_api::AppState;
use ticketgate_api::config::ApiConfig;
use ticketgate_core::auth::jwt::TokenService;
use ticketgate_core::auth::secrets::EnvSecrets;
use ticketgate_core::auth::session::AuthService;
use ticketgate_core::cache::{MemoryCache, RedisCache, SessionCache};
use ticketgate_core::otp::{EmailOtpService, HttpMailer, LogMailer, Mailer, PhoneOtpClient};
use ticketgate_core::store::{ActorStores, PgActorStore};

/// How often the in-process cache evicts expired entries.
const CACHE_SWEEP_EVERY: Duration = Duration::from_secs(60);

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "ticketgate_server", about = "Ticketgate auth API server")]
struct Args {
    /// Address to listen on. Overrides `BIND_ADDR`.
    #[arg(long)]
    bind: Option<String>,

    /// PostgreSQL connection URL. Overrides `DATABASE_URL`.
    #[arg(long)]
    database_url: Option<String>,

    /// Maximum number of database connections in the pool.
    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = 10)]
    max_connections: u32,

    /// Per-command Redis timeout in milliseconds.
    #[arg(long, env = "REDIS_TIMEOUT_MS", default_value_t = 2000)]
    cache_timeout_ms: u64,

    /// Skip embedded migrations on startup.
    #[arg(long, default_value_t = false)]
    skip_migrations: bool,
}

/// The session cache, plus the sweeper task when the cache is in-process.
struct CacheBackend {
    cache: Arc<dyn SessionCache>,
    sweeper: Option<JoinHandle<()>>,
}

async fn session_cache(
    config: &ApiConfig,
    op_timeout: Duration,
) -> Result<CacheBackend, Box<dyn std::error::Error>> {
    match &config.redis_url {
        Some(url) => {
            info!(timeout_ms = op_timeout.as_millis() as u64, "using redis session cache");
            let cache = RedisCache::connect(url).await?.with_op_timeout(op_timeout);
            Ok(CacheBackend {
                cache: Arc::new(cache),
                sweeper: None,
            })
        }
        None => {
            warn!("REDIS_URL not set; sessions live in process memory");
            let cache = Arc::new(MemoryCache::new());
            let sweeper = cache.spawn_cleanup_task(CACHE_SWEEP_EVERY);
            Ok(CacheBackend {
                cache,
                sweeper: Some(sweeper),
            })
        }
    }
}

fn mailer(config: &ApiConfig) -> Arc<dyn Mailer> {
    match &config.mail {
        Some(mail) => Arc::new(HttpMailer::new(&mail.url, mail.api_key.clone(), &mail.from)),
        None => {
            warn!("MAIL_API_URL not set; OTP mails are logged, not sent");
            Arc::new(LogMailer)
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("info,ticketgate_api=debug,ticketgate_core=debug")
            }),
        )
        .init();

    let args = Args::parse();
    let mut config = ApiConfig::from_env();
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(url) = args.database_url {
        config.pg_connection_url = url;
    }

    info!(
        bind_addr = %config.bind_addr,
        max_connections = args.max_connections,
        "starting ticketgate_server"
    );

    let pool = PgPoolOptions::new()
        .max_connections(args.max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.pg_connection_url)
        .await?;

    if args.skip_migrations {
        info!("skipping database migrations");
    } else {
        info!("running database migrations");
        ticketgate_core::migrate::migrate(&pool).await?;
    }

    let CacheBackend { cache, sweeper } =
        session_cache(&config, Duration::from_millis(args.cache_timeout_ms)).await?;
    let stores = ActorStores::new(
        Arc::new(PgActorStore::users(pool.clone())),
        Arc::new(PgActorStore::organizers(pool)),
    );
    let tokens = TokenService::new(Arc::new(EnvSecrets), cache.clone());

    let phone_otp = config.phone_otp.clone().map(PhoneOtpClient::new);
    if phone_otp.is_none() {
        warn!("SMS_OTP_URL not set; phone OTP routes answer 503");
    }

    let state = AppState {
        auth: AuthService::new(tokens, stores),
        email_otp: EmailOtpService::new(cache, mailer(&config)),
        phone_otp,
    };

    let app = ticketgate_api::router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(redis_url: Option<String>) -> ApiConfig {
        ApiConfig {
            bind_addr: "127.0.0.1:0".into(),
            pg_connection_url: "postgres://localhost/unused".into(),
            redis_url,
            mail: None,
            phone_otp: None,
        }
    }

    #[tokio::test]
    async fn in_process_cache_keeps_its_sweeper_handle() {
        let backend = session_cache(&config(None), Duration::from_secs(1))
            .await
            .unwrap();
        let sweeper = backend.sweeper.expect("sweeper handle");
        assert!(!sweeper.is_finished());

        sweeper.abort();
        assert!(sweeper.await.unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn bad_redis_url_fails_startup() {
        let result = session_cache(&config(Some("not a url".into())), Duration::from_secs(1)).await;
        assert!(result.is_err());
    }
}
