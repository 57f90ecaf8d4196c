use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use card_service::config::Config;
use card_service::middleware::{RateLimiters, RequestMetrics};
use card_service::routes;
use card_service::security::TokenKeys;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,card_service=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            std::process::exit(1);
        }
    };

    info!(
        env = %config.app.env,
        host = %config.app.host,
        port = config.app.port,
        "starting card-service"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;

    sqlx::migrate!().run(&pool).await?;
    info!("database migrations applied");

    let keys = Arc::new(TokenKeys::new(
        &config.auth.jwt_secret,
        config.auth.token_ttl_hours,
    ));
    let limiters = RateLimiters::new(&config.rate_limit);

    let bind_addr = (config.app.host.clone(), config.app.port);
    let cors_origins = config.cors.allowed_origins.clone();

    let server = HttpServer::new(move || {
        let mut cors = Cors::default()
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
            .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE])
            .max_age(3600);
        if cors_origins == "*" {
            cors = cors.allow_any_origin();
        } else {
            for origin in cors_origins.split(',') {
                let origin = origin.trim();
                if !origin.is_empty() {
                    cors = cors.allowed_origin(origin);
                }
            }
        }

        let pool = pool.clone();
        let keys = keys.clone();
        let limiters = limiters.clone();

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(TracingLogger::default())
            .wrap(RequestMetrics)
            .configure(move |cfg| routes::configure(cfg, pool, keys, limiters))
    })
    .bind(bind_addr)?
    .run();

    let handle = server.handle();
    let mut server_task = tokio::spawn(server);

    tokio::select! {
        result = &mut server_task => {
            result.map_err(|e| anyhow::anyhow!("server task failed: {e}"))??;
        }
        _ = shutdown_signal() => {
            info!("shutdown signal received, draining connections");
            handle.stop(true).await;
            let _ = server_task.await;
        }
    }

    info!("card-service stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
