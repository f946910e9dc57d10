use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::{middleware::Logger, web, App, HttpServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use z402_gateway::{config::GatewayConfig, routes, state::AppState, store::IntentStore, sweep};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = GatewayConfig::from_env().expect("Failed to load configuration");
    let port = config.port;
    let allowed_origins = config.allowed_origins.clone();
    let rate_limit_rpm = config.rate_limit_rpm;
    let sweep_interval_secs = config.sweep_interval_secs;

    tracing::info!("Starting z402-gateway on port {}", port);
    tracing::info!("Network: {}", config.network.as_str());
    tracing::info!(
        "Protected resource: {} ({} {})",
        routes::resource::PREMIUM_PATH,
        config.resource_price,
        config.resource_currency
    );
    tracing::info!("Webhook endpoint: {}", routes::webhooks::WEBHOOK_PATH);

    let store = IntentStore::open(&config.db_path).expect("Failed to initialize intent store");
    tracing::info!("Intent store initialized at: {}", config.db_path);

    // Expire anything that went overdue while we were down, then keep
    // sweeping in the background.
    sweep::sweep_once(&store);
    sweep::spawn(store.clone(), sweep_interval_secs);

    let state = AppState::new(config, store);
    let state_data = web::Data::new(state);

    let governor_conf = GovernorConfigBuilder::default()
        .requests_per_minute(rate_limit_rpm as u64)
        .finish()
        .expect("Failed to create rate limiter config");

    HttpServer::new(move || {
        let cors = z402_gateway::cors::build_cors(&allowed_origins);

        App::new()
            .app_data(state_data.clone())
            .app_data(web::PayloadConfig::new(64 * 1024)) // webhook bodies are small
            .wrap(Logger::default())
            .wrap(cors)
            .wrap(Governor::new(&governor_conf))
            .configure(routes::health::configure)
            .configure(routes::resource::configure)
            .configure(routes::webhooks::configure)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
