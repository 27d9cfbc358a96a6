//! Vadi Commerce - self-hosted storefront service

use std::sync::Arc;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vadi_commerce::api::{self, AppState};
use vadi_commerce::config::AppConfig;
use vadi_commerce::messaging::EventPublisher;
use vadi_commerce::notify::{NatsNotifier, NoopNotifier, Notifier};
use vadi_commerce::service::{CartService, CatalogService, CheckoutService, OrderService};
use vadi_commerce::store::PgStore;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let db = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&db).await?;

    let nats = match &config.nats_url {
        Some(url) => match async_nats::connect(url.as_str()).await {
            Ok(client) => Some(client),
            Err(err) => {
                tracing::warn!(error = %err, "NATS unavailable, events and emails disabled");
                None
            }
        },
        None => None,
    };
    let events = EventPublisher::new(nats.clone());
    let notifier: Arc<dyn Notifier> = match nats {
        Some(client) => Arc::new(NatsNotifier::new(client)),
        None => Arc::new(NoopNotifier),
    };

    let store = Arc::new(PgStore::new(db));
    let orders = OrderService::new(store.clone(), notifier, events.clone());
    let catalog = CatalogService::new(store.clone(), store.clone(), events.clone());
    let carts = CartService::new(store.clone(), store.clone());
    let checkout = CheckoutService::new(carts.clone(), store.clone(), orders.clone());
    let state = AppState {
        orders,
        catalog,
        carts,
        checkout,
    };

    let app = api::router(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    tracing::info!("🚀 vadi-commerce listening on 0.0.0.0:{}", config.port);
    axum::serve(listener, app).await?;
    Ok(())
}
