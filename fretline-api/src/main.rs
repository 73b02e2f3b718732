use fretline_api::{app, state::AppState};
use fretline_catalog::{AvailabilityLedger, CatalogRepository, PriceRepository, PriceResolver};
use fretline_core::AccountDirectory;
use fretline_order::{OrderLifecycleManager, OrderRepository};
use fretline_store::MemoryStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fretline_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = fretline_store::Config::load()?;
    tracing::info!("starting fretline API on port {}", config.server.port);

    let store = Arc::new(MemoryStore::new());
    let ledger = Arc::new(AvailabilityLedger::new());
    let seed = fretline_store::seed::load_demo_catalog(&store, &ledger).await?;
    tracing::info!(dealer_account = %seed.dealer_account_id, "demo dealer account available");

    let resolver = PriceResolver::new(Arc::clone(&store) as Arc<dyn PriceRepository>);
    let manager = Arc::new(OrderLifecycleManager::new(
        Arc::clone(&store) as Arc<dyn OrderRepository>,
        Arc::clone(&store) as Arc<dyn CatalogRepository>,
        resolver.clone(),
        Arc::clone(&ledger),
    ));

    let state = AppState {
        manager,
        resolver,
        ledger,
        accounts: Arc::clone(&store) as Arc<dyn AccountDirectory>,
        default_currency: config.business_rules.default_currency.clone(),
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;
    Ok(())
}
