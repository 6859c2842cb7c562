use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::{info, warn};
use types::clock::now_ms;

use auction_engine::config::EngineConfig;
use auction_engine::finalizer::Finalizer;
use auction_engine::hub::AuctionHub;
use auction_engine::notify::LogNotifier;
use auction_engine::router::{create_router, AppState};
use auction_engine::store::{DocumentStore, InMemoryStore};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting auction engine service");

    let config = EngineConfig::default();
    // The in-memory store stands in for the document database in
    // local runs; production wiring swaps in the real backend.
    let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStore::new());
    let notifier = Arc::new(LogNotifier);

    let hub = Arc::new(AuctionHub::new(
        store.clone(),
        notifier.clone(),
        config.clone(),
    ));
    let finalizer = Arc::new(Finalizer::new(
        store.clone(),
        notifier,
        hub.clone(),
        config.clone(),
    ));

    tokio::spawn(sweep_loop(finalizer.clone(), config.sweep_interval_secs));
    tokio::spawn(ending_soon_loop(store.clone(), hub.clone(), config.clone()));

    let state = AppState {
        hub,
        finalizer,
        store,
    };
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], 8080));
    let listener = TcpListener::bind(addr).await?;

    info!("Listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Periodic finalizer trigger.
async fn sweep_loop(finalizer: Arc<Finalizer>, interval_secs: u64) {
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
    loop {
        ticker.tick().await;
        let summary = finalizer.sweep(now_ms()).await;
        if !summary.success {
            warn!(error = ?summary.error, "sweep failed");
        } else if summary.processed > 0 {
            info!(processed = summary.processed, "sweep completed");
        }
    }
}

/// Advisory ending-soon pass, on its own cadence independent of the
/// finalizer sweep.
async fn ending_soon_loop(
    store: Arc<dyn DocumentStore>,
    hub: Arc<AuctionHub>,
    config: EngineConfig,
) {
    let mut ticker = tokio::time::interval(Duration::from_secs(60));
    loop {
        ticker.tick().await;
        let now = now_ms();
        let horizon = now + i64::from(config.ending_soon_minutes) * 60_000;
        // Overdue-at-horizon minus overdue-now = ending within the window
        match store
            .overdue_auctions(horizon, config.finalize_batch_size)
            .await
        {
            Ok(auctions) => {
                for auction in auctions.iter().filter(|a| a.bid_end_time_ms > now) {
                    let minutes = (auction.remaining_ms(now) + 59_999) / 60_000;
                    hub.broadcast_ending_soon(auction.id, minutes as u32);
                }
            }
            Err(e) => warn!(error = %e, "ending-soon query failed"),
        }
    }
}
