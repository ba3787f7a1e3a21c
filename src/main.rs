use phone_secure::{Config, Result};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "phone_secure=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| phone_secure::AppError::Config(e.to_string()))?;

    tracing::info!("Starting phone-secure with data dir {:?}", config.data_dir);

    // Open the durable key-value store
    let kv = Arc::new(phone_secure::store::FileKvStore::open(config.data_dir.clone()).await?);

    // Initialize stores
    let users = Arc::new(phone_secure::store::UserStore::new(kv.clone()).await);
    let events = Arc::new(phone_secure::store::EventStore::new(kv.clone()).await);
    let locations = Arc::new(phone_secure::store::LocationStore::new(kv.clone()).await);

    tracing::info!("Stores loaded");

    // Platform collaborators. The stubs log instead of touching real
    // hardware; a device build swaps these for real providers.
    let camera = Arc::new(phone_secure::providers::stub::StubCamera);
    let notifier = Arc::new(phone_secure::providers::stub::LogNotifier);
    let lock = Arc::new(phone_secure::providers::stub::StubDeviceLock);
    let device_status = Arc::new(phone_secure::providers::stub::StubDeviceStatus);
    let sensors = Arc::new(phone_secure::providers::stub::StubSensorHub);
    let location_source = Arc::new(phone_secure::providers::stub::StubLocationSource);

    // Initialize services
    let tracker = Arc::new(phone_secure::services::LocationTracker::new(
        location_source,
        locations,
        config.location_interval,
        config.location_fastest,
    ));

    let responder = Arc::new(phone_secure::services::Responder::new(
        users.clone(),
        events.clone(),
        tracker.clone(),
        camera,
        notifier,
        lock,
        device_status.clone(),
    ));

    let _sim_change = phone_secure::services::SimChangeService::new(users.clone(), responder.clone());
    let _location_tracking = phone_secure::services::LocationTrackingService::new(
        users.clone(),
        events.clone(),
        tracker.clone(),
    );
    let _intruder = phone_secure::services::IntruderService::new(
        users.clone(),
        events.clone(),
        tracker.clone(),
        device_status,
    );
    let _panic = phone_secure::services::PanicService::new(users.clone(), responder.clone());
    let _fake_shutdown = phone_secure::services::FakeShutdownService::new(users.clone(), events);

    // Start the anti-theft monitor
    let monitor = Arc::new(phone_secure::AntiTheftMonitor::new(users, responder, sensors));
    let state = monitor.start().await;
    tracing::info!("Anti-theft monitor state: {:?}", state);

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| phone_secure::AppError::Internal(e.to_string()))?;

    tracing::info!("Shutting down");
    monitor.stop().await;
    tracker.stop_tracking().await;

    Ok(())
}
