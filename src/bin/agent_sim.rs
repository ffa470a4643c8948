//! Headless delivery agent: logs in, starts the first open order, drives
//! along a simulated path while relaying its position, then completes it.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use agent_tracker::client::{
    ApiClient, DirectionsClient, RouteProvider, UnconfiguredRouteProvider, WsTransport,
};
use agent_tracker::config::ClientConfig;
use agent_tracker::error::ClientError;
use agent_tracker::geo::RouteCoordinate;
use agent_tracker::models::order::{Order, OrderStatus};
use agent_tracker::navigation::{NavState, NavigationController, NavigationDeps};
use agent_tracker::platform::{interpolate_path, Capabilities, SimulatedPositionSource};
use tracing_subscriber::EnvFilter;

const SIM_CADENCE: Duration = Duration::from_secs(1);
const STEPS_PER_LEG: usize = 30;

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    let config = ClientConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    if let Err(err) = run(&config).await {
        tracing::error!(error = %err, alert = %err.user_message(), "agent simulation failed");
        return Err(err);
    }
    Ok(())
}

async fn run(config: &ClientConfig) -> Result<(), ClientError> {
    let username = env::var("AGENT_USERNAME").unwrap_or_else(|_| "agent1".to_string());
    let password = env::var("AGENT_PASSWORD").unwrap_or_else(|_| "password123".to_string());

    let api = ApiClient::new(config.api_base_url.clone());
    let session = api.login(&username, &password).await?;

    let orders = api.list_assigned(&session).await?;
    tracing::info!(count = orders.len(), "assigned orders");

    let order = pick_order(orders)
        .ok_or_else(|| ClientError::NotFound("no open orders assigned".to_string()))?;

    if order.status == OrderStatus::Pending {
        let message = api.start_order(&session, &order.id).await?;
        tracing::info!(order_id = %order.id, message = %message, "order started");
    }
    let order = api.get_order(&session, &order.id).await?;

    let pickup = RouteCoordinate::from(&order.pickup_location);
    let delivery = RouteCoordinate::from(&order.delivery_location);
    let start = RouteCoordinate::new(pickup.latitude - 0.01, pickup.longitude - 0.01);
    let path = interpolate_path(&[start, pickup, delivery], STEPS_PER_LEG);
    let drive_time = SIM_CADENCE * path.len() as u32;

    let position = Arc::new(SimulatedPositionSource::new(path, SIM_CADENCE).with_speed(12.0));
    let capabilities = Capabilities::detect(position);

    let routes: Arc<dyn RouteProvider> = match &config.directions_api_key {
        Some(key) => Arc::new(DirectionsClient::new(config.directions_url.clone(), key.clone())),
        None => Arc::new(UnconfiguredRouteProvider),
    };

    let mut controller = NavigationController::new(
        &session,
        order.clone(),
        config.emitter(),
        NavigationDeps {
            position: capabilities.position,
            transport: Arc::new(WsTransport::new(config.ws_url.clone())),
            routes,
            renderer: capabilities.renderer,
        },
    );

    let state = controller.mount().await.clone();
    if let NavState::Error { message } = state {
        controller.unmount().await;
        tracing::error!(alert = %message, "navigation unavailable");
        return Ok(());
    }

    let mut ticker = tokio::time::interval(SIM_CADENCE * 5);
    let deadline = tokio::time::sleep(drive_time);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted");
                break;
            }
            _ = ticker.tick() => {
                controller.recenter();
                let view = controller.view();
                tracing::info!(
                    position = ?controller.current_position(),
                    distance = %view.distance_text,
                    duration = %view.duration_text,
                    "navigating"
                );
            }
        }
    }

    controller.unmount().await;

    let message = api.complete_order(&session, &order.id).await?;
    tracing::info!(order_id = %order.id, message = %message, "order completed");

    let track = api.order_locations(&session, &order.id).await?;
    tracing::info!(order_id = %order.id, samples = track.len(), "relayed track stored");

    session.logout();
    Ok(())
}

fn pick_order(orders: Vec<Order>) -> Option<Order> {
    orders
        .iter()
        .find(|order| order.status == OrderStatus::InProgress)
        .or_else(|| orders.iter().find(|order| order.status == OrderStatus::Pending))
        .cloned()
}
