#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use agent_tracker::client::{RealtimeTransport, RouteProvider, RouteSummary, Session};
use agent_tracker::error::ClientError;
use agent_tracker::geo::RouteCoordinate;
use agent_tracker::models::agent::AgentProfile;
use agent_tracker::models::event::RealtimeEvent;
use agent_tracker::models::order::{CustomerInfo, Location, Order, OrderStatus};
use agent_tracker::navigation::MapView;
use agent_tracker::platform::{MapRenderer, PermissionStatus, PositionFix, PositionSource};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::Instant;

pub const TWO_POINT_ROUTE: &str = "_p~iF~ps|U_ulLnnqC";

pub fn session(agent_id: &str) -> Session {
    Session::new(AgentProfile {
        id: agent_id.to_string(),
        username: "agent1".to_string(),
        name: "John Doe".to_string(),
        phone: "+1234567890".to_string(),
        status: "active".to_string(),
        token: "token".to_string(),
    })
}

pub fn order(id: &str, agent_id: &str) -> Order {
    Order {
        id: id.to_string(),
        order_number: "ORD001".to_string(),
        pickup_location: Location {
            lat: 37.7749,
            lng: -122.4194,
            address: "123 Market St, San Francisco, CA".to_string(),
        },
        delivery_location: Location {
            lat: 37.8044,
            lng: -122.2712,
            address: "456 Broadway, Oakland, CA".to_string(),
        },
        assigned_agent_id: agent_id.to_string(),
        status: OrderStatus::Pending,
        customer_info: CustomerInfo {
            name: "Alice Johnson".to_string(),
            phone: "+1234567891".to_string(),
        },
        created_at: Utc::now(),
        started_at: None,
        completed_at: None,
    }
}

/// Transport that records calls instead of touching the network.
#[derive(Default)]
pub struct RecordingTransport {
    pub fail_connect: bool,
    pub connects: AtomicUsize,
    pub disconnects: AtomicUsize,
    pub emitted: Mutex<Vec<(Instant, RealtimeEvent)>>,
}

impl RecordingTransport {
    pub fn failing() -> Self {
        Self {
            fail_connect: true,
            ..Self::default()
        }
    }

    pub fn emitted_count(&self) -> usize {
        self.emitted.lock().unwrap().len()
    }

    pub fn emit_times(&self) -> Vec<Instant> {
        self.emitted.lock().unwrap().iter().map(|(at, _)| *at).collect()
    }
}

#[async_trait]
impl RealtimeTransport for RecordingTransport {
    async fn connect(&self) -> Result<(), ClientError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.fail_connect {
            return Err(ClientError::Transport("connection refused".to_string()));
        }
        Ok(())
    }

    async fn emit(&self, event: RealtimeEvent) -> Result<(), ClientError> {
        self.emitted.lock().unwrap().push((Instant::now(), event));
        Ok(())
    }

    async fn disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
    }
}

/// Position source fed by the test through the returned sender.
pub struct FakePosition {
    permission: PermissionStatus,
    start: RouteCoordinate,
    feed: Mutex<Option<mpsc::Receiver<PositionFix>>>,
    pub watch_calls: AtomicUsize,
}

pub fn fake_position(
    permission: PermissionStatus,
    start: RouteCoordinate,
) -> (Arc<FakePosition>, mpsc::Sender<PositionFix>) {
    let (tx, rx) = mpsc::channel(256);
    let source = Arc::new(FakePosition {
        permission,
        start,
        feed: Mutex::new(Some(rx)),
        watch_calls: AtomicUsize::new(0),
    });
    (source, tx)
}

#[async_trait]
impl PositionSource for FakePosition {
    async fn request_permission(&self) -> PermissionStatus {
        self.permission
    }

    async fn current_position(&self) -> Result<PositionFix, ClientError> {
        Ok(PositionFix::at(self.start))
    }

    fn watch(&self) -> Result<mpsc::Receiver<PositionFix>, ClientError> {
        self.watch_calls.fetch_add(1, Ordering::SeqCst);
        self.feed
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| ClientError::Transport("feed already taken".to_string()))
    }
}

pub struct StaticRoute {
    pub polyline: String,
}

impl StaticRoute {
    pub fn new(polyline: &str) -> Self {
        Self {
            polyline: polyline.to_string(),
        }
    }
}

#[async_trait]
impl RouteProvider for StaticRoute {
    async fn fetch_route(
        &self,
        _origin: RouteCoordinate,
        _destination: RouteCoordinate,
        _waypoint: RouteCoordinate,
    ) -> Result<RouteSummary, ClientError> {
        Ok(RouteSummary {
            encoded_polyline: self.polyline.clone(),
            distance_text: "5 km".to_string(),
            duration_text: "12 mins".to_string(),
        })
    }
}

/// Route request that never settles.
pub struct HungRoute;

#[async_trait]
impl RouteProvider for HungRoute {
    async fn fetch_route(
        &self,
        _origin: RouteCoordinate,
        _destination: RouteCoordinate,
        _waypoint: RouteCoordinate,
    ) -> Result<RouteSummary, ClientError> {
        std::future::pending().await
    }
}

#[derive(Clone, Default)]
pub struct RecordingRenderer {
    pub frames: Arc<Mutex<Vec<MapView>>>,
}

impl MapRenderer for RecordingRenderer {
    fn render(&mut self, view: &MapView) {
        self.frames.lock().unwrap().push(view.clone());
    }
}
