//! Headless controller for one navigation session over a single order.
//!
//! Lifecycle: [`NavigationController::mount`] acquires the position feed
//! and opens the realtime channel; [`NavigationController::unmount`]
//! releases both in one step. A controller serves exactly one session;
//! mounting again needs a new controller and a new transport.

use std::sync::Arc;

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::client::directions::{RouteProvider, RouteSummary};
use crate::client::emitter::{EmitterConfig, LocationEmitter, LocationSubscription};
use crate::client::session::Session;
use crate::client::transport::RealtimeTransport;
use crate::error::ClientError;
use crate::geo::{fit_viewport, RouteCoordinate, Viewport};
use crate::models::order::Order;
use crate::navigation::view::{MapView, MarkerKind};
use crate::platform::{MapRenderer, PermissionStatus, PositionSource};

const VIEWPORT_PADDING: f64 = 1.4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavState {
    Initializing,
    Ready,
    /// Terminal for this controller; `message` is the alert shown.
    Error { message: String },
}

pub struct NavigationDeps {
    pub position: Arc<dyn PositionSource>,
    pub transport: Arc<dyn RealtimeTransport>,
    pub routes: Arc<dyn RouteProvider>,
    pub renderer: Box<dyn MapRenderer>,
}

type RouteResult = Result<RouteSummary, ClientError>;

pub struct NavigationController {
    session: Session,
    order: Order,
    config: EmitterConfig,
    position: Arc<dyn PositionSource>,
    transport: Arc<dyn RealtimeTransport>,
    routes: Arc<dyn RouteProvider>,
    renderer: Box<dyn MapRenderer>,
    state: NavState,
    view: MapView,
    alert: Option<String>,
    current: Option<watch::Receiver<RouteCoordinate>>,
    subscription: Option<LocationSubscription>,
    connect_task: Option<JoinHandle<()>>,
    route_task: Option<JoinHandle<()>>,
    route_rx: Option<oneshot::Receiver<RouteResult>>,
    torn_down: bool,
}

impl NavigationController {
    pub fn new(session: &Session, order: Order, config: EmitterConfig, deps: NavigationDeps) -> Self {
        let view = MapView::for_order(&order);

        Self {
            session: session.clone(),
            order,
            config,
            position: deps.position,
            transport: deps.transport,
            routes: deps.routes,
            renderer: deps.renderer,
            state: NavState::Initializing,
            view,
            alert: None,
            current: None,
            subscription: None,
            connect_task: None,
            route_task: None,
            route_rx: None,
            torn_down: false,
        }
    }

    pub fn state(&self) -> &NavState {
        &self.state
    }

    pub fn view(&self) -> &MapView {
        &self.view
    }

    pub fn order(&self) -> &Order {
        &self.order
    }

    pub fn take_alert(&mut self) -> Option<String> {
        self.alert.take()
    }

    pub fn is_tracking(&self) -> bool {
        self.subscription
            .as_ref()
            .is_some_and(LocationSubscription::is_active)
    }

    pub async fn mount(&mut self) -> &NavState {
        if self.state != NavState::Initializing || self.torn_down {
            return &self.state;
        }

        // Connect in the background; the map works without the relay.
        let transport = self.transport.clone();
        self.connect_task = Some(tokio::spawn(async move {
            if let Err(err) = transport.connect().await {
                warn!(error = %err, "live relay unavailable");
            }
        }));

        if self.position.request_permission().await == PermissionStatus::Denied {
            self.fail(ClientError::PermissionDenied);
            return &self.state;
        }

        let origin = match self.position.current_position().await {
            Ok(fix) => fix.coordinate,
            Err(err) => {
                self.fail(err);
                return &self.state;
            }
        };
        self.view.set_current(origin);

        self.spawn_route_fetch(origin);

        let fixes = match self.position.watch() {
            Ok(fixes) => fixes,
            Err(err) => {
                self.fail(err);
                return &self.state;
            }
        };
        let (current_tx, current_rx) = watch::channel(origin);
        let emitter = LocationEmitter::new(
            self.config,
            &self.session,
            self.order.id.clone(),
            self.transport.clone(),
        );
        self.subscription = Some(emitter.start(fixes, current_tx));
        self.current = Some(current_rx);

        self.state = NavState::Ready;
        self.view.viewport = self.fit();
        info!(order_id = %self.order.id, "navigation ready");
        self.render();
        &self.state
    }

    fn spawn_route_fetch(&mut self, origin: RouteCoordinate) {
        let (tx, rx) = oneshot::channel();
        let routes = self.routes.clone();
        let destination = RouteCoordinate::from(&self.order.delivery_location);
        let waypoint = RouteCoordinate::from(&self.order.pickup_location);

        self.route_task = Some(tokio::spawn(async move {
            let result = routes.fetch_route(origin, destination, waypoint).await;
            let _ = tx.send(result);
        }));
        self.route_rx = Some(rx);
    }

    fn fail(&mut self, err: ClientError) {
        warn!(order_id = %self.order.id, error = %err, "navigation failed to initialize");
        let message = err.user_message();
        self.alert = Some(message.clone());
        self.state = NavState::Error { message };
        self.render();
    }

    /// Applies whatever arrived since the last call: the latest emitted
    /// position and, once, the route result.
    pub fn refresh(&mut self) {
        if let Some(current) = self.current.as_mut() {
            let coordinate = *current.borrow_and_update();
            self.view.set_current(coordinate);
        }

        if let Some(rx) = self.route_rx.as_mut() {
            match rx.try_recv() {
                Ok(result) => {
                    self.route_rx = None;
                    self.apply_route(result);
                }
                Err(oneshot::error::TryRecvError::Empty) => {}
                Err(oneshot::error::TryRecvError::Closed) => self.route_rx = None,
            }
        }

        self.render();
    }

    /// Waits for the route request to settle and applies it. Returns
    /// immediately if no request is outstanding.
    pub async fn wait_for_route(&mut self) {
        let Some(rx) = self.route_rx.take() else {
            return;
        };

        if let Ok(result) = rx.await {
            self.apply_route(result);
        }
        self.render();
    }

    fn apply_route(&mut self, result: RouteResult) {
        let summary = match result {
            Ok(summary) => summary,
            Err(err) => {
                warn!(order_id = %self.order.id, error = %err, "route unavailable");
                return;
            }
        };

        match summary.coordinates() {
            Ok(points) => self.view.route = points,
            Err(err) => {
                warn!(order_id = %self.order.id, error = %err, "route line dropped");
                self.view.route.clear();
            }
        }
        self.view.distance_text = summary.distance_text;
        self.view.duration_text = summary.duration_text;
    }

    pub fn recenter(&mut self) -> Option<Viewport> {
        if self.state != NavState::Ready {
            return None;
        }

        self.refresh();
        self.view.viewport = self.fit();
        self.render();
        self.view.viewport
    }

    fn fit(&self) -> Option<Viewport> {
        fit_viewport(&self.view.focus_points(), VIEWPORT_PADDING)
    }

    pub fn current_position(&self) -> Option<RouteCoordinate> {
        self.view
            .marker(MarkerKind::Current)
            .map(|marker| marker.coordinate)
    }

    fn render(&mut self) {
        self.renderer.render(&self.view);
    }

    /// Releases the position feed and closes the realtime channel,
    /// whatever state the controller reached.
    pub async fn unmount(mut self) {
        self.torn_down = true;

        if let Some(subscription) = self.subscription.take() {
            subscription.remove().await;
        }
        if let Some(task) = self.route_task.take() {
            task.abort();
        }
        if let Some(task) = self.connect_task.take() {
            task.abort();
            let _ = task.await;
        }
        self.transport.disconnect().await;

        info!(order_id = %self.order.id, "navigation torn down");
    }
}

impl Drop for NavigationController {
    fn drop(&mut self) {
        if self.torn_down {
            return;
        }

        // Dropped without unmount: stop background work and close the
        // channel on the runtime if one is still around.
        if let Some(subscription) = self.subscription.take() {
            subscription.abort();
        }
        if let Some(task) = self.route_task.take() {
            task.abort();
        }
        if let Some(task) = self.connect_task.take() {
            task.abort();
        }
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let transport = self.transport.clone();
            handle.spawn(async move { transport.disconnect().await });
        }
    }
}
