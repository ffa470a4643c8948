//! Device capabilities the navigation flow depends on: a position source
//! and a map renderer. Targets without them get placeholder
//! implementations chosen once at startup.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::ClientError;
use crate::geo::RouteCoordinate;
use crate::navigation::view::MapView;

const FIX_BUFFER: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionFix {
    pub coordinate: RouteCoordinate,
    pub speed: Option<f64>,
    pub heading: Option<f64>,
    pub accuracy: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl PositionFix {
    pub fn at(coordinate: RouteCoordinate) -> Self {
        Self {
            coordinate,
            speed: None,
            heading: None,
            accuracy: None,
            timestamp: Utc::now(),
        }
    }
}

#[async_trait]
pub trait PositionSource: Send + Sync {
    async fn request_permission(&self) -> PermissionStatus;

    async fn current_position(&self) -> Result<PositionFix, ClientError>;

    /// Starts a feed of raw fixes. Dropping the receiver ends the feed.
    fn watch(&self) -> Result<mpsc::Receiver<PositionFix>, ClientError>;
}

pub trait MapRenderer: Send {
    fn render(&mut self, view: &MapView);
}

#[derive(Debug, Clone, Default)]
pub struct UnavailablePositionSource;

#[async_trait]
impl PositionSource for UnavailablePositionSource {
    async fn request_permission(&self) -> PermissionStatus {
        PermissionStatus::Denied
    }

    async fn current_position(&self) -> Result<PositionFix, ClientError> {
        Err(ClientError::PermissionDenied)
    }

    fn watch(&self) -> Result<mpsc::Receiver<PositionFix>, ClientError> {
        Err(ClientError::PermissionDenied)
    }
}

#[derive(Debug, Clone)]
pub struct SimulatedPositionSource {
    path: Vec<RouteCoordinate>,
    cadence: Duration,
    speed: Option<f64>,
}

impl SimulatedPositionSource {
    pub fn new(path: Vec<RouteCoordinate>, cadence: Duration) -> Self {
        Self {
            path,
            cadence,
            speed: None,
        }
    }

    pub fn with_speed(mut self, speed_mps: f64) -> Self {
        self.speed = Some(speed_mps);
        self
    }

    fn fix(&self, coordinate: RouteCoordinate) -> PositionFix {
        PositionFix {
            speed: self.speed,
            accuracy: Some(5.0),
            ..PositionFix::at(coordinate)
        }
    }
}

#[async_trait]
impl PositionSource for SimulatedPositionSource {
    async fn request_permission(&self) -> PermissionStatus {
        PermissionStatus::Granted
    }

    async fn current_position(&self) -> Result<PositionFix, ClientError> {
        self.path
            .first()
            .map(|point| self.fix(*point))
            .ok_or_else(|| ClientError::Config("simulated path is empty".to_string()))
    }

    fn watch(&self) -> Result<mpsc::Receiver<PositionFix>, ClientError> {
        let (tx, rx) = mpsc::channel(FIX_BUFFER);
        let fixes: Vec<PositionFix> = self.path.iter().map(|point| self.fix(*point)).collect();
        let cadence = self.cadence;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(cadence);
            for fix in fixes {
                ticker.tick().await;
                if tx.send(fix).await.is_err() {
                    debug!("simulated position feed released");
                    return;
                }
            }
            debug!("simulated path finished");
        });

        Ok(rx)
    }
}

/// Straight-line path through `waypoints`, with `steps` fixes per segment.
pub fn interpolate_path(waypoints: &[RouteCoordinate], steps: usize) -> Vec<RouteCoordinate> {
    let steps = steps.max(1);
    let mut path = Vec::with_capacity(waypoints.len().saturating_sub(1) * steps + 1);

    for pair in waypoints.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        for step in 0..steps {
            let t = step as f64 / steps as f64;
            path.push(RouteCoordinate::new(
                from.latitude + (to.latitude - from.latitude) * t,
                from.longitude + (to.longitude - from.longitude) * t,
            ));
        }
    }
    if let Some(last) = waypoints.last() {
        path.push(*last);
    }

    path
}

#[derive(Debug, Clone, Default)]
pub struct NoopMapRenderer;

impl MapRenderer for NoopMapRenderer {
    fn render(&mut self, _view: &MapView) {}
}

/// Headless renderer that writes each frame summary to the log.
#[derive(Debug, Clone, Default)]
pub struct TracingMapRenderer;

impl MapRenderer for TracingMapRenderer {
    fn render(&mut self, view: &MapView) {
        info!(
            markers = view.markers.len(),
            route_points = view.route.len(),
            distance = %view.distance_text,
            duration = %view.duration_text,
            "map frame"
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Native,
    Web,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_family = "wasm") {
            Platform::Web
        } else {
            Platform::Native
        }
    }
}

pub struct Capabilities {
    pub platform: Platform,
    pub position: Arc<dyn PositionSource>,
    pub renderer: Box<dyn MapRenderer>,
}

impl Capabilities {
    /// Web targets get placeholders; native targets use `native_position`.
    pub fn for_platform(platform: Platform, native_position: Arc<dyn PositionSource>) -> Self {
        match platform {
            Platform::Web => Self {
                platform,
                position: Arc::new(UnavailablePositionSource),
                renderer: Box::new(NoopMapRenderer),
            },
            Platform::Native => Self {
                platform,
                position: native_position,
                renderer: Box::new(TracingMapRenderer),
            },
        }
    }

    pub fn detect(native_position: Arc<dyn PositionSource>) -> Self {
        Self::for_platform(Platform::current(), native_position)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::{
        interpolate_path, Capabilities, Platform, PermissionStatus, PositionSource,
        SimulatedPositionSource,
    };
    use crate::error::ClientError;
    use crate::geo::RouteCoordinate;

    #[test]
    fn interpolation_hits_every_waypoint() {
        let waypoints = [
            RouteCoordinate::new(0.0, 0.0),
            RouteCoordinate::new(1.0, 1.0),
            RouteCoordinate::new(1.0, 3.0),
        ];
        let path = interpolate_path(&waypoints, 4);

        assert_eq!(path.len(), 9);
        assert_eq!(path[0], waypoints[0]);
        assert_eq!(path[4], waypoints[1]);
        assert_eq!(path[8], waypoints[2]);
        assert_eq!(path[2], RouteCoordinate::new(0.5, 0.5));
    }

    #[tokio::test]
    async fn web_platform_gets_placeholder_position() {
        let native = Arc::new(SimulatedPositionSource::new(
            vec![RouteCoordinate::new(1.0, 1.0)],
            Duration::from_millis(10),
        ));
        let caps = Capabilities::for_platform(Platform::Web, native);

        assert_eq!(caps.position.request_permission().await, PermissionStatus::Denied);
        assert!(matches!(
            caps.position.current_position().await,
            Err(ClientError::PermissionDenied)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn simulated_source_replays_path() {
        let path = vec![RouteCoordinate::new(1.0, 1.0), RouteCoordinate::new(2.0, 2.0)];
        let source = SimulatedPositionSource::new(path.clone(), Duration::from_secs(1));
        let mut rx = source.watch().unwrap();

        assert_eq!(rx.recv().await.unwrap().coordinate, path[0]);
        assert_eq!(rx.recv().await.unwrap().coordinate, path[1]);
        assert!(rx.recv().await.is_none());
    }
}
