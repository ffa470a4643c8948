use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::client::session::Session;
use crate::client::transport::RealtimeTransport;
use crate::geo::{haversine_m, RouteCoordinate};
use crate::models::event::RealtimeEvent;
use crate::models::location::LocationSample;
use crate::platform::PositionFix;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmitterConfig {
    /// Minimum wall-clock gap between emitted samples.
    pub time_interval: Duration,
    /// Minimum displacement from the last emitted sample, in meters.
    pub distance_interval_m: f64,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            time_interval: Duration::from_secs(5),
            distance_interval_m: 10.0,
        }
    }
}

/// Decides which raw fixes become samples. The first fix always passes;
/// after that a fix needs both `time_interval` elapsed and
/// `distance_interval_m` covered since the last emitted one.
#[derive(Debug, Clone)]
pub struct Throttle {
    config: EmitterConfig,
    last: Option<(Instant, RouteCoordinate)>,
}

impl Throttle {
    pub fn new(config: EmitterConfig) -> Self {
        Self { config, last: None }
    }

    pub fn admit(&mut self, now: Instant, position: RouteCoordinate) -> bool {
        if let Some((at, previous)) = self.last {
            if now.saturating_duration_since(at) < self.config.time_interval {
                return false;
            }
            if haversine_m(&previous, &position) < self.config.distance_interval_m {
                return false;
            }
        }

        self.last = Some((now, position));
        true
    }
}

pub struct LocationEmitter {
    config: EmitterConfig,
    agent_id: String,
    order_id: String,
    transport: Arc<dyn RealtimeTransport>,
}

impl LocationEmitter {
    pub fn new(
        config: EmitterConfig,
        session: &Session,
        order_id: impl Into<String>,
        transport: Arc<dyn RealtimeTransport>,
    ) -> Self {
        Self {
            config,
            agent_id: session.agent_id().to_string(),
            order_id: order_id.into(),
            transport,
        }
    }

    /// Consumes `fixes` on a background task. Every admitted fix replaces
    /// the value in `current` and is sent once; send failures are dropped.
    pub fn start(
        self,
        mut fixes: mpsc::Receiver<PositionFix>,
        current: watch::Sender<RouteCoordinate>,
    ) -> LocationSubscription {
        let task = tokio::spawn(async move {
            let mut throttle = Throttle::new(self.config);

            while let Some(fix) = fixes.recv().await {
                if !throttle.admit(Instant::now(), fix.coordinate) {
                    trace!("position fix suppressed");
                    continue;
                }

                current.send_replace(fix.coordinate);

                let sample = LocationSample {
                    lat: fix.coordinate.latitude,
                    lng: fix.coordinate.longitude,
                    order_id: self.order_id.clone(),
                    agent_id: self.agent_id.clone(),
                    timestamp: Some(fix.timestamp),
                    speed: fix.speed,
                    heading: fix.heading,
                    accuracy: fix.accuracy,
                };

                if let Err(err) = self
                    .transport
                    .emit(RealtimeEvent::LocationUpdate(sample))
                    .await
                {
                    warn!(error = %err, order_id = %self.order_id, "location sample dropped");
                }
            }

            debug!(order_id = %self.order_id, "position feed ended");
        });

        LocationSubscription { task }
    }
}

/// Handle to a running emitter. Removing it stops the emitter and drops
/// the position feed.
#[derive(Debug)]
pub struct LocationSubscription {
    task: JoinHandle<()>,
}

impl LocationSubscription {
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn abort(self) {
        self.task.abort();
    }

    /// Returns once the feed receiver has been dropped.
    pub async fn remove(self) {
        self.task.abort();
        let _ = self.task.await;
    }
}
