use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::ClientError;
use crate::geo::polyline::{self, DecodeError};
use crate::geo::RouteCoordinate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSummary {
    pub encoded_polyline: String,
    pub distance_text: String,
    pub duration_text: String,
}

impl RouteSummary {
    pub fn coordinates(&self) -> Result<Vec<RouteCoordinate>, DecodeError> {
        polyline::decode(&self.encoded_polyline)
    }
}

#[async_trait]
pub trait RouteProvider: Send + Sync {
    /// Single best route from `origin` to `destination` through `waypoint`.
    async fn fetch_route(
        &self,
        origin: RouteCoordinate,
        destination: RouteCoordinate,
        waypoint: RouteCoordinate,
    ) -> Result<RouteSummary, ClientError>;
}

#[derive(Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Deserialize)]
struct DirectionsRoute {
    overview_polyline: OverviewPolyline,
    #[serde(default)]
    legs: Vec<DirectionsLeg>,
}

#[derive(Deserialize)]
struct OverviewPolyline {
    points: String,
}

#[derive(Deserialize)]
struct DirectionsLeg {
    distance: TextValue,
    duration: TextValue,
}

#[derive(Deserialize)]
struct TextValue {
    text: String,
}

impl DirectionsResponse {
    fn into_summary(self) -> Result<RouteSummary, ClientError> {
        let status = self.status.unwrap_or_else(|| "UNKNOWN".to_string());
        let route = self.routes.into_iter().next().ok_or_else(|| {
            let detail = self.error_message.unwrap_or_default();
            ClientError::Network(format!("no route returned ({status}) {detail}").trim_end().to_string())
        })?;

        let leg = route
            .legs
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::Network("route has no legs".to_string()))?;

        Ok(RouteSummary {
            encoded_polyline: route.overview_polyline.points,
            distance_text: leg.distance.text,
            duration_text: leg.duration.text,
        })
    }
}

#[derive(Clone)]
pub struct DirectionsClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
}

impl DirectionsClient {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
            api_key: api_key.into(),
        }
    }
}

fn lat_lng(point: &RouteCoordinate) -> String {
    format!("{},{}", point.latitude, point.longitude)
}

#[async_trait]
impl RouteProvider for DirectionsClient {
    async fn fetch_route(
        &self,
        origin: RouteCoordinate,
        destination: RouteCoordinate,
        waypoint: RouteCoordinate,
    ) -> Result<RouteSummary, ClientError> {
        debug!(origin = %lat_lng(&origin), destination = %lat_lng(&destination), "fetching route");

        let response = self
            .http
            .get(&self.url)
            .query(&[
                ("origin", lat_lng(&origin)),
                ("destination", lat_lng(&destination)),
                ("waypoints", lat_lng(&waypoint)),
                ("key", self.api_key.clone()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Network(format!("HTTP {}: {}", status, body)));
        }

        let body: DirectionsResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Network(format!("JSON parse error: {}", e)))?;

        body.into_summary()
    }
}

/// Stand-in when no routing key is configured; every fetch fails, so the
/// map shows markers without a route line.
#[derive(Debug, Clone, Default)]
pub struct UnconfiguredRouteProvider;

#[async_trait]
impl RouteProvider for UnconfiguredRouteProvider {
    async fn fetch_route(
        &self,
        _origin: RouteCoordinate,
        _destination: RouteCoordinate,
        _waypoint: RouteCoordinate,
    ) -> Result<RouteSummary, ClientError> {
        Err(ClientError::Config(
            "directions API key not configured".to_string(),
        ))
    }
}
