pub mod polyline;

use serde::{Deserialize, Serialize};

use crate::models::order::Location;

const EARTH_RADIUS_KM: f64 = 6_371.0;
const MIN_VIEWPORT_DELTA: f64 = 0.01;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RouteCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl RouteCoordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl From<&Location> for RouteCoordinate {
    fn from(location: &Location) -> Self {
        Self::new(location.lat, location.lng)
    }
}

pub fn haversine_km(a: &RouteCoordinate, b: &RouteCoordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lng = (b.longitude - a.longitude).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    let central_angle = 2.0 * haversine.sqrt().asin();

    EARTH_RADIUS_KM * central_angle
}

pub fn haversine_m(a: &RouteCoordinate, b: &RouteCoordinate) -> f64 {
    haversine_km(a, b) * 1_000.0
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Viewport {
    pub center: RouteCoordinate,
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}

impl Viewport {
    pub fn contains(&self, point: &RouteCoordinate) -> bool {
        (point.latitude - self.center.latitude).abs() <= self.latitude_delta / 2.0
            && (point.longitude - self.center.longitude).abs() <= self.longitude_delta / 2.0
    }
}

/// Smallest viewport covering every point, widened by `padding` (1.0 = tight).
pub fn fit_viewport(points: &[RouteCoordinate], padding: f64) -> Option<Viewport> {
    let first = points.first()?;
    let (mut min_lat, mut max_lat) = (first.latitude, first.latitude);
    let (mut min_lng, mut max_lng) = (first.longitude, first.longitude);

    for point in &points[1..] {
        min_lat = min_lat.min(point.latitude);
        max_lat = max_lat.max(point.latitude);
        min_lng = min_lng.min(point.longitude);
        max_lng = max_lng.max(point.longitude);
    }

    let padding = padding.max(1.0);
    Some(Viewport {
        center: RouteCoordinate::new((min_lat + max_lat) / 2.0, (min_lng + max_lng) / 2.0),
        latitude_delta: ((max_lat - min_lat) * padding).max(MIN_VIEWPORT_DELTA),
        longitude_delta: ((max_lng - min_lng) * padding).max(MIN_VIEWPORT_DELTA),
    })
}

#[cfg(test)]
mod tests {
    use super::{fit_viewport, haversine_km, haversine_m, RouteCoordinate};

    #[test]
    fn zero_distance_for_same_point() {
        let p = RouteCoordinate::new(53.5511, 9.9937);
        let distance = haversine_km(&p, &p);
        assert!(distance < 1e-9);
    }

    #[test]
    fn london_to_paris_is_around_343_km() {
        let london = RouteCoordinate::new(51.5074, -0.1278);
        let paris = RouteCoordinate::new(48.8566, 2.3522);
        let distance = haversine_km(&london, &paris);
        assert!((distance - 343.0).abs() < 5.0);
    }

    #[test]
    fn ten_meters_north_is_about_ten_meters() {
        let a = RouteCoordinate::new(37.7749, -122.4194);
        let b = RouteCoordinate::new(37.7749 + 0.00009, -122.4194);
        let distance = haversine_m(&a, &b);
        assert!((distance - 10.0).abs() < 0.5);
    }

    #[test]
    fn viewport_covers_all_points() {
        let points = [
            RouteCoordinate::new(37.70, -122.50),
            RouteCoordinate::new(37.7749, -122.4194),
            RouteCoordinate::new(37.8044, -122.2712),
        ];
        let viewport = fit_viewport(&points, 1.2).unwrap();

        for point in &points {
            assert!(viewport.contains(point));
        }
        assert!((viewport.center.latitude - 37.7522).abs() < 1e-9);
    }

    #[test]
    fn single_point_gets_minimum_span() {
        let viewport = fit_viewport(&[RouteCoordinate::new(1.0, 2.0)], 1.5).unwrap();
        assert_eq!(viewport.latitude_delta, 0.01);
        assert_eq!(viewport.longitude_delta, 0.01);
    }

    #[test]
    fn empty_input_has_no_viewport() {
        assert!(fit_viewport(&[], 1.5).is_none());
    }
}
