use crate::geo::{RouteCoordinate, Viewport};
use crate::models::order::Order;

/// Shown in place of distance and duration until a route arrives.
pub const ROUTE_PLACEHOLDER: &str = "Calculating...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Current,
    Pickup,
    Delivery,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub kind: MarkerKind,
    pub coordinate: RouteCoordinate,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    pub markers: Vec<Marker>,
    pub route: Vec<RouteCoordinate>,
    pub viewport: Option<Viewport>,
    pub distance_text: String,
    pub duration_text: String,
}

impl MapView {
    pub fn for_order(order: &Order) -> Self {
        Self {
            markers: vec![
                Marker {
                    kind: MarkerKind::Pickup,
                    coordinate: RouteCoordinate::from(&order.pickup_location),
                    title: format!("Pickup: {}", order.pickup_location.address),
                },
                Marker {
                    kind: MarkerKind::Delivery,
                    coordinate: RouteCoordinate::from(&order.delivery_location),
                    title: format!("Delivery: {}", order.delivery_location.address),
                },
            ],
            route: Vec::new(),
            viewport: None,
            distance_text: ROUTE_PLACEHOLDER.to_string(),
            duration_text: ROUTE_PLACEHOLDER.to_string(),
        }
    }

    pub fn marker(&self, kind: MarkerKind) -> Option<&Marker> {
        self.markers.iter().find(|marker| marker.kind == kind)
    }

    pub fn set_current(&mut self, coordinate: RouteCoordinate) {
        match self
            .markers
            .iter_mut()
            .find(|marker| marker.kind == MarkerKind::Current)
        {
            Some(marker) => marker.coordinate = coordinate,
            None => self.markers.push(Marker {
                kind: MarkerKind::Current,
                coordinate,
                title: "You".to_string(),
            }),
        }
    }

    pub fn focus_points(&self) -> Vec<RouteCoordinate> {
        self.markers.iter().map(|marker| marker.coordinate).collect()
    }
}
