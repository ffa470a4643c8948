pub mod controller;
pub mod view;

pub use controller::{NavState, NavigationController, NavigationDeps};
pub use view::{MapView, Marker, MarkerKind, ROUTE_PLACEHOLDER};
