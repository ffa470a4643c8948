pub mod api;
pub mod directions;
pub mod emitter;
pub mod session;
pub mod transport;

pub use api::ApiClient;
pub use directions::{DirectionsClient, RouteProvider, RouteSummary, UnconfiguredRouteProvider};
pub use emitter::{EmitterConfig, LocationEmitter, LocationSubscription, Throttle};
pub use session::Session;
pub use transport::{RealtimeTransport, WsTransport};
