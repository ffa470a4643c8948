use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub location_updates_total: IntCounterVec,
    pub relay_connections: IntGauge,
    pub order_transitions_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let location_updates_total = IntCounterVec::new(
            Opts::new("location_updates_total", "Location updates received by outcome"),
            &["outcome"],
        )?;

        let relay_connections =
            IntGauge::new("relay_connections", "Currently connected realtime clients")?;

        let order_transitions_total = IntCounterVec::new(
            Opts::new("order_transitions_total", "Order status transitions by result"),
            &["transition", "result"],
        )?;

        registry.register(Box::new(location_updates_total.clone()))?;
        registry.register(Box::new(relay_connections.clone()))?;
        registry.register(Box::new(order_transitions_total.clone()))?;

        Ok(Self {
            registry,
            location_updates_total,
            relay_connections,
            order_transitions_total,
        })
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}
