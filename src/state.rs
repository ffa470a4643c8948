use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::agent::AgentRecord;
use crate::models::location::{LocationRecord, LocationSample};
use crate::models::order::{CustomerInfo, Location, Order, OrderStatus};
use crate::observability::metrics::Metrics;

pub const DEFAULT_HISTORY_LIMIT: usize = 1000;

pub struct AppState {
    pub agents: DashMap<String, AgentRecord>,
    pub orders: DashMap<String, Order>,
    pub location_history: DashMap<String, Vec<LocationRecord>>,
    pub location_events_tx: broadcast::Sender<LocationSample>,
    pub metrics: Metrics,
    history_limit: usize,
}

impl AppState {
    pub fn new(event_buffer_size: usize) -> Result<Self, AppError> {
        let (location_events_tx, _unused_rx) = broadcast::channel(event_buffer_size.max(1));
        let metrics = Metrics::new()
            .map_err(|err| AppError::Internal(format!("failed to register metrics: {err}")))?;

        Ok(Self {
            agents: DashMap::new(),
            orders: DashMap::new(),
            location_history: DashMap::new(),
            location_events_tx,
            metrics,
            history_limit: DEFAULT_HISTORY_LIMIT,
        })
    }

    /// Caps how many records are kept per order; the oldest go first.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.max(1);
        self
    }

    pub fn insert_agent(&self, agent: AgentRecord) {
        self.agents.insert(agent.id.clone(), agent);
    }

    pub fn insert_order(&self, order: Order) {
        self.orders.insert(order.id.clone(), order);
    }

    pub fn find_agent_by_username(&self, username: &str) -> Option<AgentRecord> {
        self.agents
            .iter()
            .find(|entry| entry.value().username == username)
            .map(|entry| entry.value().clone())
    }

    pub fn record_location(&self, sample: &LocationSample) -> Result<(), AppError> {
        if !self.orders.contains_key(&sample.order_id) {
            return Err(AppError::NotFound(format!("order {}", sample.order_id)));
        }

        let record = LocationRecord::from_sample(sample, Utc::now());
        let mut history = self
            .location_history
            .entry(sample.order_id.clone())
            .or_default();
        history.push(record);
        if history.len() > self.history_limit {
            let excess = history.len() - self.history_limit;
            history.drain(..excess);
        }
        Ok(())
    }

    /// Seeds one agent (`agent1` / `password123`) with two pending orders,
    /// unless that username already exists. Returns the agent id.
    pub fn seed_demo_data(&self) -> String {
        if let Some(existing) = self.find_agent_by_username("agent1") {
            return existing.id;
        }

        let agent_id = Uuid::new_v4().to_string();
        self.insert_agent(AgentRecord::new(
            agent_id.clone(),
            "agent1",
            "password123",
            "John Doe",
            "+1234567890",
        ));

        let san_francisco = |address: &str| Location {
            lat: 37.7749,
            lng: -122.4194,
            address: address.to_string(),
        };
        let oakland = |address: &str| Location {
            lat: 37.8044,
            lng: -122.2712,
            address: address.to_string(),
        };

        let orders = [
            (
                "ORD001",
                san_francisco("123 Market St, San Francisco, CA"),
                oakland("456 Broadway, Oakland, CA"),
                ("Alice Johnson", "+1234567891"),
            ),
            (
                "ORD002",
                oakland("789 Main St, Oakland, CA"),
                san_francisco("321 Mission St, San Francisco, CA"),
                ("Bob Smith", "+1234567892"),
            ),
        ];

        for (order_number, pickup, delivery, (name, phone)) in orders {
            self.insert_order(Order {
                id: Uuid::new_v4().to_string(),
                order_number: order_number.to_string(),
                pickup_location: pickup,
                delivery_location: delivery,
                assigned_agent_id: agent_id.clone(),
                status: OrderStatus::Pending,
                customer_info: CustomerInfo {
                    name: name.to_string(),
                    phone: phone.to_string(),
                },
                created_at: Utc::now(),
                started_at: None,
                completed_at: None,
            });
        }

        tracing::info!(agent_id = %agent_id, orders = self.orders.len(), "demo data seeded");
        agent_id
    }
}
