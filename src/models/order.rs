use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomerInfo {
    pub name: String,
    pub phone: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    InProgress,
    Completed,
}

impl OrderStatus {
    /// Only forward steps are allowed: pending -> in_progress -> completed.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::InProgress)
                | (OrderStatus::InProgress, OrderStatus::Completed)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: String,
    pub order_number: String,
    pub pickup_location: Location,
    pub delivery_location: Location,
    pub assigned_agent_id: String,
    pub status: OrderStatus,
    pub customer_info: CustomerInfo,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Moves the order to `next`, stamping the matching timestamp.
    /// Returns the rejected pair when the step would go backwards or skip.
    pub fn transition(
        &mut self,
        next: OrderStatus,
        at: DateTime<Utc>,
    ) -> Result<(), (OrderStatus, OrderStatus)> {
        if !self.status.can_transition_to(next) {
            return Err((self.status, next));
        }

        self.status = next;
        match next {
            OrderStatus::InProgress => self.started_at = Some(at),
            OrderStatus::Completed => self.completed_at = Some(at),
            OrderStatus::Pending => {}
        }

        Ok(())
    }
}
