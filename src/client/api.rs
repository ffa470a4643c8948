//! REST client for the agent backend.
//!
//! Thin request/response wrapper: no retries, and every non-success status
//! is mapped onto [`ClientError`] so callers can show it once and move on.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::api::rest::orders::MessageResponse;
use crate::client::session::Session;
use crate::error::ClientError;
use crate::models::agent::{AgentProfile, LoginRequest};
use crate::models::location::LocationRecord;
use crate::models::order::Order;

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl ApiClient {
    /// `base_url` includes the API prefix, e.g. `http://localhost:8001/api`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Session, ClientError> {
        let url = format!("{}/auth/login", self.base_url);
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };

        let response = self.http.post(&url).json(&body).send().await?;
        let agent: AgentProfile = check_response_json(response).await?;

        info!(agent_id = %agent.id, "login succeeded");
        Ok(Session::new(agent))
    }

    pub async fn list_assigned(&self, session: &Session) -> Result<Vec<Order>, ClientError> {
        let url = format!("{}/orders/assigned/{}", self.base_url, session.agent_id());
        self.get_json(&url, session).await
    }

    pub async fn get_order(&self, session: &Session, order_id: &str) -> Result<Order, ClientError> {
        let url = format!("{}/orders/{}", self.base_url, order_id);
        self.get_json(&url, session).await
    }

    pub async fn start_order(
        &self,
        session: &Session,
        order_id: &str,
    ) -> Result<String, ClientError> {
        let url = format!("{}/orders/{}/start", self.base_url, order_id);
        self.put_message(&url, session).await
    }

    pub async fn complete_order(
        &self,
        session: &Session,
        order_id: &str,
    ) -> Result<String, ClientError> {
        let url = format!("{}/orders/{}/complete", self.base_url, order_id);
        self.put_message(&url, session).await
    }

    pub async fn order_locations(
        &self,
        session: &Session,
        order_id: &str,
    ) -> Result<Vec<LocationRecord>, ClientError> {
        let url = format!("{}/orders/{}/locations", self.base_url, order_id);
        self.get_json(&url, session).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        session: &Session,
    ) -> Result<T, ClientError> {
        debug!(url = %url, "GET");
        let response = self
            .http
            .get(url)
            .bearer_auth(session.token())
            .send()
            .await?;

        check_response_json(response).await
    }

    async fn put_message(&self, url: &str, session: &Session) -> Result<String, ClientError> {
        debug!(url = %url, "PUT");
        let response = self
            .http
            .put(url)
            .bearer_auth(session.token())
            .send()
            .await?;

        let body: MessageResponse = check_response_json(response).await?;
        Ok(body.message)
    }
}

async fn check_response_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ClientError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorBody>(&body)
            .map(|err| err.error)
            .unwrap_or(body);

        return Err(match status.as_u16() {
            401 => ClientError::Unauthorized,
            404 => ClientError::NotFound(detail),
            409 => ClientError::Rejected(detail),
            _ => ClientError::Network(format!("HTTP {}: {}", status, detail)),
        });
    }

    response
        .json()
        .await
        .map_err(|e| ClientError::Network(format!("JSON parse error: {}", e)))
}
