use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentProfile {
    pub id: String,
    pub username: String,
    pub name: String,
    pub phone: String,
    pub status: String,
    pub token: String,
}

#[derive(Debug, Clone)]
pub struct AgentRecord {
    pub id: String,
    pub username: String,
    password_digest: String,
    pub name: String,
    pub phone: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl AgentRecord {
    pub fn new(
        id: impl Into<String>,
        username: impl Into<String>,
        password: &str,
        name: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        let username = username.into();
        let password_digest = digest_password(&username, password);

        Self {
            id: id.into(),
            username,
            password_digest,
            name: name.into(),
            phone: phone.into(),
            status: "active".to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn verify_password(&self, password: &str) -> bool {
        digest_password(&self.username, password) == self.password_digest
    }

    pub fn profile(&self, token: String) -> AgentProfile {
        AgentProfile {
            id: self.id.clone(),
            username: self.username.clone(),
            name: self.name.clone(),
            phone: self.phone.clone(),
            status: self.status.clone(),
            token,
        }
    }
}

// Salted with the username; credential storage hardening is out of scope here.
fn digest_password(username: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(username.as_bytes());
    hasher.update([0u8]);
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}
