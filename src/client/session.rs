use tracing::info;

use crate::models::agent::AgentProfile;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    agent: AgentProfile,
}

impl Session {
    pub fn new(agent: AgentProfile) -> Self {
        Self { agent }
    }

    pub fn agent(&self) -> &AgentProfile {
        &self.agent
    }

    pub fn agent_id(&self) -> &str {
        &self.agent.id
    }

    pub fn token(&self) -> &str {
        &self.agent.token
    }

    pub fn logout(self) {
        info!(agent_id = %self.agent.id, "agent logged out");
    }
}
