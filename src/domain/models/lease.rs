//! Lease: the only mechanism authorizing a worker to report task results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lease {
    pub task_id: Uuid,
    pub agent_id: String,
    pub granted_utc: DateTime<Utc>,
    pub expires_utc: DateTime<Utc>,
    pub renewal_count: u32,
}

impl Lease {
    pub fn new(task_id: Uuid, agent_id: impl Into<String>, ttl: chrono::Duration) -> Self {
        let now = Utc::now();
        Self {
            task_id,
            agent_id: agent_id.into(),
            granted_utc: now,
            expires_utc: now + ttl,
            renewal_count: 0,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_utc
    }

    pub fn renew(&mut self, ttl: chrono::Duration) {
        self.expires_utc = Utc::now() + ttl;
        self.renewal_count += 1;
    }

    /// A lease authorizes exactly the agent it was granted to.
    pub fn held_by(&self, agent_id: &str) -> bool {
        self.agent_id == agent_id && !self.is_expired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_lease_is_not_expired() {
        let lease = Lease::new(Uuid::now_v7(), "A1", chrono::Duration::seconds(60));
        assert!(!lease.is_expired());
        assert!(lease.held_by("A1"));
        assert!(!lease.held_by("A2"));
    }

    #[test]
    fn renew_extends_expiry_and_counts() {
        let mut lease = Lease::new(Uuid::now_v7(), "A1", chrono::Duration::seconds(1));
        let before = lease.expires_utc;
        lease.renew(chrono::Duration::seconds(60));
        assert!(lease.expires_utc > before);
        assert_eq!(lease.renewal_count, 1);
    }
}
