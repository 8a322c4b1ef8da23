use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Network;

/// A user-defined set of addresses tracked together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portfolio {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Portfolio {
    pub fn new(owner_id: Uuid, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name: name.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A blockchain address belonging to exactly one portfolio. Deleting the
/// portfolio cascades to its addresses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressRecord {
    pub id: Uuid,
    pub portfolio_id: Uuid,
    /// Checksum-validated before persisting; see `chain::address`.
    pub address: String,
    pub network: Network,
    pub label: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AddressRecord {
    pub fn new(
        portfolio_id: Uuid,
        address: impl Into<String>,
        network: Network,
        label: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            portfolio_id,
            address: address.into(),
            network,
            label,
            created_at: now,
            updated_at: now,
        }
    }
}
