// In-memory view of the monitored environment: entity states plus the entity and
// device registries used for label resolution. Fed by POST /api/states, the
// optional states file and the host metrics collector.

mod entity_id;

pub use entity_id::{EntityIdError, domain_of, split_entity_id};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

pub type SharedStateStore = Arc<RwLock<StateStore>>;

/// Current state of one entity. `attributes` carries free-form extras
/// (e.g. `installed_version` / `latest_version` on update entities).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub entity_id: String,
    pub state: String,
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl EntityRecord {
    pub fn new(entity_id: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            state: state.into(),
            attributes: serde_json::Map::new(),
        }
    }

    pub fn with_attribute(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    pub fn domain(&self) -> &str {
        domain_of(&self.entity_id)
    }

    /// String attribute; non-string values are treated as absent.
    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(|v| v.as_str())
    }
}

/// Entity registry entry: labels and the owning device, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub entity_id: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub device_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEntry {
    pub id: String,
    #[serde(default)]
    pub labels: Vec<String>,
}

/// Full replacement of the store's content (request body and states file format).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatesPayload {
    #[serde(default)]
    pub states: Vec<EntityRecord>,
    #[serde(default)]
    pub entities: Vec<RegistryEntry>,
    #[serde(default)]
    pub devices: Vec<DeviceEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct StateStore {
    states: Vec<EntityRecord>,
    index: HashMap<String, usize>,
    entities: HashMap<String, RegistryEntry>,
    devices: HashMap<String, DeviceEntry>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(self) -> SharedStateStore {
        Arc::new(RwLock::new(self))
    }

    /// Builds a store from a payload; fails on the first malformed entity id.
    pub fn from_payload(payload: StatesPayload) -> Result<Self, EntityIdError> {
        let mut store = Self::new();
        for record in payload.states {
            store.upsert(record)?;
        }
        for entry in payload.entities {
            split_entity_id(&entry.entity_id)?;
            store.entities.insert(entry.entity_id.clone(), entry);
        }
        for device in payload.devices {
            store.devices.insert(device.id.clone(), device);
        }
        Ok(store)
    }

    /// Replaces everything, keeping host-published states (`sensor.host_*`) that the payload
    /// does not override. All-or-nothing: on error the store is unchanged.
    pub fn replace(&mut self, payload: StatesPayload) -> Result<(), EntityIdError> {
        let mut next = Self::from_payload(payload)?;
        for record in self.states.iter().filter(|r| is_host_entity(&r.entity_id)) {
            if next.get(&record.entity_id).is_none() {
                next.upsert(record.clone())?;
            }
        }
        *self = next;
        Ok(())
    }

    /// Inserts or updates a state; an existing entity keeps its position.
    pub fn upsert(&mut self, record: EntityRecord) -> Result<(), EntityIdError> {
        split_entity_id(&record.entity_id)?;
        match self.index.get(&record.entity_id) {
            Some(&i) => self.states[i] = record,
            None => {
                self.index.insert(record.entity_id.clone(), self.states.len());
                self.states.push(record);
            }
        }
        Ok(())
    }

    pub fn get(&self, entity_id: &str) -> Option<&EntityRecord> {
        self.index.get(entity_id).map(|&i| &self.states[i])
    }

    /// All states in insertion order.
    pub fn all(&self) -> &[EntityRecord] {
        &self.states
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// True if the entity, or the device it belongs to, carries `label`.
    pub fn is_ignored(&self, entity_id: &str, label: &str) -> bool {
        let Some(entry) = self.entities.get(entity_id) else {
            return false;
        };
        if entry.labels.iter().any(|l| l == label) {
            return true;
        }
        entry
            .device_id
            .as_ref()
            .and_then(|id| self.devices.get(id))
            .is_some_and(|device| device.labels.iter().any(|l| l == label))
    }
}

fn is_host_entity(entity_id: &str) -> bool {
    entity_id.starts_with(crate::sysinfo_repo::HOST_ENTITY_PREFIX)
}

/// Reads a states payload from a JSON file.
pub fn load_states_file(path: impl AsRef<Path>) -> anyhow::Result<StatesPayload> {
    let path = path.as_ref();
    let s = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("states file {}: {}", path.display(), e))?;
    let payload = serde_json::from_str(&s)
        .map_err(|e| anyhow::anyhow!("states file {}: {}", path.display(), e))?;
    Ok(payload)
}
