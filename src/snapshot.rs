//! State snapshot in canonical JSON.
//!
//! Objects are emitted with sorted keys and no whitespace, so two snapshots of
//! the same state are byte-identical and can be hashed or diffed directly.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::fabric::{AllocationState, FabricStats, MetricsSnapshot};

pub const SNAPSHOT_VERSION: u32 = 1;

/// The five mappings that make up the externally observable allocation.
pub const STATE_KEYS: [&str; 5] = [
    "s1_to_s2",
    "s2_to_s3",
    "s3_port_owner",
    "s3_port_spine",
    "desired_owner",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub version: u32,
    #[serde(rename = "N")]
    pub n: usize,
    #[serde(rename = "TOTAL_BLOCKS")]
    pub total_blocks: usize,
    #[serde(rename = "MAX_PORTS")]
    pub max_ports: u32,
    /// `[ingress][spine]` -> owning input id, 0 when free.
    pub s1_to_s2: Vec<Vec<u32>>,
    /// `[spine][egress]` -> owning input id, 0 when free.
    pub s2_to_s3: Vec<Vec<u32>>,
    /// Indexed by output port; slot 0 is unused.
    pub s3_port_owner: Vec<u32>,
    /// Indexed by output port; 0-based spine, -1 when disconnected.
    pub s3_port_spine: Vec<i32>,
    pub desired_owner: Vec<u32>,
    #[serde(flatten)]
    pub metrics: MetricsSnapshot,
    #[serde(flatten)]
    pub stats: FabricStats,
}

impl StateSnapshot {
    pub fn capture(state: &AllocationState, metrics: &MetricsSnapshot) -> Self {
        let topo = state.topology();
        Self {
            version: SNAPSHOT_VERSION,
            n: topo.n(),
            total_blocks: topo.n(),
            max_ports: topo.max_port(),
            s1_to_s2: state.trunks().s1_rows(),
            s2_to_s3: state.trunks().s2_rows(),
            s3_port_owner: state.port_owner_raw().to_vec(),
            s3_port_spine: state.port_spine_raw().to_vec(),
            desired_owner: state.desired_owner_raw().to_vec(),
            metrics: *metrics,
            stats: FabricStats::compute(state),
        }
    }

    /// Full snapshot, keys sorted.
    pub fn to_canonical_json(&self) -> Result<String> {
        let value = serde_json::to_value(self)?;
        Ok(serde_json::to_string(&value)?)
    }

    /// Only the five state mappings, keys sorted. Counters and statistics are
    /// left out so runs with different search histories can still be compared.
    pub fn canonical_state(&self) -> Result<String> {
        let value = serde_json::to_value(self)?;
        let state: serde_json::Map<String, Value> = STATE_KEYS
            .iter()
            .filter_map(|&key| value.get(key).map(|v| (key.to_string(), v.clone())))
            .collect();
        Ok(serde_json::to_string(&Value::Object(state))?)
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        let mut json = self.to_canonical_json()?;
        json.push('\n');
        fs::write(path, json)?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn read_from(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}
