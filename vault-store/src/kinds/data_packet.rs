//! Data packets: arbitrary tagged JSON owned by a user profile

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ResourceKind;
use crate::db::TableSet;
use crate::models::{Record, ValidationError};

/// Maximum serialized size of packet data
const MAX_DATA_BYTES: usize = 1024 * 1024;

pub struct DataPackets;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataPacketBody {
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl DataPacketBody {
    pub fn new(data: Map<String, Value>) -> Self {
        Self { data }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataPacketPatch {
    /// Replaces the whole data object; no deep merge
    pub data: Option<Map<String, Value>>,
}

pub type DataPacket = Record<DataPacketBody>;

impl ResourceKind for DataPackets {
    const NAME: &'static str = "data packet";
    const TABLES: TableSet = TableSet {
        records: "data_packets",
        ledger: "data_packets_update_ledger",
        tags: "data_packets_tags",
    };
    const REQUIRES_PROFILE: bool = true;

    type Body = DataPacketBody;
    type Patch = DataPacketPatch;

    fn validate(body: &Self::Body) -> Result<(), ValidationError> {
        let size = serde_json::to_vec(&body.data).map(|v| v.len()).unwrap_or(usize::MAX);
        if size > MAX_DATA_BYTES {
            return Err(ValidationError::TooLarge {
                field: "data",
                size,
                max: MAX_DATA_BYTES,
            });
        }
        Ok(())
    }

    fn apply_patch(body: &mut Self::Body, patch: Self::Patch) {
        if let Some(data) = patch.data {
            body.data = data;
        }
    }
}
