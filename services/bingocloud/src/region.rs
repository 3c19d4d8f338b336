use serde::{Deserialize, Serialize};
use serde_json::Value;
use stratus_core::model::status;
use stratus_core::Result;

use crate::client::Client;

/// One region of a BingoCloud deployment.
///
/// Regions come from [`Client::regions`]. Resource listings and creation
/// calls hang off this type, one source file per resource family.
#[derive(Debug, Clone)]
pub struct Region {
    pub(crate) client: Client,
    pub(crate) payload: RegionPayload,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct RegionPayload {
    pub(crate) region_id: String,
    pub(crate) region_name: String,
    pub(crate) region_endpoint: String,
}

impl Region {
    /// Region identifier.
    pub fn id(&self) -> String {
        self.payload.region_id.clone()
    }

    /// Display name, falling back to the id.
    pub fn name(&self) -> String {
        if self.payload.region_name.is_empty() {
            self.payload.region_id.clone()
        } else {
            self.payload.region_name.clone()
        }
    }

    /// Endpoint the region reports for itself.
    pub fn endpoint(&self) -> String {
        self.payload.region_endpoint.clone()
    }

    /// Regions are always serving.
    pub fn status(&self) -> String {
        status::AVAILABLE.to_string()
    }

    pub(crate) async fn invoke(
        &self,
        action: &str,
        params: Vec<(String, String)>,
    ) -> Result<Value> {
        self.client.invoke(action, params).await
    }
}

#[cfg(test)]
pub(crate) fn test_region() -> Region {
    Region {
        client: crate::client::test_client(stratus_core::Context::default()),
        payload: RegionPayload {
            region_id: "bj-1".to_string(),
            region_name: "Beijing".to_string(),
            region_endpoint: String::new(),
        },
    }
}
