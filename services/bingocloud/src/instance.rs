use serde::{Deserialize, Serialize};
use stratus_core::{value, Result};

use crate::region::Region;

/// One reservation from the instance listing.
///
/// The provider nests exactly one instance per reservation and the
/// normalizer keeps that element as a single object, so `instances_set`
/// is not a list here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct ReservationPayload {
    pub(crate) reservation_id: String,
    pub(crate) owner_id: String,
    pub(crate) instances_set: InstancePayload,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct InstancePayload {
    pub(crate) instance_id: String,
    pub(crate) image_id: String,
    pub(crate) block_device_mapping: Vec<InstanceBlockDevicePayload>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct InstanceBlockDevicePayload {
    pub(crate) device_name: String,
    pub(crate) volume_id: String,
}

impl Region {
    /// Reservations, optionally narrowed to one instance.
    ///
    /// Disks use this for image lookups and attachment juggling; servers
    /// are not otherwise modeled by this crate.
    pub(crate) async fn instances(&self, instance_id: &str) -> Result<Vec<ReservationPayload>> {
        let mut params = Vec::new();
        if !instance_id.is_empty() {
            params.push(("InstanceId.1".to_string(), instance_id.to_string()));
        }
        let resp = self.invoke("DescribeInstances", params).await?;
        value::decode_list_at(&resp, &["reservationSet"])
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_reservation_decodes_single_instance_object() -> anyhow::Result<()> {
        let tree = json!({
            "reservationSet": [{
                "reservationId": "r-1",
                "ownerId": "acct",
                "instancesSet": {
                    "instanceId": "i-1",
                    "imageId": "img-9",
                    "blockDeviceMapping": [
                        {"deviceName": "/dev/vda", "volumeId": "vol-1"}
                    ]
                }
            }]
        });

        let reservations: Vec<ReservationPayload> =
            value::decode_list_at(&tree, &["reservationSet"])?;
        assert_eq!(reservations.len(), 1);
        assert_eq!(reservations[0].instances_set.instance_id, "i-1");
        assert_eq!(reservations[0].instances_set.image_id, "img-9");
        assert_eq!(
            reservations[0].instances_set.block_device_mapping[0].device_name,
            "/dev/vda"
        );
        Ok(())
    }
}
