use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stratus_core::model::{status, CloudResource, CloudSnapshot, DiskType, TagSet};
use stratus_core::time::{self, DateTime};
use stratus_core::{value, Error, Result};

use crate::region::Region;

/// A point-in-time copy of a volume.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub(crate) region: Region,
    pub(crate) payload: SnapshotPayload,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct SnapshotPayload {
    pub(crate) snapshot_id: String,
    pub(crate) snapshot_name: String,
    pub(crate) backup_id: String,
    pub(crate) volume_id: String,
    pub(crate) status: String,
    pub(crate) start_time: String,
    pub(crate) progress: String,
    pub(crate) owner_id: String,
    /// Gigabytes.
    pub(crate) volume_size: String,
    pub(crate) is_backup: String,
    pub(crate) is_root: String,
    pub(crate) is_head: String,
    pub(crate) file_type: String,
    pub(crate) file_size: String,
    pub(crate) description: String,
    pub(crate) storage_id: String,
}

impl Region {
    pub(crate) async fn list_snapshots(&self, snapshot_id: &str) -> Result<Vec<Snapshot>> {
        let mut params = Vec::new();
        if !snapshot_id.is_empty() {
            params.push(("SnapshotId.1".to_string(), snapshot_id.to_string()));
        }
        params.push(("Filter.1.Name".to_string(), "owner-id".to_string()));
        params.push((
            "Filter.1.Value.1".to_string(),
            self.client.account_user().await,
        ));
        let resp = self.invoke("DescribeSnapshots", params).await?;
        let payloads: Vec<SnapshotPayload> = value::decode_list_at(&resp, &["snapshotSet"])?;
        Ok(payloads
            .into_iter()
            .map(|payload| Snapshot {
                region: self.clone(),
                payload,
            })
            .collect())
    }

    /// All snapshots owned by the account.
    pub async fn snapshots(&self) -> Result<Vec<Snapshot>> {
        self.list_snapshots("").await
    }

    /// One snapshot by id.
    pub async fn snapshot_by_id(&self, id: &str) -> Result<Snapshot> {
        self.list_snapshots(id)
            .await?
            .into_iter()
            .find(|snapshot| snapshot.payload.snapshot_id == id)
            .ok_or_else(|| Error::not_found(format!("snapshot {id}")))
    }

    pub(crate) async fn create_snapshot(
        &self,
        volume_id: &str,
        name: &str,
        description: &str,
    ) -> Result<Snapshot> {
        let params = vec![
            ("VolumeId".to_string(), volume_id.to_string()),
            ("SnapshotName".to_string(), name.to_string()),
            ("Description".to_string(), description.to_string()),
        ];
        let resp = self.invoke("CreateSnapshot", params).await?;
        let id: String = value::decode_at(&resp, &["snapshotId"])?;
        self.snapshot_by_id(&id).await
    }
}

#[async_trait]
impl CloudResource for Snapshot {
    fn id(&self) -> String {
        self.payload.snapshot_id.clone()
    }

    fn name(&self) -> String {
        if self.payload.snapshot_name.is_empty() {
            self.payload.snapshot_id.clone()
        } else {
            self.payload.snapshot_name.clone()
        }
    }

    fn global_id(&self) -> String {
        self.payload.snapshot_id.clone()
    }

    fn status(&self) -> String {
        match self.payload.status.as_str() {
            "completed" => status::READY.to_string(),
            "pending" => status::CREATING.to_string(),
            _ => status::FAILED.to_string(),
        }
    }

    fn created_at(&self) -> Option<DateTime> {
        time::parse(&self.payload.start_time).ok()
    }

    async fn set_tags(&self, _tags: TagSet, _replace: bool) -> Result<()> {
        // The provider has no snapshot tag call; accept and move on.
        Ok(())
    }

    async fn refresh(&mut self) -> Result<()> {
        let mut matches = self.region.list_snapshots(&self.payload.snapshot_id).await?;
        let fresh = match matches.pop() {
            Some(snapshot) if matches.is_empty() => snapshot,
            _ => {
                return Err(Error::not_found(format!(
                    "snapshot {}",
                    self.payload.snapshot_id
                )))
            }
        };
        value::overlay(&mut self.payload, &serde_json::to_value(fresh.payload)?)
    }
}

#[async_trait]
impl CloudSnapshot for Snapshot {
    fn size_mb(&self) -> i64 {
        self.payload.volume_size.parse::<i64>().unwrap_or(0) * 1024
    }

    fn disk_id(&self) -> String {
        self.payload.volume_id.clone()
    }

    fn disk_type(&self) -> DiskType {
        if self.payload.is_root == "true" {
            return DiskType::Sys;
        }
        match self.payload.file_type.as_str() {
            "system" => DiskType::Sys,
            _ => DiskType::Data,
        }
    }

    async fn delete(&self) -> Result<()> {
        let params = vec![("SnapshotId".to_string(), self.payload.snapshot_id.clone())];
        self.region.invoke("DeleteSnapshot", params).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    use super::*;
    use crate::region::test_region;

    fn snapshot_with(payload: SnapshotPayload) -> Snapshot {
        Snapshot {
            region: test_region(),
            payload,
        }
    }

    #[test_case("completed", status::READY ; "completed maps to ready")]
    #[test_case("pending", status::CREATING ; "pending maps to creating")]
    #[test_case("error", status::FAILED ; "anything else fails")]
    fn test_status_mapping(wire: &str, want: &str) {
        let snapshot = snapshot_with(SnapshotPayload {
            status: wire.to_string(),
            ..Default::default()
        });
        assert_eq!(snapshot.status(), want);
    }

    #[test]
    fn test_disk_type_prefers_root_flag_over_file_type() {
        let root = snapshot_with(SnapshotPayload {
            is_root: "true".to_string(),
            file_type: "data".to_string(),
            ..Default::default()
        });
        assert_eq!(root.disk_type(), DiskType::Sys);

        let data = snapshot_with(SnapshotPayload {
            file_type: "data".to_string(),
            ..Default::default()
        });
        assert_eq!(data.disk_type(), DiskType::Data);

        let system = snapshot_with(SnapshotPayload {
            file_type: "system".to_string(),
            ..Default::default()
        });
        assert_eq!(system.disk_type(), DiskType::Sys);
    }

    #[test]
    fn test_size_comes_from_volume_size() {
        let snapshot = snapshot_with(SnapshotPayload {
            volume_size: "20".to_string(),
            ..Default::default()
        });
        assert_eq!(snapshot.size_mb(), 20 * 1024);
    }
}
