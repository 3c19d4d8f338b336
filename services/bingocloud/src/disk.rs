use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stratus_core::model::{status, CloudDisk, CloudResource, DiskCreateConfig, DiskType};
use stratus_core::time::{self, DateTime};
use stratus_core::{value, Error, Result};

use crate::instance::InstanceBlockDevicePayload;
use crate::region::Region;
use crate::snapshot::Snapshot;

/// How long a replacement volume may take to come up during a reset.
const RESET_POLL_INTERVAL: Duration = Duration::from_secs(5);
const RESET_TIMEOUT: Duration = Duration::from_secs(3600);

/// A block volume.
#[derive(Debug, Clone)]
pub struct Disk {
    pub(crate) region: Region,
    pub(crate) payload: DiskPayload,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct DiskPayload {
    pub(crate) attachment_set: Vec<AttachmentPayload>,
    pub(crate) availability_zone: String,
    pub(crate) create_time: String,
    pub(crate) description: String,
    pub(crate) detach_behavior: String,
    pub(crate) goal: String,
    pub(crate) iops: String,
    pub(crate) is_deduct_quota: String,
    pub(crate) is_encrypt: String,
    pub(crate) is_for_sleep_inst: String,
    pub(crate) is_mirror_volume: String,
    pub(crate) is_multi_attach: String,
    pub(crate) is_one_inst: String,
    pub(crate) is_root: String,
    pub(crate) location: String,
    pub(crate) mirror_from: String,
    pub(crate) mirror_process: String,
    pub(crate) mirror_status: String,
    pub(crate) node_id: String,
    pub(crate) owner: String,
    pub(crate) passphrase: String,
    pub(crate) readonly: String,
    /// Gigabytes.
    pub(crate) size: String,
    pub(crate) snapshot_id: String,
    pub(crate) status: String,
    pub(crate) storage_id: String,
    pub(crate) volume_id: String,
    pub(crate) volume_name: String,
    pub(crate) image_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct AttachmentPayload {
    pub(crate) attach_time: String,
    pub(crate) cache: String,
    pub(crate) delete_on_termination: String,
    pub(crate) device: String,
    pub(crate) instance_id: String,
    pub(crate) status: String,
    pub(crate) volume_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct DisksPage {
    #[serde(rename = "NextToken", alias = "nextToken")]
    pub(crate) next_token: String,
    #[serde(rename = "volumeSet")]
    pub(crate) volumes: Vec<DiskPayload>,
}

impl Region {
    /// One page of the volume listing, optionally narrowed to a single id.
    pub(crate) async fn disks_page(
        &self,
        disk_id: &str,
        max_results: usize,
        next_token: &str,
    ) -> Result<DisksPage> {
        let mut params = Vec::new();
        if !disk_id.is_empty() {
            params.push(("Filter.1.Name".to_string(), "volume-id".to_string()));
            params.push(("Filter.1.Value.1".to_string(), disk_id.to_string()));
        }
        if !next_token.is_empty() {
            params.push(("NextToken".to_string(), next_token.to_string()));
        }
        params.push(("MaxRecords".to_string(), max_results.to_string()));
        let resp = self.invoke("DescribeVolumes", params).await?;
        serde_json::from_value(resp)
            .map_err(|err| Error::decode("volume listing has unexpected shape").with_source(err))
    }

    /// One disk by id, scoped to the account that owns the credentials.
    pub async fn disk(&self, id: &str) -> Result<Disk> {
        let owner = self.client.account_user().await;
        let page = self.disks_page(id, 1, "").await?;
        for payload in page.volumes {
            if payload.volume_id == id && payload.owner == owner {
                return Ok(Disk {
                    region: self.clone(),
                    payload,
                });
            }
        }
        Err(Error::not_found(format!("disk {id}")))
    }

    pub(crate) async fn create_volume(
        &self,
        storage_id: &str,
        config: &DiskCreateConfig,
    ) -> Result<Disk> {
        let mut params = vec![
            ("VolumeName".to_string(), config.name.clone()),
            ("AvailabilityZone".to_string(), config.zone_id.clone()),
            ("Size".to_string(), config.size_gb.to_string()),
            ("StorageId".to_string(), storage_id.to_string()),
        ];
        if let Some(node_id) = &config.node_id {
            params.push(("NodeId".to_string(), node_id.clone()));
        }
        if let Some(snapshot_id) = &config.snapshot_id {
            params.push(("SnapshotId".to_string(), snapshot_id.clone()));
        }
        let resp = self.invoke("CreateVolume", params).await?;
        let payload: DiskPayload = serde_json::from_value(resp)
            .map_err(|err| Error::decode("create response is not a volume").with_source(err))?;
        Ok(Disk {
            region: self.clone(),
            payload,
        })
    }

    pub(crate) async fn detach_volume(&self, volume_id: &str, instance_id: &str) -> Result<()> {
        let params = vec![
            ("VolumeId".to_string(), volume_id.to_string()),
            ("InstanceId".to_string(), instance_id.to_string()),
        ];
        self.invoke("DetachVolume", params).await?;
        Ok(())
    }

    pub(crate) async fn attach_volume(
        &self,
        volume_id: &str,
        instance_id: &str,
        device: &str,
    ) -> Result<()> {
        let params = vec![
            ("VolumeId".to_string(), volume_id.to_string()),
            ("InstanceId".to_string(), instance_id.to_string()),
            ("Device".to_string(), device.to_string()),
        ];
        self.invoke("AttachVolume", params).await?;
        Ok(())
    }
}

/// Picks the next free device slot on an instance, staying within the
/// naming family the existing devices use.
fn next_device_name(devices: &[InstanceBlockDevicePayload]) -> Result<String> {
    let prefix = if devices
        .iter()
        .any(|device| device.device_name.starts_with("/dev/sd"))
    {
        "/dev/sd"
    } else {
        "/dev/vd"
    };
    for letter in b'b'..=b'z' {
        let candidate = format!("{prefix}{}", letter as char);
        if !devices.iter().any(|device| device.device_name == candidate) {
            return Ok(candidate);
        }
    }
    Err(Error::unexpected("no free device name left on instance"))
}

async fn wait_ready(disk: &mut Disk, interval: Duration, timeout: Duration) -> Result<()> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if disk.status() == status::READY {
            return Ok(());
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(Error::unexpected(format!(
                "disk {} is still `{}` after {}s",
                disk.id(),
                disk.status(),
                timeout.as_secs()
            )));
        }
        tokio::time::sleep(interval).await;
        disk.refresh().await?;
    }
}

#[async_trait]
impl CloudResource for Disk {
    fn id(&self) -> String {
        self.payload.volume_id.clone()
    }

    fn name(&self) -> String {
        if self.payload.volume_name.is_empty() {
            self.payload.volume_id.clone()
        } else {
            self.payload.volume_name.clone()
        }
    }

    fn global_id(&self) -> String {
        self.payload.volume_id.clone()
    }

    fn status(&self) -> String {
        match self.payload.status.as_str() {
            "available" | "in-use" => status::READY.to_string(),
            other => other.to_string(),
        }
    }

    fn created_at(&self) -> Option<DateTime> {
        time::parse(&self.payload.create_time).ok()
    }

    async fn refresh(&mut self) -> Result<()> {
        let fresh = self.region.disk(&self.payload.volume_id).await?;
        value::overlay(&mut self.payload, &serde_json::to_value(fresh.payload)?)
    }
}

#[async_trait]
impl CloudDisk for Disk {
    type Snapshot = Snapshot;

    fn disk_type(&self) -> DiskType {
        if self.payload.is_root == "true" {
            DiskType::Sys
        } else {
            DiskType::Data
        }
    }

    fn disk_format(&self) -> String {
        "raw".to_string()
    }

    fn size_mb(&self) -> i64 {
        self.payload.size.parse::<i64>().unwrap_or(0) * 1024
    }

    fn is_auto_delete(&self) -> bool {
        // Root volumes go away with their instance.
        self.payload.is_root == "true"
    }

    fn driver(&self) -> String {
        "virtio".to_string()
    }

    fn cache_mode(&self) -> String {
        "none".to_string()
    }

    fn mount_point(&self) -> String {
        self.payload
            .attachment_set
            .first()
            .map(|attachment| attachment.device.clone())
            .unwrap_or_default()
    }

    fn storage_id(&self) -> String {
        self.payload.storage_id.clone()
    }

    async fn template_id(&self) -> Result<String> {
        if !self.payload.image_id.is_empty() {
            return Ok(self.payload.image_id.clone());
        }
        let Some(attachment) = self.payload.attachment_set.first() else {
            return Ok(String::new());
        };
        let reservations = self.region.instances(&attachment.instance_id).await?;
        Ok(reservations
            .first()
            .map(|reservation| reservation.instances_set.image_id.clone())
            .unwrap_or_default())
    }

    async fn delete(&self) -> Result<()> {
        let params = vec![("VolumeId".to_string(), self.payload.volume_id.clone())];
        self.region.invoke("DeleteVolume", params).await?;
        Ok(())
    }

    async fn resize(&self, new_size_mb: i64) -> Result<()> {
        let params = vec![
            ("VolumeId".to_string(), self.payload.volume_id.clone()),
            ("Size".to_string(), (new_size_mb / 1024).to_string()),
        ];
        self.region.invoke("ResizeVolume", params).await?;
        Ok(())
    }

    /// Rebuilds the volume from a snapshot by creating a replacement,
    /// swapping every attachment over to it and deleting the original.
    /// Returns the id of the replacement volume.
    async fn reset(&self, snapshot_id: &str) -> Result<String> {
        let config = DiskCreateConfig {
            name: self.payload.volume_name.clone(),
            size_gb: self.payload.size.parse().unwrap_or(0),
            description: self.payload.description.clone(),
            zone_id: self.payload.availability_zone.clone(),
            node_id: (!self.payload.node_id.is_empty()).then(|| self.payload.node_id.clone()),
            snapshot_id: Some(snapshot_id.to_string()),
        };
        let mut replacement = self
            .region
            .create_volume(&self.payload.storage_id, &config)
            .await?;
        wait_ready(&mut replacement, RESET_POLL_INTERVAL, RESET_TIMEOUT).await?;

        for attachment in &self.payload.attachment_set {
            let reservations = self.region.instances(&attachment.instance_id).await?;
            let Some(reservation) = reservations.first() else {
                break;
            };
            self.region
                .detach_volume(&self.payload.volume_id, &attachment.instance_id)
                .await?;
            let device = next_device_name(&reservation.instances_set.block_device_mapping)?;
            self.region
                .attach_volume(
                    &replacement.payload.volume_id,
                    &attachment.instance_id,
                    &device,
                )
                .await?;
        }

        self.delete().await?;
        Ok(replacement.payload.volume_id.clone())
    }

    async fn create_snapshot(&self, name: &str, description: &str) -> Result<Snapshot> {
        self.region
            .create_snapshot(&self.payload.volume_id, name, description)
            .await
    }

    async fn snapshots(&self) -> Result<Vec<Snapshot>> {
        let mut snapshots = self.region.snapshots().await?;
        snapshots.retain(|snapshot| snapshot.payload.volume_id == self.payload.volume_id);
        Ok(snapshots)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use test_case::test_case;

    use super::*;
    use crate::region::test_region;

    fn disk_with(payload: DiskPayload) -> Disk {
        Disk {
            region: test_region(),
            payload,
        }
    }

    fn devices(names: &[&str]) -> Vec<InstanceBlockDevicePayload> {
        names
            .iter()
            .map(|name| InstanceBlockDevicePayload {
                device_name: name.to_string(),
                volume_id: String::new(),
            })
            .collect()
    }

    #[test_case("available", status::READY ; "available maps to ready")]
    #[test_case("in-use", status::READY ; "in use maps to ready")]
    #[test_case("deleting", "deleting" ; "unknown passes through")]
    fn test_status_mapping(wire: &str, want: &str) {
        let disk = disk_with(DiskPayload {
            status: wire.to_string(),
            ..Default::default()
        });
        assert_eq!(disk.status(), want);
    }

    #[test]
    fn test_next_device_name_prefers_virtio_family() -> anyhow::Result<()> {
        assert_eq!(next_device_name(&devices(&[]))?, "/dev/vdb");
        assert_eq!(next_device_name(&devices(&["/dev/vda", "/dev/vdb"]))?, "/dev/vdc");
        Ok(())
    }

    #[test]
    fn test_next_device_name_follows_scsi_family() -> anyhow::Result<()> {
        assert_eq!(next_device_name(&devices(&["/dev/sda"]))?, "/dev/sdb");
        Ok(())
    }

    #[test]
    fn test_next_device_name_runs_out_of_letters() {
        let names: Vec<String> = (b'a'..=b'z').map(|l| format!("/dev/vd{}", l as char)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        assert!(next_device_name(&devices(&refs)).is_err());
    }

    #[test]
    fn test_page_accepts_both_token_spellings() -> anyhow::Result<()> {
        let lower: DisksPage = serde_json::from_value(json!({
            "nextToken": "t1",
            "volumeSet": [{"volumeId": "vol-1"}]
        }))?;
        assert_eq!(lower.next_token, "t1");
        assert_eq!(lower.volumes[0].volume_id, "vol-1");

        let upper: DisksPage = serde_json::from_value(json!({
            "NextToken": "t2",
            "volumeSet": []
        }))?;
        assert_eq!(upper.next_token, "t2");
        Ok(())
    }

    #[tokio::test]
    async fn test_template_id_short_circuits_on_image_id() -> anyhow::Result<()> {
        // The test context cannot send requests, so returning Ok proves
        // the lookup never left the payload.
        let disk = disk_with(DiskPayload {
            image_id: "img-3".to_string(),
            attachment_set: vec![AttachmentPayload {
                instance_id: "i-1".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        });
        assert_eq!(disk.template_id().await?, "img-3");
        Ok(())
    }

    #[test]
    fn test_sys_disk_auto_deletes() {
        let disk = disk_with(DiskPayload {
            is_root: "true".to_string(),
            size: "40".to_string(),
            ..Default::default()
        });
        assert_eq!(disk.disk_type(), DiskType::Sys);
        assert!(disk.is_auto_delete());
        assert_eq!(disk.size_mb(), 40 * 1024);
    }
}
