use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stratus_core::model::{status, CloudResource, CloudStorage, DiskCreateConfig};
use stratus_core::{value, Error, Result};

use crate::constants::MAX_RESULTS;
use crate::disk::Disk;
use crate::region::Region;

/// A block-storage pool disks are carved out of.
#[derive(Debug, Clone)]
pub struct Storage {
    pub(crate) region: Region,
    pub(crate) payload: StoragePayload,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct StoragePayload {
    pub(crate) storage_id: String,
    pub(crate) storage_name: String,
    pub(crate) storage_type: String,
    pub(crate) availability_zone: String,
    pub(crate) cluster_id: String,
    /// Gigabytes.
    pub(crate) capacity: String,
    /// Gigabytes already allocated.
    pub(crate) used: String,
}

impl Region {
    /// All storage pools of the region.
    pub async fn storages(&self) -> Result<Vec<Storage>> {
        let resp = self.invoke("DescribeStorages", Vec::new()).await?;
        let payloads: Vec<StoragePayload> = value::decode_list_at(&resp, &["storageSet"])?;
        Ok(payloads
            .into_iter()
            .map(|payload| Storage {
                region: self.clone(),
                payload,
            })
            .collect())
    }

    /// One storage pool by id.
    pub async fn storage_by_id(&self, id: &str) -> Result<Storage> {
        self.storages()
            .await?
            .into_iter()
            .find(|storage| storage.payload.storage_id == id)
            .ok_or_else(|| Error::not_found(format!("storage {id}")))
    }
}

#[async_trait]
impl CloudResource for Storage {
    fn id(&self) -> String {
        self.payload.storage_id.clone()
    }

    fn name(&self) -> String {
        if self.payload.storage_name.is_empty() {
            self.payload.storage_id.clone()
        } else {
            self.payload.storage_name.clone()
        }
    }

    fn global_id(&self) -> String {
        self.payload.storage_id.clone()
    }

    fn status(&self) -> String {
        status::AVAILABLE.to_string()
    }

    async fn refresh(&mut self) -> Result<()> {
        let fresh = self.region.storage_by_id(&self.payload.storage_id).await?;
        value::overlay(&mut self.payload, &serde_json::to_value(fresh.payload)?)
    }
}

#[async_trait]
impl CloudStorage for Storage {
    type Disk = Disk;

    fn storage_type(&self) -> String {
        self.payload.storage_type.to_lowercase()
    }

    fn zone_id(&self) -> String {
        self.payload.availability_zone.clone()
    }

    fn capacity_mb(&self) -> i64 {
        self.payload.capacity.parse::<i64>().unwrap_or(0) * 1024
    }

    fn enabled(&self) -> bool {
        true
    }

    async fn disks(&self) -> Result<Vec<Disk>> {
        let owner = self.region.client.account_user().await;
        let mut disks = Vec::new();
        let mut next_token = String::new();
        loop {
            let page = self.region.disks_page("", MAX_RESULTS, &next_token).await?;
            for payload in page.volumes {
                if payload.storage_id == self.payload.storage_id && payload.owner == owner {
                    disks.push(Disk {
                        region: self.region.clone(),
                        payload,
                    });
                }
            }
            if page.next_token.is_empty() {
                break;
            }
            next_token = page.next_token;
        }
        Ok(disks)
    }

    async fn disk_by_id(&self, id: &str) -> Result<Disk> {
        let disk = self.region.disk(id).await?;
        if disk.payload.storage_id != self.payload.storage_id {
            return Err(Error::not_found(format!(
                "disk {id} is not on storage {}",
                self.payload.storage_id
            )));
        }
        Ok(disk)
    }

    async fn create_disk(&self, config: &DiskCreateConfig) -> Result<Disk> {
        self.region
            .create_volume(&self.payload.storage_id, config)
            .await
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::region::test_region;

    fn storage_with(payload: StoragePayload) -> Storage {
        Storage {
            region: test_region(),
            payload,
        }
    }

    #[test]
    fn test_capacity_is_reported_in_megabytes() {
        let storage = storage_with(StoragePayload {
            storage_id: "pool-1".to_string(),
            capacity: "500".to_string(),
            ..Default::default()
        });
        assert_eq!(storage.capacity_mb(), 500 * 1024);

        let odd = storage_with(StoragePayload {
            capacity: "n/a".to_string(),
            ..Default::default()
        });
        assert_eq!(odd.capacity_mb(), 0);
    }

    #[test]
    fn test_name_falls_back_to_id() {
        let storage = storage_with(StoragePayload {
            storage_id: "pool-1".to_string(),
            storage_type: "LOCAL".to_string(),
            ..Default::default()
        });
        assert_eq!(storage.name(), "pool-1");
        assert_eq!(storage.storage_type(), "local");
    }
}
