use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stratus_core::model::{status, CloudInstanceBackup, CloudResource, TagSet};
use stratus_core::{value, Error, Result};

use crate::region::Region;

/// A whole-instance backup covering every attached volume.
#[derive(Debug, Clone)]
pub struct InstanceBackup {
    pub(crate) region: Region,
    pub(crate) payload: InstanceBackupPayload,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct InstanceBackupPayload {
    pub(crate) backup_id: String,
    pub(crate) instance_id: String,
    pub(crate) backup_name: String,
    pub(crate) display_name: String,
    pub(crate) owner_id: String,
    pub(crate) backup_size: String,
    pub(crate) backup_status: String,
    pub(crate) progress: String,
    pub(crate) storage_id: String,
    pub(crate) block_device_mapping: Vec<BackupBlockDevicePayload>,
    pub(crate) description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct BackupBlockDevicePayload {
    pub(crate) mapping_id: String,
    pub(crate) image_id: String,
    pub(crate) is_root: String,
    pub(crate) device_name: String,
    pub(crate) virtual_name: String,
    pub(crate) snapshot_id: String,
    pub(crate) size: String,
    pub(crate) volume_id: String,
    pub(crate) encrypted: String,
    pub(crate) iops: String,
    pub(crate) storage_id: String,
    pub(crate) delete_on_termination: String,
}

impl Region {
    pub(crate) async fn list_instance_backups(
        &self,
        instance_id: &str,
        backup_id: &str,
    ) -> Result<Vec<InstanceBackup>> {
        let mut params = Vec::new();
        if !instance_id.is_empty() {
            params.push(("InstanceId.1".to_string(), instance_id.to_string()));
        }
        let resp = self.invoke("DescribeInstanceBackups", params).await?;
        let mut payloads: Vec<InstanceBackupPayload> =
            value::decode_list_at(&resp, &["describeInstanceBackupsResult", "instanceBackups"])?;
        if !backup_id.is_empty() {
            payloads.retain(|payload| payload.backup_id == backup_id);
        }
        Ok(payloads
            .into_iter()
            .map(|payload| InstanceBackup {
                region: self.clone(),
                payload,
            })
            .collect())
    }

    /// All instance backups of the region.
    pub async fn instance_backups(&self) -> Result<Vec<InstanceBackup>> {
        self.list_instance_backups("", "").await
    }

    /// One instance backup by id.
    pub async fn instance_backup_by_id(&self, id: &str) -> Result<InstanceBackup> {
        self.list_instance_backups("", id)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(format!("instance backup {id}")))
    }

    /// Backs up a whole instance and returns the new backup.
    pub async fn create_instance_backup(
        &self,
        instance_id: &str,
        name: &str,
        description: &str,
    ) -> Result<InstanceBackup> {
        let params = vec![
            ("InstanceId".to_string(), instance_id.to_string()),
            ("BackupName".to_string(), name.to_string()),
            ("Description".to_string(), description.to_string()),
        ];
        let resp = self.invoke("BackupInstance", params).await?;
        let id: String =
            value::decode_at(&resp, &["backupInstanceResult", "backup", "backupId"])?;
        self.instance_backup_by_id(&id).await
    }
}

#[async_trait]
impl CloudResource for InstanceBackup {
    fn id(&self) -> String {
        self.payload.backup_id.clone()
    }

    fn name(&self) -> String {
        if self.payload.backup_name.is_empty() {
            self.payload.backup_id.clone()
        } else {
            self.payload.backup_name.clone()
        }
    }

    fn global_id(&self) -> String {
        self.payload.backup_id.clone()
    }

    fn status(&self) -> String {
        match self.payload.backup_status.as_str() {
            "completed" => status::READY.to_string(),
            "pending" => status::CREATING.to_string(),
            _ => status::FAILED.to_string(),
        }
    }

    async fn set_tags(&self, _tags: TagSet, _replace: bool) -> Result<()> {
        Ok(())
    }

    async fn refresh(&mut self) -> Result<()> {
        let mut matches = self
            .region
            .list_instance_backups("", &self.payload.backup_id)
            .await?;
        let fresh = match matches.pop() {
            Some(backup) if matches.is_empty() => backup,
            _ => {
                return Err(Error::not_found(format!(
                    "instance backup {}",
                    self.payload.backup_id
                )))
            }
        };
        value::overlay(&mut self.payload, &serde_json::to_value(fresh.payload)?)
    }
}

#[async_trait]
impl CloudInstanceBackup for InstanceBackup {
    fn instance_id(&self) -> String {
        self.payload.instance_id.clone()
    }

    async fn restore(&self) -> Result<()> {
        let params = vec![("BackupId".to_string(), self.payload.backup_id.clone())];
        self.region.invoke("RestoreFromInstanceBackup", params).await?;
        Ok(())
    }

    async fn delete(&self) -> Result<()> {
        let params = vec![("BackupId".to_string(), self.payload.backup_id.clone())];
        self.region.invoke("DeleteInstanceBackup", params).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::region::test_region;

    #[test]
    fn test_backup_list_decodes_nested_result() -> anyhow::Result<()> {
        let tree = json!({
            "describeInstanceBackupsResult": {
                "instanceBackups": [{
                    "backupId": "bak-1",
                    "instanceId": "i-1",
                    "backupStatus": "completed",
                    "blockDeviceMapping": [{
                        "deviceName": "/dev/vda",
                        "isRoot": "true",
                        "volumeId": "vol-1"
                    }]
                }]
            }
        });
        let payloads: Vec<InstanceBackupPayload> =
            value::decode_list_at(&tree, &["describeInstanceBackupsResult", "instanceBackups"])?;
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].backup_id, "bak-1");
        assert_eq!(payloads[0].block_device_mapping[0].is_root, "true");
        Ok(())
    }

    #[test]
    fn test_status_falls_back_to_failed() {
        let backup = InstanceBackup {
            region: test_region(),
            payload: InstanceBackupPayload {
                backup_status: "exploded".to_string(),
                ..Default::default()
            },
        };
        assert_eq!(backup.status(), status::FAILED);
    }
}
