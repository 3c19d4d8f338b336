use async_trait::async_trait;

use super::resource::CloudResource;
use crate::Result;

/// Role a disk plays for its instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskType {
    /// Boot disk.
    Sys,
    /// Additional data disk.
    Data,
}

impl DiskType {
    /// Stable string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            DiskType::Sys => "sys",
            DiskType::Data => "data",
        }
    }
}

impl std::fmt::Display for DiskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters for creating a disk on a storage.
#[derive(Debug, Clone, Default)]
pub struct DiskCreateConfig {
    /// Disk name.
    pub name: String,
    /// Size in gigabytes.
    pub size_gb: i64,
    /// Free-form description.
    pub description: String,
    /// Availability zone to place the disk in.
    pub zone_id: String,
    /// Pin the disk to a specific node, when the provider supports it.
    pub node_id: Option<String>,
    /// Create the disk from a snapshot instead of empty.
    pub snapshot_id: Option<String>,
}

/// A block device.
#[async_trait]
pub trait CloudDisk: CloudResource {
    /// Concrete snapshot type this disk produces.
    type Snapshot: CloudSnapshot;

    /// Boot or data disk.
    fn disk_type(&self) -> DiskType;

    /// On-disk format (raw, qcow2, ...).
    fn disk_format(&self) -> String;

    /// Size in megabytes.
    fn size_mb(&self) -> i64;

    /// Whether the disk dies with its instance.
    fn is_auto_delete(&self) -> bool;

    /// Block driver presented to the guest.
    fn driver(&self) -> String;

    /// Host-side cache mode.
    fn cache_mode(&self) -> String;

    /// Device name on the instance, empty when detached.
    fn mount_point(&self) -> String;

    /// Storage the disk lives on.
    fn storage_id(&self) -> String;

    /// Image the disk was created from.
    ///
    /// Async because some providers only report this on the attached
    /// instance, forcing a lookup.
    async fn template_id(&self) -> Result<String>;

    /// Delete the disk.
    async fn delete(&self) -> Result<()>;

    /// Grow the disk to `new_size_mb`.
    async fn resize(&self, new_size_mb: i64) -> Result<()>;

    /// Roll the disk back to a snapshot.
    ///
    /// Providers without in-place rollback recreate the disk from the
    /// snapshot and swap attachments; the returned id is the disk to use
    /// from now on (it may differ from [`CloudResource::id`]).
    async fn reset(&self, snapshot_id: &str) -> Result<String>;

    /// Snapshot the disk.
    async fn create_snapshot(&self, name: &str, description: &str) -> Result<Self::Snapshot>;

    /// All snapshots of this disk.
    async fn snapshots(&self) -> Result<Vec<Self::Snapshot>>;
}

/// A point-in-time copy of a disk.
#[async_trait]
pub trait CloudSnapshot: CloudResource {
    /// Size of the source disk in megabytes.
    fn size_mb(&self) -> i64;

    /// Disk the snapshot was taken from.
    fn disk_id(&self) -> String;

    /// Role of the source disk.
    fn disk_type(&self) -> DiskType;

    /// Delete the snapshot.
    async fn delete(&self) -> Result<()>;
}

/// A whole-instance backup.
#[async_trait]
pub trait CloudInstanceBackup: CloudResource {
    /// Instance the backup was taken from.
    fn instance_id(&self) -> String;

    /// Roll the instance back to this backup.
    async fn restore(&self) -> Result<()>;

    /// Delete the backup.
    async fn delete(&self) -> Result<()>;
}
