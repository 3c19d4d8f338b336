use async_trait::async_trait;

use super::disk::{CloudDisk, DiskCreateConfig};
use super::resource::CloudResource;
use crate::Result;

/// A block-storage pool that disks are carved out of.
#[async_trait]
pub trait CloudStorage: CloudResource {
    /// Concrete disk type this storage produces.
    type Disk: CloudDisk;

    /// Provider storage type (local, shared, ...), lowercased.
    fn storage_type(&self) -> String;

    /// Zone the storage lives in, when scoped to one.
    fn zone_id(&self) -> String;

    /// Total capacity in megabytes, 0 when unreported.
    fn capacity_mb(&self) -> i64;

    /// Whether new disks may be placed here.
    fn enabled(&self) -> bool;

    /// All disks on this storage owned by the current account.
    async fn disks(&self) -> Result<Vec<Self::Disk>>;

    /// One disk by id; not-found when it exists on another storage.
    async fn disk_by_id(&self, id: &str) -> Result<Self::Disk>;

    /// Create a disk on this storage.
    async fn create_disk(&self, config: &DiskCreateConfig) -> Result<Self::Disk>;
}
