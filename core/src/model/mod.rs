//! Provider-independent resource model.
//!
//! Drivers expose their resources through these capability traits so a
//! consumer can treat disks, balancers or security groups uniformly across
//! providers. Each trait covers one capability; a driver implements only
//! the traits its provider actually supports, and associated types keep
//! navigation (storage to disk, group to backend) within the concrete
//! driver's own types instead of trait objects.

mod disk;
mod loadbalancer;
mod metric;
mod resource;
mod secgroup;
mod storage;

pub use disk::{CloudDisk, CloudInstanceBackup, CloudSnapshot, DiskCreateConfig, DiskType};
pub use loadbalancer::{
    AddressType, BackendGroupCreateOptions, BackendType, CloudLoadbalancer,
    CloudLoadbalancerBackend, CloudLoadbalancerBackendGroup, CloudLoadbalancerCertificate,
    HealthCheck, ListenerProtocol, LoadbalancerCreateOptions, Scheduler, StickySession,
};
pub use metric::{MetricListOptions, MetricResourceType, MetricType, MetricValue, MetricValues};
pub use resource::{status, Capability, CloudResource, TagSet};
pub use secgroup::{
    CloudSecurityGroup, CloudSecurityGroupRule, SecurityGroupRuleCreateOptions,
    SecurityRuleDirection, SecurityRulePolicy,
};
pub use storage::CloudStorage;
