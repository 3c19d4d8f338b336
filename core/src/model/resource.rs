use std::collections::HashMap;
use std::fmt::Debug;

use async_trait::async_trait;

use crate::time::DateTime;
use crate::{Error, Result};

/// Key-value tags attached to a cloud resource.
pub type TagSet = HashMap<String, String>;

/// Status vocabulary shared by the resource adapters.
///
/// Providers report their own words; adapters map them onto this set and
/// pass anything unrecognized through as-is.
pub mod status {
    /// Resource is usable.
    pub const READY: &str = "ready";
    /// Resource is still being created.
    pub const CREATING: &str = "creating";
    /// Creation failed.
    pub const FAILED: &str = "failed";
    /// Provider reported a state outside the known vocabulary.
    pub const UNKNOWN: &str = "unknown";
    /// Generic "present and available" state for resources without a
    /// lifecycle of their own.
    pub const AVAILABLE: &str = "available";

    /// Load balancer is provisioning.
    pub const INIT: &str = "init";
    /// Load balancer (or a dependent object) is serving.
    pub const ENABLED: &str = "enabled";
    /// Load balancer failed to come up.
    pub const START_FAILED: &str = "start_failed";
}

/// What a provider account can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Virtual machines.
    Compute,
    /// VPCs and subnets.
    Network,
    /// Security groups.
    SecurityGroup,
    /// Elastic IPs.
    Eip,
    /// Load balancers.
    Loadbalancer,
    /// Object storage.
    ObjectStore,
}

impl Capability {
    /// Stable string form of the capability.
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Compute => "compute",
            Capability::Network => "network",
            Capability::SecurityGroup => "security_group",
            Capability::Eip => "eip",
            Capability::Loadbalancer => "loadbalancer",
            Capability::ObjectStore => "objectstore",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Base surface every cloud resource exposes.
///
/// Identity accessors return owned strings because adapters assemble some
/// of them (composite ids, fallbacks to the raw id) rather than storing
/// them verbatim.
#[async_trait]
pub trait CloudResource: Debug + Send + Sync {
    /// Provider-local identifier.
    fn id(&self) -> String;

    /// Human-facing name, falling back to the id when the provider has none.
    fn name(&self) -> String;

    /// Identifier that is stable across accounts and regions.
    fn global_id(&self) -> String;

    /// Current status, using the [`status`] vocabulary where possible.
    fn status(&self) -> String;

    /// Creation time, when the provider reports one.
    fn created_at(&self) -> Option<DateTime> {
        None
    }

    /// Whether this resource exists only as a driver-side construct.
    fn is_emulated(&self) -> bool {
        false
    }

    /// Owning project, when the provider scopes resources below the account.
    fn project_id(&self) -> String {
        String::new()
    }

    /// Provider-maintained metadata exposed as tags.
    fn sys_tags(&self) -> TagSet {
        TagSet::new()
    }

    /// User-assigned tags.
    fn tags(&self) -> TagSet {
        TagSet::new()
    }

    /// Replace or merge user-assigned tags.
    async fn set_tags(&self, tags: TagSet, replace: bool) -> Result<()> {
        let _ = (tags, replace);
        Err(Error::unsupported("tag editing is not supported here"))
    }

    /// Re-fetch this resource and fold the fresh payload into `self`.
    ///
    /// Fields the provider omits from the fresh payload keep their current
    /// values; see [`crate::value::overlay`].
    async fn refresh(&mut self) -> Result<()>;
}
