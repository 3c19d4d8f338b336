use std::collections::HashMap;

use async_trait::async_trait;

use super::resource::CloudResource;
use crate::time::DateTime;
use crate::Result;

/// Where a load balancer's address is reachable from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressType {
    /// VPC-internal address.
    Intranet,
    /// Public address.
    Internet,
}

impl AddressType {
    /// Stable string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressType::Intranet => "intranet",
            AddressType::Internet => "internet",
        }
    }
}

impl std::fmt::Display for AddressType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Protocol a listener (or target group) speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerProtocol {
    /// Plain TCP.
    Tcp,
    /// Plain UDP.
    Udp,
    /// HTTP.
    Http,
    /// HTTPS.
    Https,
    /// TCP and UDP on the same port.
    TcpUdp,
}

impl ListenerProtocol {
    /// Stable string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            ListenerProtocol::Tcp => "tcp",
            ListenerProtocol::Udp => "udp",
            ListenerProtocol::Http => "http",
            ListenerProtocol::Https => "https",
            ListenerProtocol::TcpUdp => "tcp_udp",
        }
    }
}

impl std::fmt::Display for ListenerProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Balancing algorithm of a backend group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scheduler {
    /// Round robin.
    Rr,
    /// Weighted round robin.
    Wrr,
    /// Weighted least connections.
    Wlc,
    /// Source hashing.
    Sch,
    /// Provider algorithm with no equivalent here.
    Other(String),
}

impl Scheduler {
    /// Stable string form.
    pub fn as_str(&self) -> &str {
        match self {
            Scheduler::Rr => "rr",
            Scheduler::Wrr => "wrr",
            Scheduler::Wlc => "wlc",
            Scheduler::Sch => "sch",
            Scheduler::Other(s) => s,
        }
    }
}

impl std::fmt::Display for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of object a backend group points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendType {
    /// Virtual machine instances.
    Guest,
    /// Network interfaces.
    NetworkInterface,
    /// Raw IP addresses.
    Ip,
    /// Provider target kind with no equivalent here.
    Other(String),
}

impl BackendType {
    /// Stable string form.
    pub fn as_str(&self) -> &str {
        match self {
            BackendType::Guest => "guest",
            BackendType::NetworkInterface => "network-interface",
            BackendType::Ip => "ip",
            BackendType::Other(s) => s,
        }
    }
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for BackendType {
    fn default() -> Self {
        BackendType::Guest
    }
}

/// Health check settings of a backend group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthCheck {
    /// Whether checking is turned on.
    pub enabled: bool,
    /// Check protocol, lowercased.
    pub check_type: String,
    /// Request path for HTTP-style checks.
    pub uri: String,
    /// Successes before a backend counts healthy.
    pub rise: i64,
    /// Failures before a backend counts unhealthy.
    pub fall: i64,
    /// Seconds between checks.
    pub interval_seconds: i64,
    /// Seconds before a check attempt gives up.
    pub timeout_seconds: i64,
    /// Comma-joined `http_2xx`/`http_3xx`/`http_4xx` classes counted as
    /// healthy.
    pub http_codes: String,
}

/// Cookie-based session stickiness of a backend group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StickySession {
    /// Whether stickiness is turned on.
    pub enabled: bool,
    /// How the cookie is produced; `insert` means the balancer sets it.
    pub session_type: String,
    /// Cookie lifetime in seconds, 0 when the provider does not say.
    pub cookie_timeout_seconds: i64,
}

/// Parameters for creating a load balancer.
#[derive(Debug, Clone, Default)]
pub struct LoadbalancerCreateOptions {
    /// Balancer name.
    pub name: String,
    /// VPC to create the balancer in.
    pub vpc_id: String,
    /// Subnets the balancer spans.
    pub network_ids: Vec<String>,
}

/// Parameters for creating a backend group.
#[derive(Debug, Clone, Default)]
pub struct BackendGroupCreateOptions {
    /// Group name.
    pub name: String,
    /// Listener protocol the group serves.
    pub protocol: Option<ListenerProtocol>,
    /// Port the backends receive traffic on.
    pub port: i64,
    /// VPC the targets live in.
    pub vpc_id: String,
    /// Kind of object the group points at.
    pub backend_type: BackendType,
    /// Health checking, when wanted from the start.
    pub health_check: Option<HealthCheck>,
}

/// A load balancer.
#[async_trait]
pub trait CloudLoadbalancer: CloudResource {
    /// Concrete backend group type.
    type BackendGroup: CloudLoadbalancerBackendGroup;

    /// Serving address (hostname or IP).
    fn address(&self) -> String;

    /// Whether the address is public or VPC-internal.
    fn address_type(&self) -> AddressType;

    /// Network flavor, `vpc` for VPC-backed balancers.
    fn network_type(&self) -> String;

    /// Subnets the balancer spans.
    fn network_ids(&self) -> Vec<String>;

    /// VPC the balancer lives in.
    fn vpc_id(&self) -> String;

    /// Primary zone.
    fn zone_id(&self) -> String;

    /// Provider flavor or instance class.
    fn spec(&self) -> String;

    /// Billing mode.
    fn charge_type(&self) -> String;

    /// Outbound bandwidth cap in Mbps, 0 when uncapped or unreported.
    fn egress_mbps(&self) -> i64;

    /// Provider attributes as a key-value map.
    async fn attributes(&self) -> Result<HashMap<String, String>>;

    /// All backend groups of this balancer.
    async fn backend_groups(&self) -> Result<Vec<Self::BackendGroup>>;

    /// One backend group by id.
    async fn backend_group_by_id(&self, id: &str) -> Result<Self::BackendGroup>;

    /// Create a backend group on this balancer's VPC.
    async fn create_backend_group(
        &self,
        opts: &BackendGroupCreateOptions,
    ) -> Result<Self::BackendGroup>;

    /// Start serving. Providers whose balancers are always on accept this
    /// as a no-op.
    async fn start(&self) -> Result<()>;

    /// Stop serving.
    async fn stop(&self) -> Result<()>;

    /// Delete the balancer and anything it exclusively owns.
    async fn delete(&self) -> Result<()>;
}

/// A group of backends sharing protocol, port and health checking.
#[async_trait]
pub trait CloudLoadbalancerBackendGroup: CloudResource {
    /// Concrete backend type.
    type Backend: CloudLoadbalancerBackend;

    /// Protocol the group serves, when recognized.
    fn protocol_type(&self) -> Option<ListenerProtocol>;

    /// Kind of object the group points at.
    fn backend_type(&self) -> BackendType;

    /// Balancing algorithm, when the provider reports one.
    async fn scheduler(&self) -> Result<Option<Scheduler>>;

    /// Health check settings.
    async fn health_check(&self) -> Result<Option<HealthCheck>>;

    /// Session stickiness settings, when the provider reports them.
    async fn sticky_session(&self) -> Result<Option<StickySession>>;

    /// All backends in the group.
    async fn backends(&self) -> Result<Vec<Self::Backend>>;

    /// One backend by its id.
    async fn backend_by_id(&self, id: &str) -> Result<Self::Backend>;

    /// Register a server on `port` with `weight`.
    async fn add_backend(&self, server_id: &str, weight: i64, port: i64) -> Result<Self::Backend>;

    /// Deregister a server from `port`.
    async fn remove_backend(&self, server_id: &str, port: i64) -> Result<()>;

    /// Delete the group.
    async fn delete(&self) -> Result<()>;
}

/// One registered backend of a backend group.
#[async_trait]
pub trait CloudLoadbalancerBackend: CloudResource {
    /// Relative weight for weighted schedulers.
    fn weight(&self) -> i64;

    /// Port traffic is forwarded to.
    fn port(&self) -> i64;

    /// Kind of object this backend is.
    fn backend_type(&self) -> BackendType;

    /// Role within the group.
    fn backend_role(&self) -> String;

    /// Id of the backing object (instance, interface, ...).
    fn backend_id(&self) -> String;

    /// Address traffic is forwarded to, when reported.
    fn ip_address(&self) -> String;

    /// Move this backend to a new port/weight.
    ///
    /// Providers that key backends by port implement this as deregister +
    /// register; `self` afterwards describes the re-registered backend,
    /// including a changed id.
    async fn sync_conf(&mut self, port: i64, weight: i64) -> Result<()>;
}

/// A server certificate usable by HTTPS listeners.
#[async_trait]
pub trait CloudLoadbalancerCertificate: CloudResource {
    /// Subject common name, empty when the provider does not expose the
    /// parsed subject.
    fn common_name(&self) -> String;

    /// Comma-joined subject alternative names, empty when unavailable.
    fn subject_alternative_names(&self) -> String;

    /// Expiry time, when reported.
    fn expire_time(&self) -> Option<DateTime>;

    /// `sha1:aa:bb:...` fingerprint over the PEM body, empty when the
    /// provider reports no body.
    ///
    /// Async because list calls usually omit the body and it has to be
    /// fetched on first use.
    async fn fingerprint(&mut self) -> Result<String>;

    /// PEM certificate body, fetched on first use.
    async fn public_key(&mut self) -> Result<String>;

    /// Private key, empty for providers that never return it.
    fn private_key(&self) -> String;

    /// Delete the certificate.
    async fn delete(&self) -> Result<()>;
}
