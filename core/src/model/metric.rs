use crate::time::DateTime;

/// Kind of resource a monitoring query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricResourceType {
    /// Virtual machines.
    Server,
    /// Hypervisor hosts.
    Host,
    /// Load balancers.
    LoadBalancer,
}

impl MetricResourceType {
    /// Stable string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricResourceType::Server => "server",
            MetricResourceType::Host => "host",
            MetricResourceType::LoadBalancer => "loadbalancer",
        }
    }
}

impl std::fmt::Display for MetricResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Measurement kinds the drivers report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricType {
    /// CPU usage percentage.
    CpuUsage,
    /// Memory usage percentage.
    MemUsage,
    /// Disk usage percentage.
    DiskUsage,
    /// Disk read throughput, bytes per second.
    DiskReadBps,
    /// Disk write throughput, bytes per second.
    DiskWriteBps,
    /// Disk read operations per second.
    DiskReadIops,
    /// Disk write operations per second.
    DiskWriteIops,
    /// Network receive throughput, bytes per second.
    NetBpsRx,
    /// Network transmit throughput, bytes per second.
    NetBpsTx,
    /// Backends currently failing health checks.
    LbUnhealthyServerCount,
    /// Connections held open through the balancer.
    LbMaxConnection,
}

impl MetricType {
    /// Stable string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::CpuUsage => "cpu_usage",
            MetricType::MemUsage => "mem_usage",
            MetricType::DiskUsage => "disk_usage",
            MetricType::DiskReadBps => "disk_read_bps",
            MetricType::DiskWriteBps => "disk_write_bps",
            MetricType::DiskReadIops => "disk_read_iops",
            MetricType::DiskWriteIops => "disk_write_iops",
            MetricType::NetBpsRx => "net_bps_rx",
            MetricType::NetBpsTx => "net_bps_tx",
            MetricType::LbUnhealthyServerCount => "lb_unhealthy_server_count",
            MetricType::LbMaxConnection => "lb_max_connection",
        }
    }
}

impl std::fmt::Display for MetricType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time range and target of a monitoring query.
#[derive(Debug, Clone)]
pub struct MetricListOptions {
    /// Kind of resource to query.
    pub resource_type: MetricResourceType,
    /// Start of the range, inclusive.
    pub since: DateTime,
    /// End of the range, exclusive.
    pub until: DateTime,
}

/// One measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricValue {
    /// When the measurement was taken.
    pub timestamp: DateTime,
    /// Measured value.
    pub value: f64,
}

/// All measurements of one metric on one resource, in report order.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricValues {
    /// Resource the measurements belong to.
    pub resource_id: String,
    /// What was measured.
    pub metric_type: MetricType,
    /// The measurements.
    pub values: Vec<MetricValue>,
}
