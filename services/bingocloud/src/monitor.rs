use std::collections::HashMap;

use serde::Deserialize;
use stratus_core::model::{
    MetricListOptions, MetricResourceType, MetricType, MetricValue, MetricValues,
};
use stratus_core::{value, Result};

use crate::client::Client;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct StatisticsPage {
    #[serde(rename = "NextToken")]
    next_token: String,
    #[serde(rename = "Datapoints")]
    datapoints: Vec<DatapointPayload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct DatapointPayload {
    resource_id: String,
    metric_name: String,
    average: String,
    timestamp: String,
}

impl Client {
    /// Datapoints for every resource of one kind over a time window,
    /// grouped per resource and metric.
    pub async fn metrics(&self, opts: &MetricListOptions) -> Result<Vec<MetricValues>> {
        let resource = match opts.resource_type {
            MetricResourceType::Server => "Instance",
            MetricResourceType::Host => "Host",
            MetricResourceType::LoadBalancer => "LoadBalancer",
        };
        let points = self.resource_statistics(resource, opts).await?;
        Ok(group_datapoints(opts.resource_type, points))
    }

    async fn resource_statistics(
        &self,
        resource: &str,
        opts: &MetricListOptions,
    ) -> Result<Vec<DatapointPayload>> {
        let mut points = Vec::new();
        let mut next_token = String::new();
        loop {
            let mut params = vec![
                ("ResourceType".to_string(), resource.to_string()),
                ("StartTime".to_string(), opts.since.timestamp().to_string()),
                ("EndTime".to_string(), opts.until.timestamp().to_string()),
            ];
            if !next_token.is_empty() {
                params.push(("NextToken".to_string(), next_token.clone()));
            }
            let resp = self.invoke("GetResourceStatistics", params).await?;
            let page: StatisticsPage = value::decode_at(&resp, &["GetResourceStatisticsResult"])?;
            points.extend(page.datapoints);
            if page.next_token.is_empty() {
                break;
            }
            next_token = page.next_token;
        }
        Ok(points)
    }
}

fn metric_type_for(resource: MetricResourceType, wire: &str) -> Option<MetricType> {
    match resource {
        MetricResourceType::Server => match wire {
            "CPUUtilization" => Some(MetricType::CpuUsage),
            // The provider misspells memory on the wire.
            "MemeryUsage" => Some(MetricType::MemUsage),
            "NetworkIn" => Some(MetricType::NetBpsRx),
            "NetworkOut" => Some(MetricType::NetBpsTx),
            "DiskUsage" => Some(MetricType::DiskUsage),
            "DiskReadBytes" => Some(MetricType::DiskReadBps),
            "DiskWriteBytes" => Some(MetricType::DiskWriteBps),
            "DiskReadOps" => Some(MetricType::DiskReadIops),
            "DiskWriteOps" => Some(MetricType::DiskWriteIops),
            _ => None,
        },
        MetricResourceType::Host => match wire {
            "CPUUtilization" => Some(MetricType::CpuUsage),
            "MemeryUsage" => Some(MetricType::MemUsage),
            "NetworkIn" => Some(MetricType::NetBpsRx),
            "NetworkOut" => Some(MetricType::NetBpsTx),
            "DiskReadBytes" => Some(MetricType::DiskReadBps),
            "DiskWriteBytes" => Some(MetricType::DiskWriteBps),
            "DiskReadOps" => Some(MetricType::DiskReadIops),
            "DiskWriteOps" => Some(MetricType::DiskWriteIops),
            _ => None,
        },
        MetricResourceType::LoadBalancer => match wire {
            "UnHealthyHostCount" => Some(MetricType::LbUnhealthyServerCount),
            "RequestCount" => Some(MetricType::LbMaxConnection),
            _ => None,
        },
    }
}

/// Buckets raw datapoints per resource and metric, keeping datapoint
/// order within each bucket. Unrecognized metric names are dropped.
fn group_datapoints(
    resource: MetricResourceType,
    points: Vec<DatapointPayload>,
) -> Vec<MetricValues> {
    let mut grouped: Vec<MetricValues> = Vec::new();
    let mut index: HashMap<(String, MetricType), usize> = HashMap::new();
    for point in points {
        let Some(metric_type) = metric_type_for(resource, &point.metric_name) else {
            continue;
        };
        let slot = *index
            .entry((point.resource_id.clone(), metric_type))
            .or_insert_with(|| {
                grouped.push(MetricValues {
                    resource_id: point.resource_id.clone(),
                    metric_type,
                    values: Vec::new(),
                });
                grouped.len() - 1
            });
        let timestamp = point.timestamp.parse::<i64>().unwrap_or(0);
        grouped[slot].values.push(MetricValue {
            timestamp: chrono::DateTime::from_timestamp(timestamp, 0)
                .unwrap_or(chrono::DateTime::UNIX_EPOCH),
            value: point.average.parse().unwrap_or(0.0),
        });
    }
    grouped
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use test_case::test_case;

    use super::*;

    #[test_case(MetricResourceType::Server, "CPUUtilization", Some(MetricType::CpuUsage) ; "vm cpu")]
    #[test_case(MetricResourceType::Server, "MemeryUsage", Some(MetricType::MemUsage) ; "vm memory keeps the wire typo")]
    #[test_case(MetricResourceType::Server, "DiskUsage", Some(MetricType::DiskUsage) ; "vm disk usage")]
    #[test_case(MetricResourceType::Host, "DiskUsage", None ; "hosts report no disk usage")]
    #[test_case(MetricResourceType::LoadBalancer, "RequestCount", Some(MetricType::LbMaxConnection) ; "lb connection count")]
    #[test_case(MetricResourceType::Server, "Bogus", None ; "unknown name")]
    fn test_metric_name_mapping(
        resource: MetricResourceType,
        wire: &str,
        want: Option<MetricType>,
    ) {
        assert_eq!(metric_type_for(resource, wire), want);
    }

    #[test]
    fn test_grouping_buckets_per_resource_and_metric() {
        let points = vec![
            DatapointPayload {
                resource_id: "i-1".to_string(),
                metric_name: "CPUUtilization".to_string(),
                average: "12.5".to_string(),
                timestamp: "1700000000".to_string(),
                ..Default::default()
            },
            DatapointPayload {
                resource_id: "i-1".to_string(),
                metric_name: "CPUUtilization".to_string(),
                average: "14.0".to_string(),
                timestamp: "1700000300".to_string(),
                ..Default::default()
            },
            DatapointPayload {
                resource_id: "i-2".to_string(),
                metric_name: "MemeryUsage".to_string(),
                average: "55".to_string(),
                timestamp: "1700000000".to_string(),
                ..Default::default()
            },
            DatapointPayload {
                resource_id: "i-1".to_string(),
                metric_name: "SomethingElse".to_string(),
                average: "1".to_string(),
                timestamp: "1700000000".to_string(),
                ..Default::default()
            },
        ];

        let grouped = group_datapoints(MetricResourceType::Server, points);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].resource_id, "i-1");
        assert_eq!(grouped[0].metric_type, MetricType::CpuUsage);
        assert_eq!(grouped[0].values.len(), 2);
        assert_eq!(grouped[0].values[0].value, 12.5);
        assert_eq!(grouped[0].values[1].value, 14.0);
        assert_eq!(grouped[1].resource_id, "i-2");
        assert_eq!(grouped[1].metric_type, MetricType::MemUsage);
    }

    #[test]
    fn test_statistics_page_decodes() -> anyhow::Result<()> {
        let page: StatisticsPage = serde_json::from_value(json!({
            "NextToken": "42",
            "Datapoints": [{
                "ResourceId": "i-1",
                "MetricName": "NetworkIn",
                "Average": "1024",
                "Timestamp": "1700000000"
            }]
        }))?;
        assert_eq!(page.next_token, "42");
        assert_eq!(page.datapoints.len(), 1);
        assert_eq!(page.datapoints[0].metric_name, "NetworkIn");
        Ok(())
    }
}
