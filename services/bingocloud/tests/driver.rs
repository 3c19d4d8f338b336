//! End-to-end driver tests against a canned-response transport.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use stratus_bingocloud::{Client, Config};
use stratus_core::model::{
    status, CloudLoadbalancer, CloudLoadbalancerBackendGroup, CloudResource, CloudStorage,
    ListenerProtocol, LoadbalancerCreateOptions, MetricListOptions, MetricResourceType,
    MetricType,
};
use stratus_core::{Context, Error, ErrorKind, HttpSend, Result};

/// Transport that records every request and answers from a queue.
#[derive(Debug, Clone, Default)]
struct MockHttpSend {
    state: Arc<MockState>,
}

#[derive(Debug, Default)]
struct MockState {
    responses: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

#[derive(Debug, Clone)]
struct RecordedRequest {
    uri: String,
    body: String,
}

impl MockHttpSend {
    fn push(&self, body: &str) {
        self.state
            .responses
            .lock()
            .unwrap()
            .push_back(body.to_string());
    }

    fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    fn bodies_for(&self, action: &str) -> Vec<String> {
        let needle = format!("Action={action}");
        self.requests()
            .into_iter()
            .filter(|request| request.body.contains(&needle))
            .map(|request| request.body)
            .collect()
    }
}

#[async_trait]
impl HttpSend for MockHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        self.state.requests.lock().unwrap().push(RecordedRequest {
            uri: req.uri().to_string(),
            body: String::from_utf8_lossy(req.body()).to_string(),
        });
        let Some(body) = self.state.responses.lock().unwrap().pop_front() else {
            return Err(Error::unexpected("no canned response left"));
        };
        let resp = http::Response::builder()
            .status(200)
            .body(Bytes::from(body))
            .map_err(|err| {
                Error::unexpected("failed to build canned response").with_source(err)
            })?;
        Ok(resp)
    }
}

const PROBE_HTML: &str = "<html>console</html>";

const REGIONS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<DescribeRegionsResponse>
    <requestId>a1b2</requestId>
    <regionInfo>
        <item>
            <regionId>bj-1</regionId>
            <regionName>Beijing</regionName>
            <regionEndpoint>http://10.0.0.1:8080/api</regionEndpoint>
        </item>
    </regionInfo>
</DescribeRegionsResponse>"#;

const QUOTAS_XML: &str = r#"<DescribeQuotasResponse>
    <quotaSet>
        <item>
            <ownerId>acct-1</ownerId>
            <quotaName>instances</quotaName>
        </item>
    </quotaSet>
</DescribeQuotasResponse>"#;

const STORAGES_XML: &str = r#"<DescribeStoragesResponse>
    <storageSet>
        <item>
            <storageId>pool-1</storageId>
            <storageName>fast-pool</storageName>
            <storageType>LOCAL</storageType>
            <capacity>500</capacity>
            <availabilityZone>az-1</availabilityZone>
        </item>
    </storageSet>
</DescribeStoragesResponse>"#;

const VOLUME_XML: &str = r#"<DescribeVolumesResponse>
    <volumeSet>
        <item>
            <volumeId>vol-1</volumeId>
            <volumeName>data-disk</volumeName>
            <size>40</size>
            <status>available</status>
            <owner>acct-1</owner>
            <storageId>pool-1</storageId>
            <availabilityZone>az-1</availabilityZone>
            <isRoot>false</isRoot>
            <attachmentSet/>
            <createTime>2024-03-01T10:00:00.000Z</createTime>
        </item>
    </volumeSet>
</DescribeVolumesResponse>"#;

// Same volume reported without its name, as sparse list calls do.
const VOLUME_REFRESH_XML: &str = r#"<DescribeVolumesResponse>
    <volumeSet>
        <item>
            <volumeId>vol-1</volumeId>
            <size>40</size>
            <status>error</status>
            <owner>acct-1</owner>
            <storageId>pool-1</storageId>
        </item>
    </volumeSet>
</DescribeVolumesResponse>"#;

const PROVIDER_ERROR_XML: &str = r#"<Response>
    <Errors>
        <Error>
            <Code>InvalidParameterValue</Code>
            <Message>bad zone</Message>
        </Error>
    </Errors>
    <RequestID>f00d</RequestID>
</Response>"#;

fn base_config() -> Config {
    Config::new()
        .with_endpoint("http://10.0.0.1:8080/api")
        .with_access_key_id("AKIDEXAMPLE")
        .with_secret_access_key("SECRETEXAMPLE")
}

async fn new_client_with(mock: &MockHttpSend, config: Config) -> Result<Client> {
    let _ = env_logger::builder().is_test(true).try_init();
    mock.push(PROBE_HTML);
    mock.push(REGIONS_XML);
    let ctx = Context::default().with_http_send(mock.clone());
    Client::new(config, ctx).await
}

async fn new_client(mock: &MockHttpSend) -> Result<Client> {
    new_client_with(mock, base_config()).await
}

#[tokio::test]
async fn test_new_probes_endpoint_and_caches_regions() -> anyhow::Result<()> {
    let mock = MockHttpSend::default();
    let client = new_client(&mock).await?;

    let regions = client.regions();
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].id(), "bj-1");
    assert_eq!(regions[0].name(), "Beijing");

    let requests = mock.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].uri, "http://10.0.0.1:8080/api");

    let listing = &requests[1].body;
    assert!(listing.contains("Action=DescribeRegions"));
    assert!(listing.contains("Version=2009-08-15"));
    assert!(listing.contains("SignatureVersion=2"));
    assert!(listing.contains("SignatureMethod=HmacSHA256"));
    assert!(listing.contains("Signature="));
    Ok(())
}

#[tokio::test]
async fn test_disk_lookup_filters_and_caches_account_owner() -> anyhow::Result<()> {
    let mock = MockHttpSend::default();
    let client = new_client(&mock).await?;
    let region = client.region("bj-1")?;

    mock.push(QUOTAS_XML);
    mock.push(VOLUME_XML);
    let disk = region.disk("vol-1").await?;
    assert_eq!(disk.id(), "vol-1");
    assert_eq!(disk.name(), "data-disk");
    assert_eq!(disk.status(), status::READY);
    assert!(disk.created_at().is_some());

    let listings = mock.bodies_for("DescribeVolumes");
    assert_eq!(listings.len(), 1);
    assert!(listings[0].contains("Filter.1.Name=volume-id"));
    assert!(listings[0].contains("Filter.1.Value.1=vol-1"));
    assert!(listings[0].contains("MaxRecords=1"));

    // The owner id is resolved once per client.
    mock.push(VOLUME_XML);
    region.disk("vol-1").await?;
    assert_eq!(mock.bodies_for("DescribeQuotas").len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_provider_error_envelopes_surface_as_errors() -> anyhow::Result<()> {
    let mock = MockHttpSend::default();
    let client = new_client(&mock).await?;
    let region = client.region("")?;

    mock.push(PROVIDER_ERROR_XML);
    let err = region.instance_backups().await.unwrap_err();
    assert!(err.is_provider_error());
    assert!(err.to_string().contains("InvalidParameterValue"));
    assert!(err.to_string().contains("bad zone"));
    Ok(())
}

#[tokio::test]
async fn test_read_only_account_blocks_writes_before_sending() -> anyhow::Result<()> {
    let mock = MockHttpSend::default();
    let client = new_client_with(&mock, base_config().with_read_only(true)).await?;
    let region = client.region("")?;
    let sent_so_far = mock.requests().len();

    let opts = LoadbalancerCreateOptions {
        name: "edge".to_string(),
        vpc_id: "vpc-1".to_string(),
        network_ids: vec!["subnet-1".to_string()],
    };
    let err = region.create_loadbalancer(&opts).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AccountReadOnly);
    // The rejection happens before anything reaches the transport.
    assert_eq!(mock.requests().len(), sent_so_far);

    // Reads still pass.
    mock.push(STORAGES_XML);
    let storages = region.storages().await?;
    assert_eq!(storages.len(), 1);
    assert_eq!(storages[0].id(), "pool-1");
    Ok(())
}

#[tokio::test]
async fn test_disk_listing_follows_pagination_tokens() -> anyhow::Result<()> {
    let mock = MockHttpSend::default();
    let client = new_client(&mock).await?;
    let region = client.region("bj-1")?;

    mock.push(STORAGES_XML);
    let storage = region.storage_by_id("pool-1").await?;

    // Page tokens appear both beside the result set and inside it,
    // depending on the call; both spellings must be followed.
    mock.push(QUOTAS_XML);
    mock.push(
        r#"<DescribeVolumesResponse>
            <volumeSet>
                <item>
                    <volumeId>vol-a</volumeId>
                    <owner>acct-1</owner>
                    <storageId>pool-1</storageId>
                    <status>available</status>
                </item>
            </volumeSet>
            <nextToken>page-2</nextToken>
        </DescribeVolumesResponse>"#,
    );
    mock.push(
        r#"<DescribeVolumesResponse>
            <volumeSet>
                <item>
                    <volumeId>vol-b</volumeId>
                    <owner>someone-else</owner>
                    <storageId>pool-1</storageId>
                    <status>available</status>
                </item>
                <NextToken>page-3</NextToken>
            </volumeSet>
        </DescribeVolumesResponse>"#,
    );
    mock.push(
        r#"<DescribeVolumesResponse>
            <volumeSet>
                <item>
                    <volumeId>vol-c</volumeId>
                    <owner>acct-1</owner>
                    <storageId>pool-1</storageId>
                    <status>available</status>
                </item>
            </volumeSet>
        </DescribeVolumesResponse>"#,
    );

    let disks = storage.disks().await?;
    let ids: Vec<String> = disks.iter().map(|disk| disk.id()).collect();
    assert_eq!(ids, vec!["vol-a".to_string(), "vol-c".to_string()]);

    let listings = mock.bodies_for("DescribeVolumes");
    assert_eq!(listings.len(), 3);
    assert!(listings.iter().all(|body| body.contains("MaxRecords=20")));
    assert!(!listings[0].contains("NextToken="));
    assert!(listings[1].contains("NextToken=page-2"));
    assert!(listings[2].contains("NextToken=page-3"));
    Ok(())
}

#[tokio::test]
async fn test_refresh_keeps_fields_the_fresh_listing_omits() -> anyhow::Result<()> {
    let mock = MockHttpSend::default();
    let client = new_client(&mock).await?;
    let region = client.region("bj-1")?;

    mock.push(QUOTAS_XML);
    mock.push(VOLUME_XML);
    let mut disk = region.disk("vol-1").await?;
    assert_eq!(disk.name(), "data-disk");
    assert_eq!(disk.status(), status::READY);

    mock.push(VOLUME_REFRESH_XML);
    disk.refresh().await?;
    assert_eq!(disk.status(), "error");
    assert_eq!(disk.name(), "data-disk");
    Ok(())
}

#[tokio::test]
async fn test_metrics_follow_pagination_and_group_points() -> anyhow::Result<()> {
    let mock = MockHttpSend::default();
    let client = new_client(&mock).await?;

    mock.push(
        r#"<GetResourceStatisticsResponse>
            <GetResourceStatisticsResult>
                <Datapoints>
                    <item>
                        <ResourceId>i-1</ResourceId>
                        <MetricName>CPUUtilization</MetricName>
                        <Average>12.5</Average>
                        <Timestamp>1704067500</Timestamp>
                    </item>
                </Datapoints>
                <NextToken>2</NextToken>
            </GetResourceStatisticsResult>
        </GetResourceStatisticsResponse>"#,
    );
    mock.push(
        r#"<GetResourceStatisticsResponse>
            <GetResourceStatisticsResult>
                <Datapoints>
                    <item>
                        <ResourceId>i-1</ResourceId>
                        <MetricName>MemeryUsage</MetricName>
                        <Average>55</Average>
                        <Timestamp>1704067500</Timestamp>
                    </item>
                </Datapoints>
            </GetResourceStatisticsResult>
        </GetResourceStatisticsResponse>"#,
    );

    let opts = MetricListOptions {
        resource_type: MetricResourceType::Server,
        since: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        until: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
    };
    let metrics = client.metrics(&opts).await?;
    assert_eq!(metrics.len(), 2);
    assert_eq!(metrics[0].metric_type, MetricType::CpuUsage);
    assert_eq!(metrics[0].values[0].value, 12.5);
    assert_eq!(metrics[1].metric_type, MetricType::MemUsage);

    let calls = mock.bodies_for("GetResourceStatistics");
    assert_eq!(calls.len(), 2);
    assert!(calls[0].contains("ResourceType=Instance"));
    assert!(calls[0].contains("StartTime=1704067200"));
    assert!(calls[0].contains("EndTime=1704153600"));
    assert!(!calls[0].contains("NextToken="));
    assert!(calls[1].contains("NextToken=2"));
    Ok(())
}

#[tokio::test]
async fn test_backend_groups_filter_by_owning_balancer() -> anyhow::Result<()> {
    let mock = MockHttpSend::default();
    let client = new_client(&mock).await?;
    let region = client.region("bj-1")?;

    mock.push(QUOTAS_XML);
    mock.push(
        r#"<DescribeLoadBalancersResponse>
            <DescribeLoadBalancersResult>
                <LoadBalancers>
                    <member>
                        <LoadBalancerId>lb-1</LoadBalancerId>
                        <LoadBalancerArn>arn:elb/lb-1</LoadBalancerArn>
                        <DisplayName>edge</DisplayName>
                        <Type>application</Type>
                        <DNSName>10.0.0.9</DNSName>
                        <VpcId>vpc-1</VpcId>
                        <State><Code>active</Code></State>
                        <AvailabilityZones>
                            <member>
                                <SubnetId>subnet-1</SubnetId>
                                <ZoneName>az-1</ZoneName>
                            </member>
                        </AvailabilityZones>
                    </member>
                </LoadBalancers>
            </DescribeLoadBalancersResult>
        </DescribeLoadBalancersResponse>"#,
    );
    let balancers = region.loadbalancers().await?;
    assert_eq!(balancers.len(), 1);
    let balancer = &balancers[0];
    assert_eq!(balancer.name(), "edge");
    assert_eq!(balancer.status(), status::ENABLED);
    assert_eq!(balancer.address(), "10.0.0.9");
    assert_eq!(balancer.network_ids(), vec!["subnet-1".to_string()]);

    mock.push(
        r#"<DescribeTargetGroupsResponse>
            <DescribeTargetGroupsResult>
                <TargetGroups>
                    <member>
                        <TargetGroupId>tg-1</TargetGroupId>
                        <TargetGroupName>web</TargetGroupName>
                        <Protocol>HTTP</Protocol>
                        <Port>80</Port>
                        <TargetType>instance</TargetType>
                        <LoadBalancerArns>
                            <member>lb-1</member>
                        </LoadBalancerArns>
                    </member>
                    <member>
                        <TargetGroupId>tg-2</TargetGroupId>
                        <LoadBalancerArns>
                            <member>lb-other</member>
                        </LoadBalancerArns>
                    </member>
                </TargetGroups>
            </DescribeTargetGroupsResult>
        </DescribeTargetGroupsResponse>"#,
    );
    let groups = balancer.backend_groups().await?;
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].id(), "tg-1");
    assert_eq!(groups[0].protocol_type(), Some(ListenerProtocol::Http));

    // The owner lookup from the balancer listing is reused.
    assert_eq!(mock.bodies_for("DescribeQuotas").len(), 1);
    Ok(())
}
