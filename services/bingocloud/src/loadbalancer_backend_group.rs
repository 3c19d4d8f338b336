use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stratus_core::model::{
    status, BackendGroupCreateOptions, BackendType, CloudLoadbalancerBackendGroup, CloudResource,
    HealthCheck, ListenerProtocol, Scheduler, StickySession, TagSet,
};
use stratus_core::{value, Error, Result};

use crate::loadbalancer::{attributes_to_map, AttributePayload};
use crate::loadbalancer_backend::{backend_composite_id, parse_backend_id, Backend};
use crate::region::Region;

/// A target group: backends sharing protocol, port and health checking.
#[derive(Debug, Clone)]
pub struct BackendGroup {
    pub(crate) region: Region,
    pub(crate) payload: TargetGroupPayload,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub(crate) struct TargetGroupPayload {
    pub(crate) created_time: String,
    pub(crate) target_group_arn: String,
    pub(crate) target_group_id: String,
    pub(crate) load_balancer_arns: Vec<String>,
    pub(crate) target_group_name: String,
    pub(crate) display_name: String,
    pub(crate) target_type: String,
    pub(crate) vpc_id: String,
    pub(crate) owner_id: String,
    pub(crate) protocol: String,
    pub(crate) port: String,
    pub(crate) health_check_enabled: String,
    pub(crate) health_check_interval_seconds: String,
    pub(crate) health_check_method: String,
    pub(crate) health_check_path: String,
    pub(crate) health_check_port: String,
    pub(crate) health_check_protocol: String,
    pub(crate) health_check_timeout_seconds: String,
    pub(crate) healthy_threshold_count: String,
    pub(crate) unhealthy_threshold_count: String,
    pub(crate) matcher: MatcherPayload,
    pub(crate) description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub(crate) struct MatcherPayload {
    pub(crate) http_code: String,
}

fn push_class(classes: &mut Vec<&'static str>, class: &'static str) {
    if !classes.contains(&class) {
        classes.push(class);
    }
}

fn push_code_class(classes: &mut Vec<&'static str>, code: i64) {
    if code >= 400 {
        push_class(classes, "http_4xx");
    } else if code >= 300 {
        push_class(classes, "http_3xx");
    } else if code >= 200 {
        push_class(classes, "http_2xx");
    }
}

/// Collapses the provider's `Matcher.HttpCode` codes and ranges into the
/// coarse `http_2xx`-style classes of [`HealthCheck::http_codes`].
pub(crate) fn to_health_codes(http_code: &str) -> String {
    let mut classes: Vec<&'static str> = Vec::new();
    for part in http_code.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let bounds: Vec<i64> = part
            .splitn(2, '-')
            .filter_map(|bound| bound.trim().parse().ok())
            .collect();
        match bounds.as_slice() {
            [code] => push_code_class(&mut classes, *code),
            [min, max] => {
                push_code_class(&mut classes, *min);
                push_code_class(&mut classes, *max);
                // A range spanning the 3xx band covers it even though
                // neither endpoint lands in it.
                if *min >= 200 && *max >= 400 {
                    push_class(&mut classes, "http_3xx");
                }
            }
            _ => {}
        }
    }
    classes.join(",")
}

impl Region {
    pub(crate) async fn target_groups(&self, target_group_id: &str) -> Result<Vec<BackendGroup>> {
        let mut params = Vec::new();
        if !target_group_id.is_empty() {
            params.push((
                "TargetGroupArns.member.1".to_string(),
                target_group_id.to_string(),
            ));
        }
        params.push(("ownerId".to_string(), self.client.account_user().await));
        let resp = self.invoke("DescribeTargetGroups", params).await?;
        let payloads: Vec<TargetGroupPayload> =
            value::decode_list_at(&resp, &["DescribeTargetGroupsResult", "TargetGroups"])?;
        Ok(payloads
            .into_iter()
            .map(|payload| BackendGroup {
                region: self.clone(),
                payload,
            })
            .collect())
    }

    /// One backend group by id.
    pub async fn target_group(&self, id: &str) -> Result<BackendGroup> {
        self.target_groups(id)
            .await?
            .into_iter()
            .find(|group| group.payload.target_group_id == id)
            .ok_or_else(|| Error::not_found(format!("backend group {id}")))
    }

    pub(crate) async fn create_target_group(
        &self,
        opts: &BackendGroupCreateOptions,
        vpc_id: &str,
    ) -> Result<BackendGroup> {
        let protocol = opts
            .protocol
            .map(|protocol| protocol.as_str().to_uppercase())
            .unwrap_or_default();
        let target_type = match &opts.backend_type {
            BackendType::Guest => "instance".to_string(),
            BackendType::NetworkInterface => "network-interface".to_string(),
            BackendType::Ip => "ip".to_string(),
            BackendType::Other(other) => other.clone(),
        };
        let mut params = vec![
            ("Name".to_string(), opts.name.clone()),
            ("Protocol".to_string(), protocol),
            ("Port".to_string(), opts.port.to_string()),
            ("TargetType".to_string(), target_type),
            ("VpcId".to_string(), vpc_id.to_string()),
        ];
        match &opts.health_check {
            Some(check) if check.enabled => {
                params.push(("HealthCheckEnabled".to_string(), "true".to_string()));
                params.push((
                    "HealthCheckIntervalSeconds".to_string(),
                    check.interval_seconds.to_string(),
                ));
                params.push(("HealthCheckPath".to_string(), check.uri.clone()));
                params.push((
                    "HealthCheckProtocol".to_string(),
                    check.check_type.to_uppercase(),
                ));
                params.push((
                    "HealthCheckTimeoutSeconds".to_string(),
                    check.timeout_seconds.to_string(),
                ));
                params.push(("HealthyThresholdCount".to_string(), check.rise.to_string()));
                params.push((
                    "UnhealthyThresholdCount".to_string(),
                    check.fall.to_string(),
                ));
            }
            _ => params.push(("HealthCheckEnabled".to_string(), "false".to_string())),
        }
        let resp = self.invoke("CreateTargetGroup", params).await?;
        let payloads: Vec<TargetGroupPayload> =
            value::decode_list_at(&resp, &["CreateTargetGroupResult", "TargetGroups"])?;
        payloads
            .into_iter()
            .next()
            .map(|payload| BackendGroup {
                region: self.clone(),
                payload,
            })
            .ok_or_else(|| Error::not_found("backend group after create"))
    }

    pub(crate) async fn target_group_attributes(
        &self,
        target_group_id: &str,
    ) -> Result<HashMap<String, String>> {
        let params = vec![("TargetGroupArn".to_string(), target_group_id.to_string())];
        let resp = self.invoke("DescribeTargetGroupAttributes", params).await?;
        let attributes: Vec<AttributePayload> =
            value::decode_list_at(&resp, &["DescribeTargetGroupAttributesResult", "Attributes"])?;
        Ok(attributes_to_map(attributes))
    }

    pub(crate) async fn register_target(
        &self,
        target_group_id: &str,
        server_id: &str,
        weight: i64,
        port: i64,
    ) -> Result<()> {
        let params = vec![
            ("TargetGroupArn".to_string(), target_group_id.to_string()),
            ("Targets.member.1.Id".to_string(), server_id.to_string()),
            ("Targets.member.1.Port".to_string(), port.to_string()),
            ("Targets.member.1.Weight".to_string(), weight.to_string()),
        ];
        self.invoke("RegisterTargets", params).await?;
        Ok(())
    }

    pub(crate) async fn deregister_target(
        &self,
        target_group_id: &str,
        server_id: &str,
        port: i64,
    ) -> Result<()> {
        let params = vec![
            ("TargetGroupArn".to_string(), target_group_id.to_string()),
            ("Targets.member.1.Id".to_string(), server_id.to_string()),
            ("Targets.member.1.Port".to_string(), port.to_string()),
        ];
        self.invoke("DeregisterTargets", params).await?;
        Ok(())
    }
}

#[async_trait]
impl CloudResource for BackendGroup {
    fn id(&self) -> String {
        self.payload.target_group_id.clone()
    }

    fn name(&self) -> String {
        if self.payload.display_name.is_empty() {
            self.payload.target_group_id.clone()
        } else {
            self.payload.display_name.clone()
        }
    }

    fn global_id(&self) -> String {
        self.payload.target_group_id.clone()
    }

    fn status(&self) -> String {
        status::ENABLED.to_string()
    }

    fn sys_tags(&self) -> TagSet {
        let mut tags = TagSet::new();
        tags.insert("port".to_string(), self.payload.port.clone());
        tags.insert("target_type".to_string(), self.payload.target_type.clone());
        tags.insert(
            "health_check_protocol".to_string(),
            self.payload.health_check_protocol.to_lowercase(),
        );
        tags.insert(
            "health_check_interval".to_string(),
            self.payload.health_check_interval_seconds.clone(),
        );
        tags
    }

    async fn refresh(&mut self) -> Result<()> {
        let fresh = self.region.target_group(&self.payload.target_group_id).await?;
        value::overlay(&mut self.payload, &serde_json::to_value(fresh.payload)?)
    }
}

#[async_trait]
impl CloudLoadbalancerBackendGroup for BackendGroup {
    type Backend = Backend;

    fn protocol_type(&self) -> Option<ListenerProtocol> {
        match self.payload.protocol.as_str() {
            "TCP" => Some(ListenerProtocol::Tcp),
            "UDP" => Some(ListenerProtocol::Udp),
            "HTTP" => Some(ListenerProtocol::Http),
            "HTTPS" => Some(ListenerProtocol::Https),
            "TCP_UDP" => Some(ListenerProtocol::TcpUdp),
            _ => None,
        }
    }

    fn backend_type(&self) -> BackendType {
        match self.payload.target_type.as_str() {
            "instance" => BackendType::Guest,
            "network-interface" => BackendType::NetworkInterface,
            "ip" => BackendType::Ip,
            other => BackendType::Other(other.to_string()),
        }
    }

    async fn scheduler(&self) -> Result<Option<Scheduler>> {
        let attributes = self
            .region
            .target_group_attributes(&self.payload.target_group_id)
            .await?;
        Ok(attributes
            .get("load_balancing.method")
            .map(|method| match method.as_str() {
                "round_robin" => Scheduler::Rr,
                "weighted_round_robin" => Scheduler::Wrr,
                "least_conn" => Scheduler::Wlc,
                "ip_hash" => Scheduler::Sch,
                other => Scheduler::Other(other.to_string()),
            }))
    }

    async fn health_check(&self) -> Result<Option<HealthCheck>> {
        Ok(Some(HealthCheck {
            enabled: self.payload.health_check_enabled == "true",
            check_type: self.payload.health_check_protocol.to_lowercase(),
            uri: self.payload.health_check_path.clone(),
            rise: self.payload.healthy_threshold_count.parse().unwrap_or(0),
            fall: self.payload.unhealthy_threshold_count.parse().unwrap_or(0),
            interval_seconds: self
                .payload
                .health_check_interval_seconds
                .parse()
                .unwrap_or(0),
            timeout_seconds: self
                .payload
                .health_check_timeout_seconds
                .parse()
                .unwrap_or(0),
            http_codes: to_health_codes(&self.payload.matcher.http_code),
        }))
    }

    async fn sticky_session(&self) -> Result<Option<StickySession>> {
        let attributes = self
            .region
            .target_group_attributes(&self.payload.target_group_id)
            .await?;
        let Some(enabled) = attributes.get("stickiness.enabled") else {
            return Ok(None);
        };
        let cookie_timeout_seconds = attributes
            .get("stickiness.lb_cookie.duration_seconds")
            .and_then(|seconds| seconds.parse().ok())
            .unwrap_or(0);
        Ok(Some(StickySession {
            enabled: enabled == "true",
            session_type: "insert".to_string(),
            cookie_timeout_seconds,
        }))
    }

    async fn backends(&self) -> Result<Vec<Backend>> {
        let payloads = self
            .region
            .target_healths(&self.payload.target_group_id)
            .await?;
        Ok(payloads
            .into_iter()
            .map(|payload| Backend {
                group: self.clone(),
                payload,
            })
            .collect())
    }

    async fn backend_by_id(&self, id: &str) -> Result<Backend> {
        self.region.elb_backend(id).await
    }

    async fn add_backend(&self, server_id: &str, weight: i64, port: i64) -> Result<Backend> {
        self.region
            .register_target(&self.payload.target_group_id, server_id, weight, port)
            .await?;
        self.region
            .elb_backend(&backend_composite_id(
                &self.payload.target_group_id,
                server_id,
                port,
            ))
            .await
    }

    async fn remove_backend(&self, server_id: &str, port: i64) -> Result<()> {
        // Callers sometimes hand back the full backend id; peel it down to
        // the server id the provider expects.
        let server_id = match parse_backend_id(server_id) {
            Ok((_, target_id, _)) => target_id,
            Err(_) => server_id.to_string(),
        };
        self.region
            .deregister_target(&self.payload.target_group_id, &server_id, port)
            .await
    }

    async fn delete(&self) -> Result<()> {
        let params = vec![(
            "TargetGroupArn".to_string(),
            self.payload.target_group_id.clone(),
        )];
        self.region.invoke("DeleteTargetGroup", params).await?;
        Ok(())
    }
}
