use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stratus_core::model::{
    status, BackendType, CloudLoadbalancerBackend, CloudLoadbalancerBackendGroup, CloudResource,
};
use stratus_core::{value, Error, Result};

use crate::loadbalancer_backend_group::BackendGroup;
use crate::region::Region;

/// One registered target of a backend group.
///
/// The provider keys targets by group, server and port, so the id here is
/// the composite `group::server::port`.
#[derive(Debug, Clone)]
pub struct Backend {
    pub(crate) group: BackendGroup,
    pub(crate) payload: BackendPayload,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub(crate) struct BackendPayload {
    pub(crate) health_check_port: String,
    pub(crate) target: TargetPayload,
    pub(crate) target_health: TargetHealthPayload,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub(crate) struct TargetPayload {
    pub(crate) id: String,
    pub(crate) port: String,
    pub(crate) weight: String,
    pub(crate) address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub(crate) struct TargetHealthPayload {
    pub(crate) reason: String,
    pub(crate) state: String,
}

pub(crate) fn backend_composite_id(group_id: &str, target_id: &str, port: i64) -> String {
    format!("{group_id}::{target_id}::{port}")
}

pub(crate) fn parse_backend_id(id: &str) -> Result<(String, String, i64)> {
    let parts: Vec<&str> = id.split("::").collect();
    let [group_id, target_id, port] = parts.as_slice() else {
        return Err(Error::unexpected(format!("{id} is not a valid backend id")));
    };
    let port = port
        .parse()
        .map_err(|_| Error::unexpected(format!("{id} is not a valid backend id")))?;
    Ok((group_id.to_string(), target_id.to_string(), port))
}

impl Region {
    pub(crate) async fn target_healths(&self, target_group_id: &str) -> Result<Vec<BackendPayload>> {
        let params = vec![("TargetGroupArn".to_string(), target_group_id.to_string())];
        let resp = self.invoke("DescribeTargetHealth", params).await?;
        value::decode_list_at(
            &resp,
            &["DescribeTargetHealthResult", "TargetHealthDescriptions"],
        )
    }

    pub(crate) async fn elb_backend(&self, id: &str) -> Result<Backend> {
        let (group_id, target_id, port) = parse_backend_id(id)?;
        let group = self.target_group(&group_id).await?;
        let params = vec![
            ("TargetGroupArn".to_string(), group_id.clone()),
            ("Targets.member.1.Id".to_string(), target_id.clone()),
            ("Targets.member.1.Port".to_string(), port.to_string()),
        ];
        let resp = self.invoke("DescribeTargetHealth", params).await?;
        let payloads: Vec<BackendPayload> = value::decode_list_at(
            &resp,
            &["DescribeTargetHealthResult", "TargetHealthDescriptions"],
        )?;
        payloads
            .into_iter()
            .find(|payload| {
                payload.target.id == target_id && payload.target.port == port.to_string()
            })
            .map(|payload| Backend { group, payload })
            .ok_or_else(|| Error::not_found(format!("backend {id}")))
    }
}

#[async_trait]
impl CloudResource for Backend {
    fn id(&self) -> String {
        backend_composite_id(
            &self.group.payload.target_group_id,
            &self.payload.target.id,
            self.port(),
        )
    }

    fn name(&self) -> String {
        self.id()
    }

    fn global_id(&self) -> String {
        self.id()
    }

    fn status(&self) -> String {
        status::ENABLED.to_string()
    }

    async fn refresh(&mut self) -> Result<()> {
        let fresh = self.group.region.elb_backend(&self.id()).await?;
        value::overlay(&mut self.payload, &serde_json::to_value(fresh.payload)?)
    }
}

#[async_trait]
impl CloudLoadbalancerBackend for Backend {
    fn weight(&self) -> i64 {
        self.payload.target.weight.parse().unwrap_or(0)
    }

    fn port(&self) -> i64 {
        self.payload.target.port.parse().unwrap_or(0)
    }

    fn backend_type(&self) -> BackendType {
        self.group.backend_type()
    }

    fn backend_role(&self) -> String {
        "default".to_string()
    }

    fn backend_id(&self) -> String {
        self.payload.target.id.clone()
    }

    fn ip_address(&self) -> String {
        self.payload.target.address.clone()
    }

    async fn sync_conf(&mut self, port: i64, weight: i64) -> Result<()> {
        let region = self.group.region.clone();
        let group_id = self.group.payload.target_group_id.clone();
        let target_id = self.payload.target.id.clone();
        region
            .deregister_target(&group_id, &target_id, self.port())
            .await?;
        region
            .register_target(&group_id, &target_id, weight, port)
            .await?;
        let fresh = region
            .elb_backend(&backend_composite_id(&group_id, &target_id, port))
            .await?;
        self.payload = fresh.payload;
        Ok(())
    }
}
