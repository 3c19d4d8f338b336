use std::collections::HashMap;

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use stratus_core::model::{
    status, AddressType, BackendGroupCreateOptions, CloudLoadbalancer,
    CloudLoadbalancerBackendGroup, CloudResource, LoadbalancerCreateOptions, TagSet,
};
use stratus_core::time::{self, DateTime};
use stratus_core::{value, Error, Result};

use crate::loadbalancer_backend_group::BackendGroup;
use crate::region::Region;

/// A v2 load balancer.
#[derive(Debug, Clone)]
pub struct Loadbalancer {
    pub(crate) region: Region,
    pub(crate) payload: ElbPayload,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub(crate) struct ElbPayload {
    #[serde(rename = "Type")]
    pub(crate) load_balancer_type: String,
    pub(crate) load_balancer_name: String,
    pub(crate) display_name: String,
    pub(crate) load_balancer_arn: String,
    pub(crate) load_balancer_version: String,
    pub(crate) load_balancer_id: String,
    pub(crate) owner_id: String,
    pub(crate) availability_zones: Vec<ElbZonePayload>,
    pub(crate) created_time: String,
    #[serde(rename = "DNSName")]
    pub(crate) dns_name: String,
    pub(crate) vip_id: String,
    pub(crate) security_groups: Vec<String>,
    pub(crate) state: ElbStatePayload,
    pub(crate) instance_id: String,
    pub(crate) ip_address_type: String,
    pub(crate) vpc_id: String,
    pub(crate) subnet_id: String,
    pub(crate) nodes: String,
    pub(crate) nodes_count: String,
    pub(crate) replace_unhealthy_node: String,
    pub(crate) description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub(crate) struct ElbZonePayload {
    pub(crate) subnet_id: String,
    pub(crate) zone_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub(crate) struct ElbStatePayload {
    pub(crate) code: String,
}

/// One `Key`/`Value` pair from an attribute listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub(crate) struct AttributePayload {
    pub(crate) key: String,
    pub(crate) value: String,
}

pub(crate) fn attributes_to_map(attributes: Vec<AttributePayload>) -> HashMap<String, String> {
    attributes
        .into_iter()
        .map(|attribute| (attribute.key, attribute.value))
        .collect()
}

impl Region {
    pub(crate) async fn list_loadbalancers(
        &self,
        loadbalancer_id: &str,
    ) -> Result<Vec<Loadbalancer>> {
        let mut params = vec![("LoadBalancerVersion".to_string(), "v2".to_string())];
        if !loadbalancer_id.is_empty() {
            params.push((
                "LoadBalancerArns.member.1".to_string(),
                loadbalancer_id.to_string(),
            ));
        }
        params.push(("ownerId".to_string(), self.client.account_user().await));
        let resp = self.invoke("DescribeLoadBalancers", params).await?;
        let payloads: Vec<ElbPayload> =
            value::decode_list_at(&resp, &["DescribeLoadBalancersResult", "LoadBalancers"])?;
        Ok(payloads
            .into_iter()
            .map(|payload| Loadbalancer {
                region: self.clone(),
                payload,
            })
            .collect())
    }

    /// All load balancers owned by the account.
    pub async fn loadbalancers(&self) -> Result<Vec<Loadbalancer>> {
        self.list_loadbalancers("").await
    }

    /// One load balancer by id.
    pub async fn loadbalancer(&self, id: &str) -> Result<Loadbalancer> {
        self.list_loadbalancers(id)
            .await?
            .into_iter()
            .find(|loadbalancer| loadbalancer.payload.load_balancer_id == id)
            .ok_or_else(|| Error::not_found(format!("load balancer {id}")))
    }

    /// Creates a load balancer and returns it.
    pub async fn create_loadbalancer(
        &self,
        opts: &LoadbalancerCreateOptions,
    ) -> Result<Loadbalancer> {
        let mut params = vec![
            ("Name".to_string(), opts.name.clone()),
            ("VpcId".to_string(), opts.vpc_id.clone()),
        ];
        for (index, network_id) in opts.network_ids.iter().enumerate() {
            params.push((format!("Subnets.member.{}", index + 1), network_id.clone()));
        }
        let resp = self.invoke("CreateLoadBalancer", params).await?;
        let payloads: Vec<ElbPayload> =
            value::decode_list_at(&resp, &["CreateLoadBalancerResult", "LoadBalancers"])?;
        payloads
            .into_iter()
            .next()
            .map(|payload| Loadbalancer {
                region: self.clone(),
                payload,
            })
            .ok_or_else(|| Error::not_found("load balancer after create"))
    }
}

#[async_trait]
impl CloudResource for Loadbalancer {
    fn id(&self) -> String {
        self.payload.load_balancer_id.clone()
    }

    fn name(&self) -> String {
        if self.payload.display_name.is_empty() {
            self.payload.load_balancer_id.clone()
        } else {
            self.payload.display_name.clone()
        }
    }

    fn global_id(&self) -> String {
        self.payload.load_balancer_id.clone()
    }

    fn status(&self) -> String {
        match self.payload.state.code.as_str() {
            "provisioning" => status::INIT.to_string(),
            "active" => status::ENABLED.to_string(),
            "failed" => status::START_FAILED.to_string(),
            _ => status::UNKNOWN.to_string(),
        }
    }

    fn created_at(&self) -> Option<DateTime> {
        time::parse(&self.payload.created_time).ok()
    }

    fn sys_tags(&self) -> TagSet {
        let mut tags = TagSet::new();
        tags.insert(
            "loadbalance_type".to_string(),
            self.payload.load_balancer_type.clone(),
        );
        tags
    }

    async fn refresh(&mut self) -> Result<()> {
        let fresh = self.region.loadbalancer(&self.payload.load_balancer_id).await?;
        value::overlay(&mut self.payload, &serde_json::to_value(fresh.payload)?)
    }
}

#[async_trait]
impl CloudLoadbalancer for Loadbalancer {
    type BackendGroup = BackendGroup;

    fn address(&self) -> String {
        self.payload.dns_name.clone()
    }

    fn address_type(&self) -> AddressType {
        match self.payload.ip_address_type.as_str() {
            "internet-facing" => AddressType::Internet,
            _ => AddressType::Intranet,
        }
    }

    fn network_type(&self) -> String {
        "vpc".to_string()
    }

    fn network_ids(&self) -> Vec<String> {
        self.payload
            .availability_zones
            .iter()
            .map(|zone| zone.subnet_id.clone())
            .collect()
    }

    fn vpc_id(&self) -> String {
        self.payload.vpc_id.clone()
    }

    fn zone_id(&self) -> String {
        let mut zones: Vec<&str> = self
            .payload
            .availability_zones
            .iter()
            .map(|zone| zone.zone_name.as_str())
            .collect();
        zones.sort_unstable();
        zones.first().map(|zone| zone.to_string()).unwrap_or_default()
    }

    fn spec(&self) -> String {
        self.payload.load_balancer_type.clone()
    }

    fn charge_type(&self) -> String {
        "traffic".to_string()
    }

    fn egress_mbps(&self) -> i64 {
        0
    }

    async fn attributes(&self) -> Result<HashMap<String, String>> {
        let params = vec![(
            "LoadBalancerArn".to_string(),
            self.payload.load_balancer_id.clone(),
        )];
        let resp = self
            .region
            .invoke("DescribeLoadBalancerAttributes", params)
            .await?;
        let attributes: Vec<AttributePayload> = value::decode_list_at(&resp, &["Attributes"])?;
        Ok(attributes_to_map(attributes))
    }

    async fn backend_groups(&self) -> Result<Vec<BackendGroup>> {
        let mut groups = self.region.target_groups("").await?;
        groups.retain(|group| {
            group.payload.load_balancer_arns.iter().any(|arn| {
                arn == &self.payload.load_balancer_arn || arn == &self.payload.load_balancer_id
            })
        });
        Ok(groups)
    }

    async fn backend_group_by_id(&self, id: &str) -> Result<BackendGroup> {
        self.region.target_group(id).await
    }

    async fn create_backend_group(
        &self,
        opts: &BackendGroupCreateOptions,
    ) -> Result<BackendGroup> {
        let vpc_id = if opts.vpc_id.is_empty() {
            self.payload.vpc_id.clone()
        } else {
            opts.vpc_id.clone()
        };
        self.region.create_target_group(opts, &vpc_id).await
    }

    async fn start(&self) -> Result<()> {
        // Balancers serve as soon as they are active.
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        Err(Error::unsupported("load balancers cannot be stopped"))
    }

    async fn delete(&self) -> Result<()> {
        match self.backend_groups().await {
            Ok(groups) => {
                for group in groups {
                    if let Err(err) = group.delete().await {
                        debug!("leaving backend group {} behind: {err:?}", group.id());
                    }
                }
            }
            Err(err) => debug!("could not list backend groups before delete: {err:?}"),
        }
        let params = vec![(
            "LoadBalancerArn".to_string(),
            self.payload.load_balancer_id.clone(),
        )];
        self.region.invoke("DeleteLoadBalancer", params).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use test_case::test_case;

    use super::*;
    use crate::region::test_region;

    fn loadbalancer_with(payload: ElbPayload) -> Loadbalancer {
        Loadbalancer {
            region: test_region(),
            payload,
        }
    }

    #[test_case("provisioning", status::INIT ; "provisioning maps to init")]
    #[test_case("active", status::ENABLED ; "active maps to enabled")]
    #[test_case("failed", status::START_FAILED ; "failed maps to start failed")]
    #[test_case("weird", status::UNKNOWN ; "anything else is unknown")]
    fn test_status_mapping(wire: &str, want: &str) {
        let loadbalancer = loadbalancer_with(ElbPayload {
            state: ElbStatePayload {
                code: wire.to_string(),
            },
            ..Default::default()
        });
        assert_eq!(loadbalancer.status(), want);
    }

    #[test]
    fn test_payload_honors_wire_renames() -> anyhow::Result<()> {
        let payload: ElbPayload = serde_json::from_value(json!({
            "Type": "application",
            "DNSName": "lb.example.internal",
            "LoadBalancerId": "lb-1",
            "IpAddressType": "internet-facing",
            "State": {"Code": "active"},
            "AvailabilityZones": [
                {"SubnetId": "subnet-b", "ZoneName": "az2"},
                {"SubnetId": "subnet-a", "ZoneName": "az1"}
            ]
        }))?;
        let loadbalancer = loadbalancer_with(payload);
        assert_eq!(loadbalancer.address(), "lb.example.internal");
        assert_eq!(loadbalancer.address_type(), AddressType::Internet);
        assert_eq!(loadbalancer.spec(), "application");
        assert_eq!(loadbalancer.zone_id(), "az1");
        assert_eq!(
            loadbalancer.network_ids(),
            vec!["subnet-b".to_string(), "subnet-a".to_string()]
        );
        assert_eq!(
            loadbalancer.sys_tags().get("loadbalance_type"),
            Some(&"application".to_string())
        );
        Ok(())
    }

    #[test]
    fn test_address_defaults_to_intranet() {
        let loadbalancer = loadbalancer_with(ElbPayload::default());
        assert_eq!(loadbalancer.address_type(), AddressType::Intranet);
    }
}
