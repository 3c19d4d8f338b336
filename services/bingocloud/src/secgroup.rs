use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stratus_core::model::{
    status, CloudResource, CloudSecurityGroup, CloudSecurityGroupRule,
    SecurityGroupRuleCreateOptions, SecurityRuleDirection, SecurityRulePolicy,
};
use stratus_core::{value, Error, Result};

use crate::constants::MAX_RESULTS;
use crate::region::Region;

/// A security group and its rule set.
#[derive(Debug, Clone)]
pub struct SecurityGroup {
    pub(crate) region: Region,
    pub(crate) payload: SecurityGroupPayload,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct SecurityGroupPayload {
    pub(crate) owner_id: String,
    pub(crate) group_id: String,
    pub(crate) group_name: String,
    pub(crate) group_description: String,
    pub(crate) vpc_id: String,
    pub(crate) ip_permissions: Vec<RulePayload>,
    pub(crate) ip_permissions_egress: Vec<RulePayload>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct RulePayload {
    pub(crate) bound_type: String,
    pub(crate) description: String,
    pub(crate) from_port: String,
    pub(crate) ip_protocol: String,
    pub(crate) groups: Vec<GroupRefPayload>,
    pub(crate) ip_ranges: Vec<IpRangePayload>,
    pub(crate) l2_accept: String,
    pub(crate) permission_id: String,
    pub(crate) policy: String,
    pub(crate) to_port: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct GroupRefPayload {
    pub(crate) group_id: String,
    pub(crate) group_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct IpRangePayload {
    pub(crate) cidr_ip: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct SecurityGroupsPage {
    #[serde(rename = "NextToken", alias = "nextToken")]
    pub(crate) next_token: String,
    #[serde(rename = "securityGroupInfo")]
    pub(crate) security_group_info: Vec<SecurityGroupPayload>,
}

impl Region {
    pub(crate) async fn security_groups_page(
        &self,
        group_id: &str,
        max_results: usize,
        next_token: &str,
    ) -> Result<SecurityGroupsPage> {
        let mut params = Vec::new();
        if !group_id.is_empty() {
            params.push(("GroupId.1".to_string(), group_id.to_string()));
        }
        params.push(("Filter.1.Name".to_string(), "owner-id".to_string()));
        params.push((
            "Filter.1.Value.1".to_string(),
            self.client.account_user().await,
        ));
        if !next_token.is_empty() {
            params.push(("NextToken".to_string(), next_token.to_string()));
        }
        params.push(("MaxRecords".to_string(), max_results.to_string()));
        let resp = self.invoke("DescribeSecurityGroups", params).await?;
        serde_json::from_value(resp).map_err(|err| {
            Error::decode("security group listing has unexpected shape").with_source(err)
        })
    }

    /// All security groups owned by the account.
    pub async fn security_groups(&self) -> Result<Vec<SecurityGroup>> {
        let mut groups = Vec::new();
        let mut next_token = String::new();
        loop {
            let page = self.security_groups_page("", MAX_RESULTS, &next_token).await?;
            for payload in page.security_group_info {
                groups.push(SecurityGroup {
                    region: self.clone(),
                    payload,
                });
            }
            if page.next_token.is_empty() {
                break;
            }
            next_token = page.next_token;
        }
        Ok(groups)
    }

    /// One security group by id.
    pub async fn security_group(&self, id: &str) -> Result<SecurityGroup> {
        let page = self.security_groups_page(id, 1, "").await?;
        page.security_group_info
            .into_iter()
            .find(|payload| payload.group_id == id)
            .map(|payload| SecurityGroup {
                region: self.clone(),
                payload,
            })
            .ok_or_else(|| Error::not_found(format!("security group {id}")))
    }

    pub(crate) async fn create_security_group_rule(
        &self,
        group_id: &str,
        opts: &SecurityGroupRuleCreateOptions,
    ) -> Result<()> {
        let action = match opts.direction {
            SecurityRuleDirection::Ingress => "AuthorizeSecurityGroupIngress",
            SecurityRuleDirection::Egress => "AuthorizeSecurityGroupEgress",
        };
        let protocol = if opts.protocol == "any" {
            "all".to_string()
        } else {
            opts.protocol.clone()
        };
        let mut params = vec![
            ("GroupId".to_string(), group_id.to_string()),
            ("IpProtocol".to_string(), protocol),
            ("FromPort".to_string(), opts.from_port.to_string()),
            ("ToPort".to_string(), opts.to_port.to_string()),
        ];
        if !opts.cidr.is_empty() {
            params.push(("CidrIp".to_string(), opts.cidr.clone()));
        }
        if opts.policy == SecurityRulePolicy::Deny {
            params.push(("Policy".to_string(), "DROP".to_string()));
        }
        if !opts.description.is_empty() {
            params.push(("Description".to_string(), opts.description.clone()));
        }
        self.invoke(action, params).await?;
        Ok(())
    }
}

#[async_trait]
impl CloudResource for SecurityGroup {
    fn id(&self) -> String {
        self.payload.group_id.clone()
    }

    fn name(&self) -> String {
        if self.payload.group_name.is_empty() {
            self.payload.group_id.clone()
        } else {
            self.payload.group_name.clone()
        }
    }

    fn global_id(&self) -> String {
        self.payload.group_id.clone()
    }

    fn status(&self) -> String {
        status::AVAILABLE.to_string()
    }

    async fn refresh(&mut self) -> Result<()> {
        let fresh = self.region.security_group(&self.payload.group_id).await?;
        value::overlay(&mut self.payload, &serde_json::to_value(fresh.payload)?)
    }
}

#[async_trait]
impl CloudSecurityGroup for SecurityGroup {
    type Rule = SecurityGroupRule;

    fn vpc_id(&self) -> String {
        self.payload.vpc_id.clone()
    }

    fn description(&self) -> String {
        self.payload.group_description.clone()
    }

    async fn rules(&self) -> Result<Vec<SecurityGroupRule>> {
        let mut rules = Vec::new();
        let sets = [
            (SecurityRuleDirection::Ingress, &self.payload.ip_permissions),
            (
                SecurityRuleDirection::Egress,
                &self.payload.ip_permissions_egress,
            ),
        ];
        for (direction, payloads) in sets {
            for payload in payloads {
                rules.push(SecurityGroupRule {
                    region: self.region.clone(),
                    group_id: self.payload.group_id.clone(),
                    direction,
                    payload: payload.clone(),
                });
            }
        }
        Ok(rules)
    }

    async fn create_rule(&self, opts: &SecurityGroupRuleCreateOptions) -> Result<()> {
        self.region
            .create_security_group_rule(&self.payload.group_id, opts)
            .await
    }
}

/// One rule of a security group.
#[derive(Debug, Clone)]
pub struct SecurityGroupRule {
    pub(crate) region: Region,
    pub(crate) group_id: String,
    pub(crate) direction: SecurityRuleDirection,
    pub(crate) payload: RulePayload,
}

#[async_trait]
impl CloudSecurityGroupRule for SecurityGroupRule {
    fn global_id(&self) -> String {
        self.payload.permission_id.clone()
    }

    fn direction(&self) -> SecurityRuleDirection {
        self.direction
    }

    fn policy(&self) -> SecurityRulePolicy {
        if self.payload.policy == "DROP" {
            SecurityRulePolicy::Deny
        } else {
            SecurityRulePolicy::Allow
        }
    }

    fn protocol(&self) -> String {
        if self.payload.ip_protocol == "all" {
            "any".to_string()
        } else {
            self.payload.ip_protocol.clone()
        }
    }

    fn ports(&self) -> String {
        let from = self.payload.from_port.parse::<i64>().unwrap_or(0);
        let to = self.payload.to_port.parse::<i64>().unwrap_or(0);
        if from <= 0 || to <= 0 {
            return String::new();
        }
        if from == to {
            from.to_string()
        } else {
            format!("{from}-{to}")
        }
    }

    fn cidrs(&self) -> Vec<String> {
        self.payload
            .ip_ranges
            .iter()
            .map(|range| range.cidr_ip.clone())
            .collect()
    }

    fn description(&self) -> String {
        self.payload.description.clone()
    }

    async fn delete(&self) -> Result<()> {
        let action = match self.direction {
            SecurityRuleDirection::Ingress => "RevokeSecurityGroupIngress",
            SecurityRuleDirection::Egress => "RevokeSecurityGroupEgress",
        };
        // Revocation matches on the raw wire protocol and ports.
        let base = vec![
            ("GroupId".to_string(), self.group_id.clone()),
            ("IpProtocol".to_string(), self.payload.ip_protocol.clone()),
            ("FromPort".to_string(), self.payload.from_port.clone()),
            ("ToPort".to_string(), self.payload.to_port.clone()),
        ];
        let cidrs = self.cidrs();
        if cidrs.is_empty() {
            self.region.invoke(action, base).await?;
            return Ok(());
        }
        for cidr in cidrs {
            let mut params = base.clone();
            params.push(("CidrIp".to_string(), cidr));
            self.region.invoke(action, params).await?;
        }
        Ok(())
    }

    async fn update(&self, opts: &SecurityGroupRuleCreateOptions) -> Result<()> {
        self.delete().await?;
        let mut opts = opts.clone();
        opts.direction = self.direction;
        self.region
            .create_security_group_rule(&self.group_id, &opts)
            .await
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    use super::*;
    use crate::region::test_region;

    fn rule_with(direction: SecurityRuleDirection, payload: RulePayload) -> SecurityGroupRule {
        SecurityGroupRule {
            region: test_region(),
            group_id: "sg-1".to_string(),
            direction,
            payload,
        }
    }

    #[test_case("22", "22", "22" ; "single port")]
    #[test_case("80", "90", "80-90" ; "port range")]
    #[test_case("0", "0", "" ; "no ports")]
    #[test_case("", "", "" ; "unparsable ports")]
    fn test_ports_formatting(from: &str, to: &str, want: &str) {
        let rule = rule_with(
            SecurityRuleDirection::Ingress,
            RulePayload {
                from_port: from.to_string(),
                to_port: to.to_string(),
                ..Default::default()
            },
        );
        assert_eq!(rule.ports(), want);
    }

    #[test]
    fn test_rule_mapping() {
        let rule = rule_with(
            SecurityRuleDirection::Egress,
            RulePayload {
                permission_id: "perm-9".to_string(),
                ip_protocol: "all".to_string(),
                policy: "DROP".to_string(),
                ip_ranges: vec![
                    IpRangePayload {
                        cidr_ip: "10.0.0.0/8".to_string(),
                    },
                    IpRangePayload {
                        cidr_ip: "192.168.0.0/16".to_string(),
                    },
                ],
                ..Default::default()
            },
        );
        assert_eq!(rule.global_id(), "perm-9");
        assert_eq!(rule.direction(), SecurityRuleDirection::Egress);
        assert_eq!(rule.policy(), SecurityRulePolicy::Deny);
        assert_eq!(rule.protocol(), "any");
        assert_eq!(
            rule.cidrs(),
            vec!["10.0.0.0/8".to_string(), "192.168.0.0/16".to_string()]
        );
    }

    #[tokio::test]
    async fn test_rules_carry_their_direction() -> anyhow::Result<()> {
        let group = SecurityGroup {
            region: test_region(),
            payload: SecurityGroupPayload {
                group_id: "sg-1".to_string(),
                ip_permissions: vec![RulePayload {
                    permission_id: "in-1".to_string(),
                    ..Default::default()
                }],
                ip_permissions_egress: vec![RulePayload {
                    permission_id: "out-1".to_string(),
                    ..Default::default()
                }],
                ..Default::default()
            },
        };
        let rules = group.rules().await?;
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].direction(), SecurityRuleDirection::Ingress);
        assert_eq!(rules[0].global_id(), "in-1");
        assert_eq!(rules[1].direction(), SecurityRuleDirection::Egress);
        assert_eq!(rules[1].global_id(), "out-1");
        Ok(())
    }
}
