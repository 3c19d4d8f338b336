use std::fmt::Debug;

use async_trait::async_trait;

use super::resource::CloudResource;
use crate::Result;

/// Traffic direction a security group rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityRuleDirection {
    /// Traffic entering the group.
    Ingress,
    /// Traffic leaving the group.
    Egress,
}

impl SecurityRuleDirection {
    /// Stable string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityRuleDirection::Ingress => "ingress",
            SecurityRuleDirection::Egress => "egress",
        }
    }
}

impl std::fmt::Display for SecurityRuleDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether matching traffic passes or is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityRulePolicy {
    /// Matching traffic passes.
    Allow,
    /// Matching traffic is dropped.
    Deny,
}

impl SecurityRulePolicy {
    /// Stable string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityRulePolicy::Allow => "allow",
            SecurityRulePolicy::Deny => "deny",
        }
    }
}

impl std::fmt::Display for SecurityRulePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters for creating (or rewriting) a security group rule.
#[derive(Debug, Clone)]
pub struct SecurityGroupRuleCreateOptions {
    /// Direction the rule applies to.
    pub direction: SecurityRuleDirection,
    /// Pass or drop.
    pub policy: SecurityRulePolicy,
    /// Protocol name, `any` for all protocols.
    pub protocol: String,
    /// CIDR the rule matches.
    pub cidr: String,
    /// First port of the range, 0 when the protocol has no ports.
    pub from_port: i64,
    /// Last port of the range, 0 when the protocol has no ports.
    pub to_port: i64,
    /// Free-form description.
    pub description: String,
}

/// A security group.
#[async_trait]
pub trait CloudSecurityGroup: CloudResource {
    /// Concrete rule type.
    type Rule: CloudSecurityGroupRule;

    /// VPC the group belongs to.
    fn vpc_id(&self) -> String;

    /// Free-form description.
    fn description(&self) -> String;

    /// All rules of the group, both directions.
    async fn rules(&self) -> Result<Vec<Self::Rule>>;

    /// Add a rule.
    async fn create_rule(&self, opts: &SecurityGroupRuleCreateOptions) -> Result<()>;
}

/// One rule of a security group.
///
/// Rules are not full [`CloudResource`]s; they have an identity and a
/// payload but no independent lifecycle worth refreshing.
#[async_trait]
pub trait CloudSecurityGroupRule: Debug + Send + Sync {
    /// Provider rule identifier.
    fn global_id(&self) -> String;

    /// Direction the rule applies to.
    fn direction(&self) -> SecurityRuleDirection;

    /// Pass or drop.
    fn policy(&self) -> SecurityRulePolicy;

    /// Protocol name, `any` for all protocols.
    fn protocol(&self) -> String;

    /// Port range as `n` or `n-m`, empty when the rule has no ports.
    fn ports(&self) -> String;

    /// Rule priority; providers without priorities report 0.
    fn priority(&self) -> i64 {
        0
    }

    /// CIDRs the rule matches.
    fn cidrs(&self) -> Vec<String>;

    /// Free-form description.
    fn description(&self) -> String;

    /// Delete the rule.
    async fn delete(&self) -> Result<()>;

    /// Replace the rule's payload, keeping its direction.
    async fn update(&self, opts: &SecurityGroupRuleCreateOptions) -> Result<()>;
}
