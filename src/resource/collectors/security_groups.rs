//! Security groups and security group rules
//!
//! Two views of the same firewall data: one row per group with its rules
//! rendered as text, and one row per rule with direction, port range and
//! whether the rule is open to the whole internet.

use super::{list_envelope, tags};
use crate::aws::Session;
use crate::resource::collector::Collector;
use crate::resource::extract::{items, join_tags, lookup, str_at, text_or};
use crate::resource::fetcher::{ListCall, NEXT_TOKEN};
use crate::resource::table::{Row, Table};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

const ANY_IPV4: &str = "0.0.0.0/0";
const ANY_IPV6: &str = "::/0";

/// True when `target` admits every address
pub fn any_open(target: &str) -> bool {
    target == ANY_IPV4 || target == ANY_IPV6
}

/// `"-1"` (or no protocol) is every protocol
pub fn format_protocol(protocol: Option<&str>) -> String {
    match protocol {
        None | Some("-1") => "All".to_string(),
        Some(p) => p.to_string(),
    }
}

/// Single port when equal, `from-to` otherwise, `All` when unbounded
pub fn format_port_range(protocol: Option<&str>, from: Option<i64>, to: Option<i64>) -> String {
    if matches!(protocol, None | Some("-1")) {
        return "All".to_string();
    }
    match (from, to) {
        (Some(from), Some(to)) if from == to => from.to_string(),
        (Some(from), Some(to)) => format!("{}-{}", from, to),
        _ => "All".to_string(),
    }
}

/// Whether any inbound permission of `group` is open to the internet
pub fn has_any_open_inbound(group: &Value) -> bool {
    items(group, "IpPermissions").iter().any(|permission| {
        items(permission, "IpRanges")
            .iter()
            .any(|r| str_at(r, "CidrIp") == Some(ANY_IPV4))
            || items(permission, "Ipv6Ranges")
                .iter()
                .any(|r| str_at(r, "CidrIpv6") == Some(ANY_IPV6))
    })
}

fn port(item: &Value, key: &str) -> Option<i64> {
    lookup(item, key).and_then(Value::as_i64)
}

/// One line per target: `tcp:80 from 0.0.0.0/0 (HTTP access)`
fn format_rules(permissions: &[Value], direction: &str) -> Vec<String> {
    const TARGETS: [(&str, &str); 4] = [
        ("IpRanges", "CidrIp"),
        ("Ipv6Ranges", "CidrIpv6"),
        ("UserIdGroupPairs", "GroupId"),
        ("PrefixListIds", "PrefixListId"),
    ];

    let mut lines = Vec::new();
    for permission in permissions {
        let protocol = str_at(permission, "IpProtocol");
        let range = format_port_range(
            protocol,
            port(permission, "FromPort"),
            port(permission, "ToPort"),
        );
        let protocol = format_protocol(protocol);

        for (list_key, id_key) in TARGETS {
            for target in items(permission, list_key) {
                let mut line = format!(
                    "{}:{} {} {}",
                    protocol,
                    range,
                    direction,
                    text_or(target, id_key, "")
                );
                if let Some(description) = str_at(target, "Description").filter(|d| !d.is_empty()) {
                    line.push_str(&format!(" ({})", description));
                }
                lines.push(line);
            }
        }
    }
    lines
}

/// Row for one security group
fn group_row(group: &Value) -> Row {
    Row::new()
        .cell("SecurityGroupId", text_or(group, "GroupId", ""))
        .cell("SecurityGroupName", text_or(group, "GroupName", ""))
        .cell("VpcId", text_or(group, "VpcId", ""))
        .cell("Description", text_or(group, "Description", ""))
        .cell("AnyOpenInbound", has_any_open_inbound(group))
        .cell("InboundRules", format_rules(items(group, "IpPermissions"), "from"))
        .cell("OutboundRules", format_rules(items(group, "IpPermissionsEgress"), "to"))
        .cell("Tags", join_tags(tags(group), "=", ", ").unwrap_or_default())
}

pub struct SecurityGroups;

const DESCRIBE_SECURITY_GROUPS: ListCall =
    ListCall::new("ec2", "describe_security_groups", "SecurityGroups", NEXT_TOKEN);

#[async_trait]
impl Collector for SecurityGroups {
    fn key(&self) -> &'static str {
        "security_groups"
    }

    async fn fetch(&self, session: &dyn Session) -> Result<Value> {
        list_envelope(session, &DESCRIBE_SECURITY_GROUPS).await
    }

    fn empty(&self) -> Value {
        json!({"SecurityGroups": []})
    }

    fn normalize(&self, raw: &Value) -> Table {
        items(raw, "SecurityGroups").iter().map(group_row).collect()
    }
}

pub struct SecurityGroupRules;

const DESCRIBE_SECURITY_GROUP_RULES: ListCall = ListCall::new(
    "ec2",
    "describe_security_group_rules",
    "SecurityGroupRules",
    NEXT_TOKEN,
);

#[async_trait]
impl Collector for SecurityGroupRules {
    fn key(&self) -> &'static str {
        "security_group_rules"
    }

    async fn fetch(&self, session: &dyn Session) -> Result<Value> {
        list_envelope(session, &DESCRIBE_SECURITY_GROUP_RULES).await
    }

    fn empty(&self) -> Value {
        json!({"SecurityGroupRules": []})
    }

    fn normalize(&self, raw: &Value) -> Table {
        items(raw, "SecurityGroupRules")
            .iter()
            .map(|rule| {
                let is_egress = lookup(rule, "IsEgress").and_then(Value::as_bool).unwrap_or(false);
                let protocol = str_at(rule, "IpProtocol");
                let target = ["CidrIpv4", "CidrIpv6", "ReferencedGroupInfo.GroupId", "PrefixListId"]
                    .iter()
                    .find_map(|path| str_at(rule, path))
                    .unwrap_or("");

                Row::new()
                    .cell("SecurityGroupRuleId", text_or(rule, "SecurityGroupRuleId", ""))
                    .cell("GroupId", text_or(rule, "GroupId", ""))
                    .cell("Direction", if is_egress { "Outbound" } else { "Inbound" })
                    .cell("Protocol", format_protocol(protocol))
                    .cell(
                        "PortRange",
                        format_port_range(protocol, port(rule, "FromPort"), port(rule, "ToPort")),
                    )
                    .cell("Source/Destination", target)
                    .cell("AnyOpen", any_open(target))
                    .cell("Description", text_or(rule, "Description", ""))
                    .cell("Tags", join_tags(tags(rule), "=", ", ").unwrap_or_default())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::table::Cell;

    fn rule(protocol: &str, from: Option<i64>, to: Option<i64>, cidr: &str) -> Value {
        let mut rule = json!({
            "SecurityGroupRuleId": "sgr-1",
            "GroupId": "sg-1",
            "IsEgress": false,
            "IpProtocol": protocol,
            "CidrIpv4": cidr,
            "Description": "web"
        });
        if let Some(from) = from {
            rule["FromPort"] = json!(from);
        }
        if let Some(to) = to {
            rule["ToPort"] = json!(to);
        }
        rule
    }

    #[test]
    fn test_rule_port_ranges() {
        let raw = json!({"SecurityGroupRules": [
            rule("tcp", Some(80), Some(80), "0.0.0.0/0"),
            rule("tcp", Some(8000), Some(8999), "10.0.0.0/8"),
            rule("-1", Some(-1), Some(-1), "10.0.0.0/8"),
        ]});
        let table = SecurityGroupRules.normalize(&raw);
        let ranges: Vec<_> = table.rows().iter().map(|r| r.get("PortRange").cloned()).collect();
        assert_eq!(
            ranges,
            vec![
                Some(Cell::from("80")),
                Some(Cell::from("8000-8999")),
                Some(Cell::from("All"))
            ]
        );
        assert_eq!(table.rows()[2].get("Protocol"), Some(&Cell::from("All")));
        assert_eq!(table.rows()[0].get("AnyOpen"), Some(&Cell::Bool(true)));
        assert_eq!(table.rows()[1].get("AnyOpen"), Some(&Cell::Bool(false)));
        assert_eq!(table.rows()[0].get("Direction"), Some(&Cell::from("Inbound")));
    }

    #[test]
    fn test_rule_target_precedence() {
        let raw = json!({"SecurityGroupRules": [
            {"IsEgress": true, "IpProtocol": "tcp", "ReferencedGroupInfo": {"GroupId": "sg-9"}},
            {"IpProtocol": "tcp", "CidrIpv6": "::/0"},
            {"IpProtocol": "tcp", "PrefixListId": "pl-1"},
            {"IpProtocol": "tcp"}
        ]});
        let table = SecurityGroupRules.normalize(&raw);
        let targets: Vec<_> = table
            .rows()
            .iter()
            .map(|r| r.get("Source/Destination").and_then(Cell::as_str).map(str::to_string))
            .collect();
        assert_eq!(
            targets,
            vec![
                Some("sg-9".to_string()),
                Some("::/0".to_string()),
                Some("pl-1".to_string()),
                Some(String::new())
            ]
        );
        assert_eq!(table.rows()[0].get("Direction"), Some(&Cell::from("Outbound")));
        assert_eq!(table.rows()[1].get("AnyOpen"), Some(&Cell::Bool(true)));
        assert_eq!(table.rows()[3].get("PortRange"), Some(&Cell::from("All")));
    }

    #[test]
    fn test_group_any_open_inbound() {
        let open = json!({"IpPermissions": [{"IpProtocol": "tcp", "IpRanges": [{"CidrIp": "0.0.0.0/0"}]}]});
        let closed = json!({"IpPermissions": [{"IpProtocol": "tcp", "IpRanges": [{"CidrIp": "10.0.0.0/8"}]}]});
        let egress_only = json!({
            "IpPermissions": [],
            "IpPermissionsEgress": [{"IpProtocol": "-1", "IpRanges": [{"CidrIp": "0.0.0.0/0"}]}]
        });
        assert!(has_any_open_inbound(&open));
        assert!(!has_any_open_inbound(&closed));
        assert!(!has_any_open_inbound(&egress_only));
    }

    #[test]
    fn test_group_rule_lines() {
        let raw = json!({"SecurityGroups": [{
            "GroupId": "sg-1",
            "GroupName": "web",
            "VpcId": "vpc-1",
            "Description": "web tier",
            "IpPermissions": [{
                "IpProtocol": "tcp", "FromPort": 80, "ToPort": 80,
                "IpRanges": [{"CidrIp": "0.0.0.0/0", "Description": "HTTP access"}],
                "UserIdGroupPairs": [{"GroupId": "sg-2"}]
            }],
            "IpPermissionsEgress": [{
                "IpProtocol": "-1",
                "IpRanges": [{"CidrIp": "0.0.0.0/0"}]
            }],
            "Tags": [{"Key": "Env", "Value": "prod"}, {"Key": "Team", "Value": "ops"}]
        }]});
        let table = SecurityGroups.normalize(&raw);
        let row = &table.rows()[0];
        assert_eq!(row.get("AnyOpenInbound"), Some(&Cell::Bool(true)));
        assert_eq!(
            row.get("InboundRules"),
            Some(&Cell::List(vec![
                "tcp:80 from 0.0.0.0/0 (HTTP access)".to_string(),
                "tcp:80 from sg-2".to_string(),
            ]))
        );
        assert_eq!(
            row.get("OutboundRules"),
            Some(&Cell::List(vec!["All:All to 0.0.0.0/0".to_string()]))
        );
        assert_eq!(row.get("Tags"), Some(&Cell::from("Env=prod, Team=ops")));
    }

    #[test]
    fn test_group_without_tags_or_rules() {
        let table = SecurityGroups.normalize(&json!({"SecurityGroups": [{"GroupId": "sg-1"}]}));
        let row = &table.rows()[0];
        assert_eq!(row.get("Tags"), Some(&Cell::from("")));
        assert_eq!(row.get("InboundRules"), Some(&Cell::List(vec![])));
        assert_eq!(row.get("AnyOpenInbound"), Some(&Cell::Bool(false)));
    }
}
