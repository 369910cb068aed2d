//! Load balancers (classic and v2) and Auto Scaling groups

use super::{field, list_envelope, timestamp, timestamp_or_na};
use crate::aws::Session;
use crate::resource::collector::Collector;
use crate::resource::extract::{items, string_list, text_or, DATETIME_FORMAT, DATE_FORMAT};
use crate::resource::fetcher::{fetch_all, ListCall, NEXT_MARKER, NEXT_TOKEN};
use crate::resource::table::{Cell, Row, Table};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

/// Classic and v2 load balancers merged into one table
pub struct LoadBalancers;

const DESCRIBE_CLASSIC: ListCall =
    ListCall::new("elb", "describe_load_balancers", "LoadBalancerDescriptions", NEXT_MARKER);

const DESCRIBE_V2: ListCall =
    ListCall::new("elbv2", "describe_load_balancers", "LoadBalancers", NEXT_MARKER);

#[async_trait]
impl Collector for LoadBalancers {
    fn key(&self) -> &'static str {
        "elb"
    }

    async fn fetch(&self, session: &dyn Session) -> Result<Value> {
        let classic = fetch_all(session, &DESCRIBE_CLASSIC).await?;
        let v2 = fetch_all(session, &DESCRIBE_V2).await?;
        Ok(json!({"Classic": classic, "v2": v2}))
    }

    fn empty(&self) -> Value {
        json!({"Classic": [], "v2": []})
    }

    fn normalize(&self, raw: &Value) -> Table {
        let classic = items(raw, "Classic").iter().map(|lb| {
            Row::new()
                .cell("LoadBalancerName", field(lb, "LoadBalancerName"))
                .cell("Type", "classic")
                .cell("DNSName", field(lb, "DNSName"))
                .cell("Scheme", text_or(lb, "Scheme", "N/A"))
                .cell("VpcId", text_or(lb, "VPCId", "N/A"))
                .cell("CreatedDate", timestamp_or_na(lb, "CreatedTime", DATE_FORMAT))
                .cell("State", "N/A")
        });
        let v2 = items(raw, "v2").iter().map(|lb| {
            Row::new()
                .cell("LoadBalancerName", field(lb, "LoadBalancerName"))
                .cell("Type", text_or(lb, "Type", "N/A"))
                .cell("DNSName", field(lb, "DNSName"))
                .cell("Scheme", text_or(lb, "Scheme", "N/A"))
                .cell("VpcId", text_or(lb, "VpcId", "N/A"))
                .cell("CreatedDate", timestamp_or_na(lb, "CreatedTime", DATE_FORMAT))
                .cell("State", text_or(lb, "State.Code", "N/A"))
        });
        classic.chain(v2).collect()
    }
}

pub struct AutoScalingGroups;

const DESCRIBE_AUTO_SCALING_GROUPS: ListCall = ListCall::new(
    "autoscaling",
    "describe_auto_scaling_groups",
    "AutoScalingGroups",
    NEXT_TOKEN,
);

#[async_trait]
impl Collector for AutoScalingGroups {
    fn key(&self) -> &'static str {
        "auto_scaling_groups"
    }

    async fn fetch(&self, session: &dyn Session) -> Result<Value> {
        list_envelope(session, &DESCRIBE_AUTO_SCALING_GROUPS).await
    }

    fn empty(&self) -> Value {
        json!({"AutoScalingGroups": []})
    }

    fn normalize(&self, raw: &Value) -> Table {
        items(raw, "AutoScalingGroups")
            .iter()
            .map(|asg| {
                let size = |key: &str| match field(asg, key) {
                    Cell::Null => Cell::from(""),
                    other => other,
                };

                Row::new()
                    .cell("AutoScalingGroupName", text_or(asg, "AutoScalingGroupName", ""))
                    .cell("LaunchConfigurationName", text_or(asg, "LaunchConfigurationName", ""))
                    .cell("MinSize", size("MinSize"))
                    .cell("MaxSize", size("MaxSize"))
                    .cell("DesiredCapacity", size("DesiredCapacity"))
                    .cell("AvailabilityZones", string_list(asg, "AvailabilityZones").join(", "))
                    .cell("HealthCheckType", text_or(asg, "HealthCheckType", ""))
                    .cell("CreatedTime", timestamp(asg, "CreatedTime", DATETIME_FORMAT))
            })
            .collect()
    }
}
