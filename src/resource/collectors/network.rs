//! VPCs, subnets, NAT gateways, VPC endpoints and internet gateways

use super::{field, list_envelope, tags, timestamp};
use crate::aws::Session;
use crate::resource::collector::Collector;
use crate::resource::extract::{extract_name_value, items, str_at, string_list, DATETIME_FORMAT};
use crate::resource::fetcher::{ListCall, NEXT_TOKEN};
use crate::resource::table::{Cell, Row, Table};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

pub struct Vpcs;

const DESCRIBE_VPCS: ListCall = ListCall::new("ec2", "describe_vpcs", "Vpcs", NEXT_TOKEN);

#[async_trait]
impl Collector for Vpcs {
    fn key(&self) -> &'static str {
        "vpc"
    }

    async fn fetch(&self, session: &dyn Session) -> Result<Value> {
        list_envelope(session, &DESCRIBE_VPCS).await
    }

    fn empty(&self) -> Value {
        json!({"Vpcs": []})
    }

    fn normalize(&self, raw: &Value) -> Table {
        items(raw, "Vpcs")
            .iter()
            .map(|vpc| {
                Row::new()
                    .cell("Name", extract_name_value(tags(vpc)).unwrap_or("N/A"))
                    .cell("VpcId", field(vpc, "VpcId"))
                    .cell("State", field(vpc, "State"))
                    .cell("CidrBlock", field(vpc, "CidrBlock"))
                    .cell("IsDefault", field(vpc, "IsDefault"))
            })
            .collect()
    }
}

pub struct Subnets;

const DESCRIBE_SUBNETS: ListCall = ListCall::new("ec2", "describe_subnets", "Subnets", NEXT_TOKEN);

#[async_trait]
impl Collector for Subnets {
    fn key(&self) -> &'static str {
        "subnets"
    }

    async fn fetch(&self, session: &dyn Session) -> Result<Value> {
        list_envelope(session, &DESCRIBE_SUBNETS).await
    }

    fn empty(&self) -> Value {
        json!({"Subnets": []})
    }

    fn normalize(&self, raw: &Value) -> Table {
        items(raw, "Subnets")
            .iter()
            .map(|subnet| {
                Row::new()
                    .cell("Name", extract_name_value(tags(subnet)).unwrap_or("N/A"))
                    .cell("SubnetId", field(subnet, "SubnetId"))
                    .cell("VpcId", field(subnet, "VpcId"))
                    .cell("CidrBlock", field(subnet, "CidrBlock"))
                    .cell("AvailabilityZone", field(subnet, "AvailabilityZone"))
                    .cell("AvailableIpAddressCount", field(subnet, "AvailableIpAddressCount"))
                    .cell("State", field(subnet, "State"))
                    .cell("MapPublicIpOnLaunch", field(subnet, "MapPublicIpOnLaunch"))
            })
            .collect()
    }
}

pub struct NatGateways;

const DESCRIBE_NAT_GATEWAYS: ListCall =
    ListCall::new("ec2", "describe_nat_gateways", "NatGateways", NEXT_TOKEN);

#[async_trait]
impl Collector for NatGateways {
    fn key(&self) -> &'static str {
        "nat_gateway"
    }

    async fn fetch(&self, session: &dyn Session) -> Result<Value> {
        list_envelope(session, &DESCRIBE_NAT_GATEWAYS).await
    }

    fn empty(&self) -> Value {
        json!({"NatGateways": []})
    }

    fn normalize(&self, raw: &Value) -> Table {
        items(raw, "NatGateways")
            .iter()
            .map(|nat| {
                Row::new()
                    .cell("NatGatewayId", field(nat, "NatGatewayId"))
                    .cell("State", field(nat, "State"))
                    .cell("VpcId", field(nat, "VpcId"))
                    .cell("SubnetId", field(nat, "SubnetId"))
                    .cell("CreateTime", timestamp(nat, "CreateTime", DATETIME_FORMAT))
            })
            .collect()
    }
}

pub struct VpcEndpoints;

const DESCRIBE_VPC_ENDPOINTS: ListCall =
    ListCall::new("ec2", "describe_vpc_endpoints", "VpcEndpoints", NEXT_TOKEN);

#[async_trait]
impl Collector for VpcEndpoints {
    fn key(&self) -> &'static str {
        "vpc_endpoint"
    }

    async fn fetch(&self, session: &dyn Session) -> Result<Value> {
        list_envelope(session, &DESCRIBE_VPC_ENDPOINTS).await
    }

    fn empty(&self) -> Value {
        json!({"VpcEndpoints": []})
    }

    fn normalize(&self, raw: &Value) -> Table {
        items(raw, "VpcEndpoints")
            .iter()
            .map(|ep| {
                let route_tables = string_list(ep, "RouteTableIds");
                let route_tables = if route_tables.is_empty() {
                    Cell::Null
                } else {
                    Cell::from(route_tables.join(","))
                };
                let policy = str_at(ep, "PolicyDocument").filter(|p| !p.is_empty());

                Row::new()
                    .cell("VpcEndpointId", field(ep, "VpcEndpointId"))
                    .cell("VpcId", field(ep, "VpcId"))
                    .cell("ServiceName", field(ep, "ServiceName"))
                    .cell("State", field(ep, "State"))
                    .cell("RouteTableIds", route_tables)
                    .cell("PolicyDocument", policy)
            })
            .collect()
    }
}

pub struct InternetGateways;

const DESCRIBE_INTERNET_GATEWAYS: ListCall =
    ListCall::new("ec2", "describe_internet_gateways", "InternetGateways", NEXT_TOKEN);

#[async_trait]
impl Collector for InternetGateways {
    fn key(&self) -> &'static str {
        "internet_gateway"
    }

    async fn fetch(&self, session: &dyn Session) -> Result<Value> {
        list_envelope(session, &DESCRIBE_INTERNET_GATEWAYS).await
    }

    fn empty(&self) -> Value {
        json!({"InternetGateways": []})
    }

    fn normalize(&self, raw: &Value) -> Table {
        items(raw, "InternetGateways")
            .iter()
            .map(|igw| {
                let attachments = items(igw, "Attachments");
                let vpc_ids: Vec<&str> = attachments
                    .iter()
                    .filter_map(|a| str_at(a, "VpcId"))
                    .collect();
                // The last attachment's state wins
                let state = attachments
                    .iter()
                    .filter_map(|a| str_at(a, "State"))
                    .last()
                    .unwrap_or("N/A");
                let vpc_id = if vpc_ids.is_empty() {
                    "N/A".to_string()
                } else {
                    vpc_ids.join(", ")
                };

                Row::new()
                    .cell("Name", extract_name_value(tags(igw)).unwrap_or("N/A"))
                    .cell("InternetGatewayId", field(igw, "InternetGatewayId"))
                    .cell("VpcId", vpc_id)
                    .cell("State", state)
            })
            .collect()
    }
}
