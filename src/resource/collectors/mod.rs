//! Collector implementations, one per resource type
//!
//! Grouped by service family. Each collector returns its raw data wrapped in
//! a single envelope object (`{"Vpcs": [...]}`) so empty and populated results
//! share one shape.

mod compute;
mod containers;
mod database;
mod global;
mod messaging;
mod network;
mod scaling;
mod security_groups;
mod streaming;

pub use compute::{Amis, EbsSnapshots, EbsVolumes, Ec2Instances, ElasticIps};
pub use containers::{Ecr, Eks};
pub use database::{DynamoDb, ElastiCache, Rds};
pub use global::{GlobalAccelerator, Route53, S3};
pub use messaging::{SecretsManager, SesIdentities};
pub use network::{InternetGateways, NatGateways, Subnets, VpcEndpoints, Vpcs};
pub use scaling::{AutoScalingGroups, LoadBalancers};
pub use security_groups::{
    any_open, format_port_range, format_protocol, has_any_open_inbound, SecurityGroupRules,
    SecurityGroups,
};
pub use streaming::{GlueJobs, KinesisFirehose, KinesisStreams};

use super::collector::Collector;
use super::extract::{format_timestamp, lookup};
use super::fetcher::{fetch_all, ListCall};
use super::table::Cell;
use crate::aws::Session;
use anyhow::Result;
use serde_json::{Map, Value};

/// Every collector, in catalog order
pub fn all() -> Vec<Box<dyn Collector>> {
    vec![
        Box::new(Ec2Instances),
        Box::new(Vpcs),
        Box::new(Rds),
        Box::new(Eks),
        Box::new(Subnets),
        Box::new(DynamoDb),
        Box::new(LoadBalancers),
        Box::new(ElastiCache),
        Box::new(EbsVolumes),
        Box::new(EbsSnapshots),
        Box::new(Amis),
        Box::new(NatGateways),
        Box::new(VpcEndpoints),
        Box::new(KinesisStreams),
        Box::new(GlueJobs),
        Box::new(KinesisFirehose),
        Box::new(SecretsManager),
        Box::new(ElasticIps),
        Box::new(InternetGateways),
        Box::new(SecurityGroups),
        Box::new(Ecr),
        Box::new(SecurityGroupRules),
        Box::new(AutoScalingGroups),
        Box::new(SesIdentities),
        Box::new(S3),
        Box::new(GlobalAccelerator),
        Box::new(Route53),
    ]
}

/// `{key: items}`
pub(crate) fn envelope(key: &str, items: Vec<Value>) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), Value::Array(items));
    Value::Object(map)
}

/// Fetch every page of `call` into an envelope keyed by its items key
pub(crate) async fn list_envelope(session: &dyn Session, call: &ListCall) -> Result<Value> {
    Ok(envelope(call.items_key, fetch_all(session, call).await?))
}

static NULL: Value = Value::Null;

/// The `Tags` list of an item, null when absent
pub(crate) fn tags(item: &Value) -> &Value {
    item.get("Tags").unwrap_or(&NULL)
}

/// Value at `path` as a cell, null when absent
pub(crate) fn field(item: &Value, path: &str) -> Cell {
    Cell::from(lookup(item, path))
}

/// Timestamp at `path` rendered with `pattern`, null when absent
pub(crate) fn timestamp(item: &Value, path: &str, pattern: &str) -> Cell {
    lookup(item, path).map_or(Cell::Null, |v| Cell::from(format_timestamp(v, pattern)))
}

/// Timestamp at `path` rendered with `pattern`, `"N/A"` when absent
pub(crate) fn timestamp_or_na(item: &Value, path: &str, pattern: &str) -> Cell {
    lookup(item, path).map_or(Cell::from("N/A"), |v| Cell::from(format_timestamp(v, pattern)))
}
