//! EC2 instances, images, volumes, snapshots and Elastic IPs

use super::{field, list_envelope, tags, timestamp};
use crate::aws::Session;
use crate::resource::collector::Collector;
use crate::resource::extract::{
    extract_name_value, items, join_tags, text_or, DATETIME_FORMAT, DATE_FORMAT,
};
use crate::resource::fetcher::{ListCall, Paging, NEXT_TOKEN};
use crate::resource::table::{Row, Table};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

/// EC2 instances, flattened out of their reservations
pub struct Ec2Instances;

const DESCRIBE_INSTANCES: ListCall =
    ListCall::new("ec2", "describe_instances", "Reservations", NEXT_TOKEN);

#[async_trait]
impl Collector for Ec2Instances {
    fn key(&self) -> &'static str {
        "ec2"
    }

    async fn fetch(&self, session: &dyn Session) -> Result<Value> {
        list_envelope(session, &DESCRIBE_INSTANCES).await
    }

    fn empty(&self) -> Value {
        json!({"Reservations": []})
    }

    fn normalize(&self, raw: &Value) -> Table {
        items(raw, "Reservations")
            .iter()
            .flat_map(|reservation| items(reservation, "Instances"))
            .map(|inst| {
                let groups = items(inst, "SecurityGroups");
                let group_field = |key: &str| {
                    groups
                        .iter()
                        .map(|g| text_or(g, key, ""))
                        .collect::<Vec<_>>()
                        .join(", ")
                };

                Row::new()
                    .cell("Name", extract_name_value(tags(inst)).unwrap_or("N/A"))
                    .cell("InstanceId", text_or(inst, "InstanceId", ""))
                    .cell("InstanceType", text_or(inst, "InstanceType", ""))
                    .cell("State", text_or(inst, "State.Name", ""))
                    .cell("PublicIp", text_or(inst, "PublicIpAddress", ""))
                    .cell("PrivateIp", text_or(inst, "PrivateIpAddress", ""))
                    .cell("SecurityGroupIds", group_field("GroupId"))
                    .cell("SecurityGroupNames", group_field("GroupName"))
                    .cell("LaunchTime", timestamp(inst, "LaunchTime", DATE_FORMAT))
            })
            .collect()
    }
}

/// AMIs owned by the account
pub struct Amis;

const DESCRIBE_IMAGES: ListCall = ListCall::new("ec2", "describe_images", "Images", NEXT_TOKEN);

#[async_trait]
impl Collector for Amis {
    fn key(&self) -> &'static str {
        "amis"
    }

    async fn fetch(&self, session: &dyn Session) -> Result<Value> {
        list_envelope(session, &DESCRIBE_IMAGES).await
    }

    fn empty(&self) -> Value {
        json!({"Images": []})
    }

    fn normalize(&self, raw: &Value) -> Table {
        items(raw, "Images")
            .iter()
            .map(|image| {
                Row::new()
                    .cell("ImageId", field(image, "ImageId"))
                    .cell("Name", field(image, "Name"))
                    .cell("CreationDate", field(image, "CreationDate"))
                    .cell("State", field(image, "State"))
                    .cell("Public", field(image, "Public"))
            })
            .collect()
    }
}

/// EBS volumes
pub struct EbsVolumes;

const DESCRIBE_VOLUMES: ListCall = ListCall::new("ec2", "describe_volumes", "Volumes", NEXT_TOKEN);

#[async_trait]
impl Collector for EbsVolumes {
    fn key(&self) -> &'static str {
        "ebs"
    }

    async fn fetch(&self, session: &dyn Session) -> Result<Value> {
        list_envelope(session, &DESCRIBE_VOLUMES).await
    }

    fn empty(&self) -> Value {
        json!({"Volumes": []})
    }

    fn normalize(&self, raw: &Value) -> Table {
        items(raw, "Volumes")
            .iter()
            .map(|volume| {
                let volume_id = field(volume, "VolumeId");
                let name = extract_name_value(tags(volume))
                    .map(Into::into)
                    .unwrap_or_else(|| volume_id.clone());

                Row::new()
                    .cell("VolumeId", volume_id)
                    .cell("Name", name)
                    .cell("Size", field(volume, "Size"))
                    .cell("VolumeType", field(volume, "VolumeType"))
                    .cell("State", field(volume, "State"))
                    .cell("AvailabilityZone", field(volume, "AvailabilityZone"))
                    .cell("CreateTime", timestamp(volume, "CreateTime", DATETIME_FORMAT))
                    .cell("Tags", join_tags(tags(volume), "=", ";"))
            })
            .collect()
    }
}

/// EBS snapshots owned by the account
pub struct EbsSnapshots;

const DESCRIBE_SNAPSHOTS: ListCall =
    ListCall::new("ec2", "describe_snapshots", "Snapshots", NEXT_TOKEN);

#[async_trait]
impl Collector for EbsSnapshots {
    fn key(&self) -> &'static str {
        "ebs_snapshot"
    }

    async fn fetch(&self, session: &dyn Session) -> Result<Value> {
        list_envelope(session, &DESCRIBE_SNAPSHOTS).await
    }

    fn empty(&self) -> Value {
        json!({"Snapshots": []})
    }

    fn normalize(&self, raw: &Value) -> Table {
        items(raw, "Snapshots")
            .iter()
            .map(|snap| {
                Row::new()
                    .cell("SnapshotId", field(snap, "SnapshotId"))
                    .cell("VolumeId", field(snap, "VolumeId"))
                    .cell("StartTime", timestamp(snap, "StartTime", DATETIME_FORMAT))
                    .cell("State", field(snap, "State"))
                    .cell("VolumeSize", field(snap, "VolumeSize"))
                    .cell("Description", field(snap, "Description"))
            })
            .collect()
    }
}

/// Elastic IP addresses
pub struct ElasticIps;

const DESCRIBE_ADDRESSES: ListCall =
    ListCall::new("ec2", "describe_addresses", "Addresses", Paging::None);

#[async_trait]
impl Collector for ElasticIps {
    fn key(&self) -> &'static str {
        "eip"
    }

    async fn fetch(&self, session: &dyn Session) -> Result<Value> {
        list_envelope(session, &DESCRIBE_ADDRESSES).await
    }

    fn empty(&self) -> Value {
        json!({"Addresses": []})
    }

    fn normalize(&self, raw: &Value) -> Table {
        items(raw, "Addresses")
            .iter()
            .map(|eip| {
                Row::new()
                    .cell("Name", extract_name_value(tags(eip)).unwrap_or("N/A"))
                    .cell("PublicIp", field(eip, "PublicIp"))
                    .cell("AllocationId", field(eip, "AllocationId"))
                    .cell("AssociationId", field(eip, "AssociationId"))
                    .cell("Domain", field(eip, "Domain"))
                    .cell("InstanceId", field(eip, "InstanceId"))
                    .cell("NetworkInterfaceId", field(eip, "NetworkInterfaceId"))
                    .cell("PrivateIpAddress", field(eip, "PrivateIpAddress"))
            })
            .collect()
    }
}
