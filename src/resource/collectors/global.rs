//! Account-wide resources: S3 buckets, Global Accelerators, Route 53 zones
//!
//! These are fetched once per run through a session bound to the region the
//! catalog names for them.

use super::{envelope, field, list_envelope, timestamp};
use crate::aws::Session;
use crate::resource::collector::Collector;
use crate::resource::extract::{items, str_at, text_or, DATETIME_FORMAT, DATE_FORMAT};
use crate::resource::fetcher::{describe_each, fetch_all, ListCall, Paging, NEXT_MARKER, NEXT_TOKEN};
use crate::resource::table::{Row, Table};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

pub struct S3;

const LIST_BUCKETS: ListCall = ListCall::new(
    "s3",
    "list_buckets",
    "Buckets",
    Paging::Token {
        request: "ContinuationToken",
        response: "ContinuationToken",
    },
);

#[async_trait]
impl Collector for S3 {
    fn key(&self) -> &'static str {
        "s3"
    }

    async fn fetch(&self, session: &dyn Session) -> Result<Value> {
        list_envelope(session, &LIST_BUCKETS).await
    }

    fn empty(&self) -> Value {
        json!({"Buckets": []})
    }

    fn normalize(&self, raw: &Value) -> Table {
        items(raw, "Buckets")
            .iter()
            .map(|bucket| {
                Row::new()
                    .cell("BucketName", text_or(bucket, "Name", ""))
                    .cell("CreationDate", timestamp(bucket, "CreationDate", DATE_FORMAT))
            })
            .collect()
    }
}

/// Global Accelerators, one DescribeAccelerator per listed ARN
pub struct GlobalAccelerator;

const LIST_ACCELERATORS: ListCall =
    ListCall::new("globalaccelerator", "list_accelerators", "Accelerators", NEXT_TOKEN);

#[async_trait]
impl Collector for GlobalAccelerator {
    fn key(&self) -> &'static str {
        "global_accelerator"
    }

    async fn fetch(&self, session: &dyn Session) -> Result<Value> {
        let listed = fetch_all(session, &LIST_ACCELERATORS).await?;
        let arns: Vec<Value> = listed
            .iter()
            .filter_map(|acc| acc.get("AcceleratorArn").cloned())
            .collect();
        let details = describe_each(
            session,
            "globalaccelerator",
            "describe_accelerator",
            "AcceleratorArn",
            &arns,
            "Accelerator",
        )
        .await;
        Ok(envelope("Accelerators", details))
    }

    fn empty(&self) -> Value {
        json!({"Accelerators": []})
    }

    fn normalize(&self, raw: &Value) -> Table {
        items(raw, "Accelerators")
            .iter()
            .map(|acc| {
                Row::new()
                    .cell("AcceleratorArn", field(acc, "AcceleratorArn"))
                    .cell("Name", field(acc, "Name"))
                    .cell("Status", field(acc, "Status"))
                    .cell("IpAddressType", field(acc, "IpAddressType"))
                    .cell("Enabled", field(acc, "Enabled"))
                    .cell("CreatedTime", timestamp(acc, "CreatedTime", DATETIME_FORMAT))
                    .cell("LastModifiedTime", timestamp(acc, "LastModifiedTime", DATETIME_FORMAT))
            })
            .collect()
    }
}

pub struct Route53;

const LIST_HOSTED_ZONES: ListCall =
    ListCall::new("route53", "list_hosted_zones", "HostedZones", NEXT_MARKER);

#[async_trait]
impl Collector for Route53 {
    fn key(&self) -> &'static str {
        "route53"
    }

    async fn fetch(&self, session: &dyn Session) -> Result<Value> {
        list_envelope(session, &LIST_HOSTED_ZONES).await
    }

    fn empty(&self) -> Value {
        json!({"HostedZones": []})
    }

    fn normalize(&self, raw: &Value) -> Table {
        items(raw, "HostedZones")
            .iter()
            .map(|zone| {
                let name = str_at(zone, "Name").unwrap_or("");
                let name = name.strip_suffix('.').unwrap_or(name);

                Row::new()
                    .cell("Name", name)
                    .cell("Id", field(zone, "Id"))
                    .cell("CallerReference", field(zone, "CallerReference"))
                    .cell("ResourceRecordSetCount", field(zone, "ResourceRecordSetCount"))
                    .cell("PrivateZone", field(zone, "Config.PrivateZone"))
                    .cell("Comment", field(zone, "Config.Comment"))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::table::Cell;

    #[test]
    fn test_s3_bucket_rows() {
        let table = S3.normalize(&json!({"Buckets": [
            {"Name": "logs", "CreationDate": "2022-11-30T09:15:00Z"},
            {"Name": "assets"}
        ]}));
        assert_eq!(table.rows()[0].get("CreationDate"), Some(&Cell::from("2022-11-30")));
        assert_eq!(table.rows()[1].get("CreationDate"), Some(&Cell::Null));
        assert_eq!(table.columns(), vec!["BucketName", "CreationDate"]);
    }

    #[test]
    fn test_route53_trims_trailing_dot() {
        let table = Route53.normalize(&json!({"HostedZones": [{
            "Id": "/hostedzone/Z1",
            "Name": "example.com.",
            "CallerReference": "ref-1",
            "ResourceRecordSetCount": 4,
            "Config": {"PrivateZone": false, "Comment": "public"}
        }]}));
        let row = &table.rows()[0];
        assert_eq!(row.get("Name"), Some(&Cell::from("example.com")));
        assert_eq!(row.get("PrivateZone"), Some(&Cell::Bool(false)));
        assert_eq!(row.get("Comment"), Some(&Cell::from("public")));
    }

    #[test]
    fn test_accelerator_rows() {
        let table = GlobalAccelerator.normalize(&json!({"Accelerators": [{
            "AcceleratorArn": "arn:aws:globalaccelerator::1:accelerator/abc",
            "Name": "edge",
            "Status": "DEPLOYED",
            "Enabled": true,
            "CreatedTime": "2023-02-02T02:02:02Z"
        }]}));
        let row = &table.rows()[0];
        assert_eq!(row.get("Enabled"), Some(&Cell::Bool(true)));
        assert_eq!(row.get("CreatedTime"), Some(&Cell::from("2023-02-02 02:02:02")));
        assert_eq!(row.get("LastModifiedTime"), Some(&Cell::Null));
    }
}
