//! Raw and normalized JSON documents
//!
//! Both documents are keyed by region, then by display name. Global resource
//! types sit beside the regions as top-level keys.

use crate::inventory::{Collected, Run};
use anyhow::{Context, Result};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::path::Path;

/// Every collected raw structure, including empty ones
pub struct RawDocument<'a>(pub &'a Run);

/// Normalized tables; empty tables are left out
pub struct NormalizedDocument<'a>(pub &'a Run);

struct RawEntries<'a>(&'a [Collected]);

struct NormalizedEntries<'a>(&'a [Collected]);

impl Serialize for RawEntries<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for collected in self.0 {
            map.serialize_entry(&collected.resource.display_name, &collected.raw)?;
        }
        map.end()
    }
}

impl Serialize for NormalizedEntries<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for collected in self.0.iter().filter(|c| !c.table.is_empty()) {
            map.serialize_entry(&collected.resource.display_name, &collected.table)?;
        }
        map.end()
    }
}

impl Serialize for RawDocument<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let run = self.0;
        let mut map = serializer.serialize_map(None)?;
        for region in &run.regional {
            map.serialize_entry(&region.region, &RawEntries(&region.collected))?;
        }
        for collected in &run.global {
            map.serialize_entry(&collected.resource.display_name, &collected.raw)?;
        }
        map.end()
    }
}

impl Serialize for NormalizedDocument<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let run = self.0;
        let mut map = serializer.serialize_map(None)?;
        for region in &run.regional {
            map.serialize_entry(&region.region, &NormalizedEntries(&region.collected))?;
        }
        for collected in run.global.iter().filter(|c| !c.table.is_empty()) {
            map.serialize_entry(&collected.resource.display_name, &collected.table)?;
        }
        map.end()
    }
}

/// Pretty-print `document` to `path`
pub fn write_json<T: Serialize + ?Sized>(path: &Path, document: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(document)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{get_resource, Row, Table};
    use serde_json::{json, Value};

    fn sample_run() -> Run {
        let mut run = Run::new(&["us-east-1".to_string()], &[]).unwrap();
        let vpc_table: Table = vec![Row::new().cell("VpcId", "vpc-1")].into_iter().collect();
        run.record(
            Some("us-east-1"),
            Collected {
                resource: get_resource("vpc").unwrap(),
                raw: json!({"Vpcs": [{"VpcId": "vpc-1"}]}),
                table: vpc_table,
            },
        );
        run.record(
            Some("us-east-1"),
            Collected {
                resource: get_resource("nat_gateway").unwrap(),
                raw: json!({"NatGateways": []}),
                table: Table::new(),
            },
        );
        run.record(
            None,
            Collected {
                resource: get_resource("s3").unwrap(),
                raw: json!({"Buckets": []}),
                table: Table::new(),
            },
        );
        run
    }

    #[test]
    fn test_raw_document_keeps_empty_results() {
        let doc: Value = serde_json::to_value(RawDocument(&sample_run())).unwrap();
        assert_eq!(doc["us-east-1"]["VPC"]["Vpcs"][0]["VpcId"], "vpc-1");
        assert_eq!(doc["us-east-1"]["NAT_Gateway"], json!({"NatGateways": []}));
        assert_eq!(doc["S3"], json!({"Buckets": []}));
    }

    #[test]
    fn test_normalized_document_omits_empty_tables() {
        let doc: Value = serde_json::to_value(NormalizedDocument(&sample_run())).unwrap();
        assert_eq!(doc["us-east-1"], json!({"VPC": [{"VpcId": "vpc-1"}]}));
        assert!(doc.get("S3").is_none());
    }
}
