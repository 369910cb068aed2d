//! Standalone security-groups report
//!
//! Collects the security groups of several regions into one table with a
//! leading `Region` column and flags groups with inbound rules open to the
//! whole internet.

use crate::aws::identity::{caller_identity, list_regions, CallerIdentity};
use crate::aws::{format_aws_error, AwsError, Session, SessionFactory};
use crate::inventory::RUN_TIMESTAMP_FORMAT;
use crate::report::{prepare_output_dir, write_json, write_workbook, ReportPaths, Sheet};
use crate::resource::collectors::SecurityGroups;
use crate::resource::extract::items;
use crate::resource::{Cell, Collector, Table};
use anyhow::Result;
use chrono::Utc;
use serde_json::Value;
use std::path::Path;

/// Worksheet holding the whole report
pub const SHEET_NAME: &str = "Security Groups";

/// Printed when no usable credentials are found
pub const CREDENTIAL_GUIDANCE: [&str; 4] = [
    "AWS credentials are not configured. Set them up in one of these ways:",
    "  1. AWS CLI: aws configure",
    "  2. Environment variables: AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY",
    "  3. An IAM role (when running on EC2)",
];

/// Check credentials, printing the account on success and guidance on failure
pub async fn verify_credentials(session: &dyn Session) -> Option<CallerIdentity> {
    match caller_identity(session).await {
        Ok(identity) => {
            println!("AWS account: {}", identity.account);
            println!("Caller: {}", identity.arn);
            Some(identity)
        },
        Err(e) => {
            if matches!(e.downcast_ref::<AwsError>(), Some(AwsError::Credentials(_))) {
                for line in CREDENTIAL_GUIDANCE {
                    println!("{}", line);
                }
            } else {
                println!("Failed to verify AWS credentials: {}", format_aws_error(&e));
            }
            tracing::debug!("Credential check failed: {:#}", e);
            None
        },
    }
}

/// The regions named on the command line, or every region of the account
pub async fn resolve_regions(session: &dyn Session, requested: &[String]) -> Vec<String> {
    if !requested.is_empty() {
        let mut regions: Vec<String> = Vec::new();
        for region in requested {
            if !regions.contains(region) {
                regions.push(region.clone());
            }
        }
        return regions;
    }
    list_regions(session).await
}

/// Security groups gathered across regions
#[derive(Debug, Clone)]
pub struct SgReport {
    pub timestamp: String,
    pub regions: Vec<String>,
    /// Raw groups, each tagged with its `Region`
    pub raw: Vec<Value>,
    pub table: Table,
}

impl SgReport {
    pub fn new(regions: Vec<String>) -> Self {
        Self {
            timestamp: Utc::now().format(RUN_TIMESTAMP_FORMAT).to_string(),
            regions,
            raw: Vec::new(),
            table: Table::new(),
        }
    }

    /// Add one region's raw DescribeSecurityGroups result
    pub fn add_region(&mut self, region: &str, raw: &Value) {
        for group in items(raw, "SecurityGroups") {
            let mut tagged = group.clone();
            if let Value::Object(ref mut map) = tagged {
                map.insert("Region".to_string(), Value::String(region.to_string()));
            }
            self.raw.push(tagged);
        }

        let rows = SecurityGroups
            .normalize(raw)
            .into_iter()
            .map(|row| row.with_leading("Region", region));
        self.table.extend(rows);
    }

    /// Groups that allow inbound traffic from anywhere
    pub fn any_open(&self) -> impl Iterator<Item = &crate::resource::Row> {
        self.table
            .rows()
            .iter()
            .filter(|row| row.get("AnyOpenInbound") == Some(&Cell::Bool(true)))
    }

    /// Group count per region, in region order
    pub fn region_counts(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for row in self.table.rows() {
            let region = row.get("Region").map(Cell::display).unwrap_or_default();
            match counts.iter_mut().find(|(r, _)| *r == region) {
                Some((_, count)) => *count += 1,
                None => counts.push((region, 1)),
            }
        }
        counts
    }
}

/// Fetch the security groups of every region, one region-scoped session each
pub async fn collect(report: &mut SgReport, factory: &dyn SessionFactory) {
    for region in report.regions.clone() {
        println!("Collecting security groups in {} ...", region);
        let session = factory.session(Some(region.as_str()));
        let raw = SecurityGroups.fetch_raw(session.as_ref(), &region).await;
        report.add_region(&region, &raw);
    }
}

/// Write `security_groups_*` files; the workbook and normalized JSON only when
/// groups were found
pub fn write_report(report: &SgReport, dir: &Path) -> Result<ReportPaths> {
    prepare_output_dir(dir)?;
    let paths = ReportPaths::new(dir, "security_groups", &report.timestamp);

    write_json(&paths.raw_json, &report.raw)?;
    println!("Raw JSON written: {}", paths.raw_json.display());

    if !report.table.is_empty() {
        write_json(&paths.normalized_json, &report.table)?;
        println!("Normalized JSON written: {}", paths.normalized_json.display());

        write_workbook(
            &paths.workbook,
            &[Sheet {
                name: SHEET_NAME.to_string(),
                table: &report.table,
            }],
        )?;
        println!("Workbook written: {}", paths.workbook.display());
    }

    Ok(paths)
}

pub fn summary_lines(report: &SgReport) -> Vec<String> {
    if report.table.is_empty() {
        return vec!["No security groups found.".to_string()];
    }

    let open: Vec<_> = report.any_open().collect();
    let counts = report.region_counts();
    let mut lines = vec![
        "Security groups summary".to_string(),
        format!("  Regions: {}", counts.len()),
        format!("  Security groups: {}", report.table.len()),
        format!("  Open to the internet (inbound): {}", open.len()),
    ];

    if !open.is_empty() {
        lines.push("Security groups that need attention:".to_string());
        for row in open {
            let text = |column: &str| row.get(column).map(Cell::display).unwrap_or_default();
            lines.push(format!(
                "    - {} ({}) in {}",
                text("SecurityGroupId"),
                text("SecurityGroupName"),
                text("Region")
            ));
        }
    }

    lines.push("Security groups per region:".to_string());
    for (region, count) in counts {
        lines.push(format!("    {}: {}", region, count));
    }
    lines
}

pub fn print_summary(report: &SgReport) {
    println!();
    for line in summary_lines(report) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn group(id: &str, cidr: &str) -> Value {
        json!({
            "GroupId": id,
            "GroupName": format!("{}-name", id),
            "VpcId": "vpc-1",
            "Description": "test",
            "IpPermissions": [{
                "IpProtocol": "tcp", "FromPort": 22, "ToPort": 22,
                "IpRanges": [{"CidrIp": cidr}]
            }],
            "IpPermissionsEgress": []
        })
    }

    fn sample() -> SgReport {
        let mut report = SgReport::new(vec!["us-east-1".into(), "eu-west-1".into()]);
        report.add_region(
            "us-east-1",
            &json!({"SecurityGroups": [group("sg-1", "0.0.0.0/0"), group("sg-2", "10.0.0.0/8")]}),
        );
        report.add_region("eu-west-1", &json!({"SecurityGroups": [group("sg-3", "10.1.0.0/16")]}));
        report
    }

    #[test]
    fn test_rows_lead_with_region() {
        let report = sample();
        let columns = report.table.columns();
        assert_eq!(columns[0], "Region");
        assert_eq!(columns[1], "SecurityGroupId");
        assert_eq!(report.raw[2]["Region"], "eu-west-1");
        assert_eq!(report.raw[2]["GroupId"], "sg-3");
    }

    #[test]
    fn test_summary() {
        let lines = summary_lines(&sample());
        assert!(lines.contains(&"  Regions: 2".to_string()));
        assert!(lines.contains(&"  Security groups: 3".to_string()));
        assert!(lines.contains(&"  Open to the internet (inbound): 1".to_string()));
        assert!(lines.contains(&"    - sg-1 (sg-1-name) in us-east-1".to_string()));
        assert!(lines.contains(&"    us-east-1: 2".to_string()));
    }

    #[test]
    fn test_summary_empty() {
        let report = SgReport::new(vec!["us-east-1".into()]);
        assert_eq!(summary_lines(&report), vec!["No security groups found."]);
    }

    #[test]
    fn test_requested_regions_deduplicated() {
        struct Unused;

        #[async_trait::async_trait]
        impl Session for Unused {
            fn region(&self) -> &str {
                "us-east-1"
            }

            async fn invoke(&self, _: &str, _: &str, _: &Value) -> Result<Value> {
                Err(anyhow::anyhow!("no calls expected"))
            }
        }

        let regions = tokio_test::block_on(resolve_regions(
            &Unused,
            &["us-east-1".to_string(), "us-east-1".to_string()],
        ));
        assert_eq!(regions, vec!["us-east-1"]);
    }
}
