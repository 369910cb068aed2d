//! Inventory orchestration
//!
//! A [`Run`] holds the region and resource selection for one execution and
//! accumulates what each collector returned. [`collect`] walks every region
//! for the regional resource types, then fetches each global type once.

use crate::aws::SessionFactory;
use crate::resource::{get_all_resource_keys, get_collector, get_resource, ResourceDef, Table};
use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Region used when neither the command line nor the config names one
pub const DEFAULT_REGION: &str = "ap-northeast-2";

/// Timestamp pattern shared by every output file of a run
pub const RUN_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S_%3f";

/// One resource type's result
#[derive(Debug, Clone)]
pub struct Collected {
    pub resource: &'static ResourceDef,
    pub raw: Value,
    pub table: Table,
}

/// Results for one region, in collection order
#[derive(Debug, Clone)]
pub struct RegionResult {
    pub region: String,
    pub collected: Vec<Collected>,
}

/// One execution of the inventory
#[derive(Debug, Clone)]
pub struct Run {
    pub timestamp: String,
    pub regions: Vec<String>,
    /// Selected resource types, in catalog order
    pub resources: Vec<&'static ResourceDef>,
    pub regional: Vec<RegionResult>,
    pub global: Vec<Collected>,
}

impl Run {
    /// Validate and deduplicate a selection. An empty resource list selects
    /// the whole catalog.
    pub fn new(regions: &[String], resources: &[String]) -> Result<Self> {
        Self::at(Utc::now(), regions, resources)
    }

    /// Like [`Run::new`] with an explicit start time
    pub fn at(started: DateTime<Utc>, regions: &[String], resources: &[String]) -> Result<Self> {
        let mut unique_regions: Vec<String> = Vec::new();
        for region in regions {
            if !unique_regions.contains(region) {
                unique_regions.push(region.clone());
            }
        }
        if unique_regions.is_empty() {
            unique_regions.push(DEFAULT_REGION.to_string());
        }

        for key in resources {
            if get_resource(key).is_none() {
                bail!("Unknown resource type: {}", key);
            }
        }
        let selected: Vec<&'static ResourceDef> = get_all_resource_keys()
            .into_iter()
            .filter(|key| resources.is_empty() || resources.iter().any(|r| r == key))
            .filter_map(get_resource)
            .collect();

        Ok(Self {
            timestamp: started.format(RUN_TIMESTAMP_FORMAT).to_string(),
            regions: unique_regions,
            resources: selected,
            regional: Vec::new(),
            global: Vec::new(),
        })
    }

    pub fn regional_resources(&self) -> impl Iterator<Item = &'static ResourceDef> + '_ {
        self.resources.iter().copied().filter(|r| !r.is_global)
    }

    pub fn global_resources(&self) -> impl Iterator<Item = &'static ResourceDef> + '_ {
        self.resources.iter().copied().filter(|r| r.is_global)
    }

    /// True when every resource type of the whole catalog was selected
    pub fn selects_all(&self) -> bool {
        self.resources.len() == get_all_resource_keys().len()
    }

    /// Store a result under its region, or in the global bucket for `None`
    pub fn record(&mut self, region: Option<&str>, collected: Collected) {
        let Some(region) = region else {
            self.global.push(collected);
            return;
        };

        match self.regional.iter_mut().find(|r| r.region == region) {
            Some(result) => result.collected.push(collected),
            None => self.regional.push(RegionResult {
                region: region.to_string(),
                collected: vec![collected],
            }),
        }
    }

    /// Normalized row count across regional results
    pub fn regional_row_count(&self) -> usize {
        self.regional
            .iter()
            .flat_map(|r| &r.collected)
            .map(|c| c.table.len())
            .sum()
    }

    /// Normalized row count across global results
    pub fn global_row_count(&self) -> usize {
        self.global.iter().map(|c| c.table.len()).sum()
    }
}

/// Fetch and normalize every selected (region, resource type) pair
///
/// Results are recorded as soon as each collector finishes, so a run that is
/// cancelled part-way keeps everything gathered up to that point.
pub async fn collect(run: &mut Run, factory: &dyn SessionFactory) {
    let regional: Vec<&'static ResourceDef> = run.regional_resources().collect();
    let global: Vec<&'static ResourceDef> = run.global_resources().collect();

    for region in run.regions.clone() {
        println!("\nCollecting {} ...", region);
        run.regional.push(RegionResult {
            region: region.clone(),
            collected: Vec::new(),
        });

        for &resource in &regional {
            let Some(collector) = get_collector(&resource.key) else {
                continue;
            };
            println!("  {} ...", resource.display_name);

            let session = factory.session(Some(region.as_str()));
            let raw = collector.fetch_raw(session.as_ref(), &region).await;
            let table = collector.normalize(&raw);
            tracing::info!("{} in {}: {} rows", resource.key, region, table.len());

            run.record(
                Some(region.as_str()),
                Collected {
                    resource,
                    raw,
                    table,
                },
            );
        }
    }

    for resource in global {
        let Some(collector) = get_collector(&resource.key) else {
            continue;
        };
        println!("\n{} (global) ...", resource.display_name);

        let session = factory.session(resource.region.as_deref());
        let region = session.region().to_string();
        let raw = collector.fetch_raw(session.as_ref(), &region).await;
        let table = collector.normalize(&raw);
        tracing::info!("{} (global, {}): {} rows", resource.key, region, table.len());

        run.record(
            None,
            Collected {
                resource,
                raw,
                table,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_run_collapses_duplicates() {
        let run = Run::new(
            &strings(&["us-east-1", "us-east-1", "eu-west-1"]),
            &strings(&["vpc", "ec2", "vpc"]),
        )
        .unwrap();
        assert_eq!(run.regions, strings(&["us-east-1", "eu-west-1"]));
        let keys: Vec<_> = run.resources.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["ec2", "vpc"]);
    }

    #[test]
    fn test_run_defaults() {
        let run = Run::new(&[], &[]).unwrap();
        assert_eq!(run.regions, strings(&[DEFAULT_REGION]));
        assert!(run.selects_all());
        assert_eq!(run.global_resources().count(), 3);
    }

    #[test]
    fn test_run_rejects_unknown_resource() {
        assert!(Run::new(&[], &strings(&["lambda"])).is_err());
    }

    #[test]
    fn test_run_timestamp_format() {
        let started = Utc
            .with_ymd_and_hms(2024, 3, 9, 7, 5, 1)
            .unwrap()
            .checked_add_signed(chrono::Duration::milliseconds(42))
            .unwrap();
        let run = Run::at(started, &[], &[]).unwrap();
        assert_eq!(run.timestamp, "20240309_070501_042");
    }

    #[test]
    fn test_record_groups_by_region() {
        let mut run = Run::new(&[], &strings(&["vpc", "s3"])).unwrap();
        let vpc = get_resource("vpc").unwrap();
        let s3 = get_resource("s3").unwrap();
        let collected = |resource| Collected {
            resource,
            raw: serde_json::json!({}),
            table: Table::new(),
        };

        run.record(Some("us-east-1"), collected(vpc));
        run.record(Some("eu-west-1"), collected(vpc));
        run.record(Some("us-east-1"), collected(vpc));
        run.record(None, collected(s3));

        assert_eq!(run.regional.len(), 2);
        assert_eq!(run.regional[0].collected.len(), 2);
        assert_eq!(run.global.len(), 1);
    }
}
