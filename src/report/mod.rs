//! Report writer
//!
//! Persists a [`Run`] as a workbook plus raw and normalized JSON, all named
//! with the run's timestamp, and prints the run summary.

pub mod json;
pub mod workbook;

pub use json::{write_json, NormalizedDocument, RawDocument};
pub use workbook::{write_workbook, Sheet, SheetNames};

use crate::inventory::Run;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Output directory used when none is configured
pub const DEFAULT_OUTPUT_DIR: &str = "data";

/// The three files one report consists of
#[derive(Debug, Clone, PartialEq)]
pub struct ReportPaths {
    pub workbook: PathBuf,
    pub raw_json: PathBuf,
    pub normalized_json: PathBuf,
}

impl ReportPaths {
    /// `<stem>_<ts>.xlsx`, `<stem>_raw_<ts>.json`, `<stem>_normalized_<ts>.json`
    pub fn new(dir: &Path, stem: &str, timestamp: &str) -> Self {
        Self {
            workbook: dir.join(format!("{}_{}.xlsx", stem, timestamp)),
            raw_json: dir.join(format!("{}_raw_{}.json", stem, timestamp)),
            normalized_json: dir.join(format!("{}_normalized_{}.json", stem, timestamp)),
        }
    }
}

/// Create the output directory if needed
pub fn prepare_output_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Cannot create output directory {}", dir.display()))
}

/// Worksheets for every non-empty table, regions first, then globals
pub fn sheets(run: &Run) -> Vec<Sheet<'_>> {
    let mut names = SheetNames::new();
    let mut sheets = Vec::new();

    for region in &run.regional {
        for collected in region.collected.iter().filter(|c| !c.table.is_empty()) {
            let name = names.allocate(
                &collected.resource.sheet_prefix,
                Some(region.region.as_str()),
            );
            sheets.push(Sheet {
                name,
                table: &collected.table,
            });
        }
    }
    for collected in run.global.iter().filter(|c| !c.table.is_empty()) {
        sheets.push(Sheet {
            name: names.allocate(&collected.resource.sheet_prefix, None),
            table: &collected.table,
        });
    }

    sheets
}

/// Write the workbook, raw JSON and normalized JSON for `run` under `dir`
pub fn write_run(run: &Run, dir: &Path) -> Result<ReportPaths> {
    prepare_output_dir(dir)?;
    let paths = ReportPaths::new(dir, "aws_resources", &run.timestamp);

    // JSON first so a workbook failure never costs the raw data
    write_json(&paths.raw_json, &RawDocument(run))?;
    println!("\nRaw JSON written: {}", paths.raw_json.display());

    write_json(&paths.normalized_json, &NormalizedDocument(run))?;
    println!("Normalized JSON written: {}", paths.normalized_json.display());

    write_workbook(&paths.workbook, &sheets(run))?;
    println!("Workbook written: {}", paths.workbook.display());

    tracing::info!("Report for run {} written to {}", run.timestamp, dir.display());
    Ok(paths)
}

/// Summary lines: regions, selection, per-region and global row counts, total
pub fn summary_lines(run: &Run) -> Vec<String> {
    let mut lines = vec![
        "Inventory complete".to_string(),
        format!("Regions: {}", run.regions.join(", ")),
    ];

    if run.selects_all() {
        lines.push("Resources: all".to_string());
    } else {
        let mut keys: Vec<&str> = run.resources.iter().map(|r| r.key.as_str()).collect();
        keys.sort_unstable();
        lines.push(format!("Resources: {}", keys.join(", ")));
    }

    for region in &run.regional {
        let count: usize = region.collected.iter().map(|c| c.table.len()).sum();
        if count > 0 {
            lines.push(format!("  {}: {} resources", region.region, count));
        }
    }
    for collected in run.global.iter().filter(|c| !c.table.is_empty()) {
        lines.push(format!(
            "  {}: {} resources",
            collected.resource.display_name,
            collected.table.len()
        ));
    }

    lines.push(format!(
        "Total resources: {}",
        run.regional_row_count() + run.global_row_count()
    ));
    lines
}

pub fn print_summary(run: &Run) {
    println!();
    for line in summary_lines(run) {
        println!("{}", line);
    }
}
