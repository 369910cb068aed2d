//! awsinv - inventory AWS resources into spreadsheet and JSON reports
//!
//! # Module Structure
//!
//! - [`aws`] - sessions, SDK dispatch, caller identity and error formatting
//! - [`resource`] - collector trait, catalog registry, extractors and the table model
//! - [`inventory`] - the orchestrator that runs collectors over regions
//! - [`report`] - workbook and JSON writers, run summary
//! - [`sg_report`] - the standalone security-groups report
//! - [`config`] - persisted user defaults
//! - [`logging`] - tracing setup shared by both binaries

pub mod aws;
pub mod config;
pub mod inventory;
pub mod logging;
pub mod report;
pub mod resource;
pub mod sg_report;

/// Version injected at compile time via AWSINV_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("AWSINV_VERSION") {
    Some(v) => v,
    None => "dev",
};
