//! Resource abstraction layer
//!
//! Resource types are listed in an embedded JSON catalog and implemented by
//! one [`Collector`] each. A collector fetches the raw API data for one region
//! and flattens it into a [`Table`].
//!
//! # Architecture
//!
//! - [`registry`] - Loads the catalog and pairs each entry with its collector
//! - [`collector`] - The fetch/normalize contract
//! - [`collectors`] - The implementations, grouped by service family
//! - [`fetcher`] - Pagination and per-item detail loops
//! - [`extract`] - Tag, timestamp and path helpers used by the normalizers
//! - [`table`] - The row/cell model every normalizer produces
//!
//! # Example
//!
//! ```ignore
//! use awsinv::resource::get_collector;
//!
//! async fn list_vpcs(session: &dyn awsinv::aws::Session) -> usize {
//!     let collector = get_collector("vpc").unwrap();
//!     let raw = collector.fetch_raw(session, session.region()).await;
//!     collector.normalize(&raw).len()
//! }
//! ```

pub mod collector;
pub mod collectors;
pub mod extract;
pub mod fetcher;
mod registry;
pub mod table;

pub use collector::Collector;
pub use registry::*;
pub use table::{Cell, Row, Table};
