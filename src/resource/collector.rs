//! The collector contract

use super::table::Table;
use crate::aws::{format_aws_error, Session};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// One resource type: how to fetch it and how to flatten it into a table
#[async_trait]
pub trait Collector: Send + Sync {
    /// Catalog key (`ec2`, `security_groups`, ...)
    fn key(&self) -> &'static str;

    /// Issue the listing and detail calls and return the raw structure
    async fn fetch(&self, session: &dyn Session) -> Result<Value>;

    /// The raw structure of a resource type with no items
    fn empty(&self) -> Value;

    /// Flatten a raw structure into rows. Pure; malformed input yields no rows.
    fn normalize(&self, raw: &Value) -> Table;

    /// [`Collector::fetch`], falling back to [`Collector::empty`] on any error
    async fn fetch_raw(&self, session: &dyn Session, region: &str) -> Value {
        match self.fetch(session).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(
                    "Failed to fetch {} in {}: {}",
                    self.key(),
                    region,
                    format_aws_error(&e)
                );
                tracing::debug!("{} fetch error detail: {:#}", self.key(), e);
                self.empty()
            },
        }
    }
}
