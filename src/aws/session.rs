//! AWS Sessions
//!
//! A [`Session`] is a handle scoped to one region that can invoke a named
//! operation on a named service and return the API-shaped JSON page.

use super::sdk_dispatch;
use anyhow::Result;
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use serde_json::Value;

/// Region used when the environment does not configure one
pub const FALLBACK_REGION: &str = "us-east-1";

/// A region-scoped handle for issuing API calls
#[async_trait]
pub trait Session: Send + Sync {
    /// Region this session is bound to
    fn region(&self) -> &str;

    /// Invoke `operation` on `service` and return one response page
    async fn invoke(&self, service: &str, operation: &str, params: &Value) -> Result<Value>;
}

/// Creates sessions for a region, or for the provider default when `None`
pub trait SessionFactory: Send + Sync {
    fn session(&self, region: Option<&str>) -> Box<dyn Session>;
}

/// Session backed by the AWS SDK
#[derive(Clone)]
pub struct AwsSession {
    config: SdkConfig,
    region: String,
}

impl AwsSession {
    /// Create a session from a loaded SDK configuration
    pub fn new(config: SdkConfig) -> Self {
        let region = config
            .region()
            .map(|r| r.to_string())
            .unwrap_or_else(|| FALLBACK_REGION.to_string());
        Self { config, region }
    }

    /// The SDK configuration service clients are built from
    pub fn config(&self) -> &SdkConfig {
        &self.config
    }
}

#[async_trait]
impl Session for AwsSession {
    fn region(&self) -> &str {
        &self.region
    }

    async fn invoke(&self, service: &str, operation: &str, params: &Value) -> Result<Value> {
        sdk_dispatch::invoke_sdk(service, operation, self, params).await
    }
}

/// Builds [`AwsSession`]s from one shared credential/provider configuration
#[derive(Clone)]
pub struct AwsSessionFactory {
    base: SdkConfig,
}

impl AwsSessionFactory {
    /// Load the default provider chain (env, profile, IMDS, ...)
    pub async fn load() -> Self {
        let base = aws_config::defaults(BehaviorVersion::latest()).load().await;
        tracing::debug!(
            "Loaded AWS config, default region: {:?}",
            base.region().map(|r| r.to_string())
        );
        Self::new(base)
    }

    /// Use an already loaded configuration
    pub fn new(base: SdkConfig) -> Self {
        Self { base }
    }
}

impl SessionFactory for AwsSessionFactory {
    fn session(&self, region: Option<&str>) -> Box<dyn Session> {
        let config = match region {
            Some(region) => self
                .base
                .to_builder()
                .region(Region::new(region.to_string()))
                .build(),
            None if self.base.region().is_some() => self.base.clone(),
            None => self
                .base
                .to_builder()
                .region(Region::new(FALLBACK_REGION))
                .build(),
        };
        Box::new(AwsSession::new(config))
    }
}
