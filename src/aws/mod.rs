//! AWS API interaction module
//!
//! This module provides the core functionality for talking to AWS: region-scoped
//! sessions, the dispatch table that maps operation names onto SDK calls, and
//! error classification.
//!
//! # Module Structure
//!
//! - [`session`] - the [`Session`] seam, the SDK-backed session and its factory
//! - [`sdk_dispatch`] - maps `(service, operation)` names to concrete SDK calls
//! - [`raw`] - converts typed SDK members into API-shaped JSON
//! - [`identity`] - caller identity and region discovery
//! - [`error`] - error types and user-facing formatting
//!
//! # Example
//!
//! ```ignore
//! use awsinv::aws::{AwsSessionFactory, SessionFactory};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let factory = AwsSessionFactory::load().await;
//!     let session = factory.session(Some("ap-northeast-2"));
//!     let page = session.invoke("ec2", "describe_vpcs", &serde_json::json!({})).await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod identity;
pub mod raw;
pub mod sdk_dispatch;
pub mod session;

pub use error::{format_aws_error, AwsError};
pub use session::{AwsSession, AwsSessionFactory, Session, SessionFactory};
