//! Caller identity and region discovery

use super::error::format_aws_error;
use super::session::Session;
use anyhow::{Context, Result};
use serde_json::{json, Value};

/// Regions used when the account's region list cannot be retrieved
pub const FALLBACK_REGIONS: [&str; 3] = ["us-east-1", "us-west-2", "ap-northeast-2"];

/// Who the resolved credentials belong to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub account: String,
    pub arn: String,
    pub user_id: String,
}

/// Resolve the caller identity through STS
pub async fn caller_identity(session: &dyn Session) -> Result<CallerIdentity> {
    let response = session
        .invoke("sts", "get_caller_identity", &json!({}))
        .await?;
    let field = |key: &str| response.get(key).and_then(Value::as_str).map(str::to_string);

    Ok(CallerIdentity {
        account: field("Account").context("STS response has no Account")?,
        arn: field("Arn").unwrap_or_default(),
        user_id: field("UserId").unwrap_or_default(),
    })
}

/// Regions enabled for the account, or [`FALLBACK_REGIONS`] if the lookup fails
pub async fn list_regions(session: &dyn Session) -> Vec<String> {
    match session.invoke("ec2", "describe_regions", &json!({})).await {
        Ok(response) => {
            let regions: Vec<String> = response
                .get("Regions")
                .and_then(Value::as_array)
                .map(|regions| {
                    regions
                        .iter()
                        .filter_map(|r| r.get("RegionName").and_then(Value::as_str))
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            if regions.is_empty() {
                fallback_regions()
            } else {
                regions
            }
        },
        Err(e) => {
            tracing::warn!("Failed to list regions: {}", format_aws_error(&e));
            fallback_regions()
        },
    }
}

fn fallback_regions() -> Vec<String> {
    FALLBACK_REGIONS.iter().map(|r| r.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Fixed(Option<Value>);

    #[async_trait]
    impl Session for Fixed {
        fn region(&self) -> &str {
            "us-east-1"
        }

        async fn invoke(&self, _service: &str, _operation: &str, _params: &Value) -> Result<Value> {
            self.0.clone().ok_or_else(|| anyhow::anyhow!("denied"))
        }
    }

    #[test]
    fn test_caller_identity_reads_account() {
        let session = Fixed(Some(json!({
            "Account": "123456789012",
            "Arn": "arn:aws:iam::123456789012:user/ops",
            "UserId": "AIDA123"
        })));
        let identity = tokio_test::block_on(caller_identity(&session)).unwrap();
        assert_eq!(identity.account, "123456789012");
        assert_eq!(identity.user_id, "AIDA123");
    }

    #[test]
    fn test_list_regions_falls_back_on_error() {
        let regions = tokio_test::block_on(list_regions(&Fixed(None)));
        assert_eq!(regions, vec!["us-east-1", "us-west-2", "ap-northeast-2"]);
    }

    #[test]
    fn test_list_regions_from_response() {
        let session = Fixed(Some(json!({
            "Regions": [{"RegionName": "eu-west-1"}, {"RegionName": "ap-south-1"}]
        })));
        let regions = tokio_test::block_on(list_regions(&session));
        assert_eq!(regions, vec!["eu-west-1", "ap-south-1"]);
    }
}
