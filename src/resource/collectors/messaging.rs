//! Secrets Manager secrets and SES identities

use super::{field, list_envelope, tags, timestamp};
use crate::aws::identity::caller_identity;
use crate::aws::{format_aws_error, Session};
use crate::resource::collector::Collector;
use crate::resource::extract::{extract_name_value, items, join_tags, str_at, DATETIME_FORMAT};
use crate::resource::fetcher::{fetch_all, ListCall, NEXT_TOKEN};
use crate::resource::table::{Cell, Row, Table};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Map, Value};

pub struct SecretsManager;

const LIST_SECRETS: ListCall =
    ListCall::new("secretsmanager", "list_secrets", "SecretList", NEXT_TOKEN);

#[async_trait]
impl Collector for SecretsManager {
    fn key(&self) -> &'static str {
        "secrets_manager"
    }

    async fn fetch(&self, session: &dyn Session) -> Result<Value> {
        list_envelope(session, &LIST_SECRETS).await
    }

    fn empty(&self) -> Value {
        json!({"SecretList": []})
    }

    fn normalize(&self, raw: &Value) -> Table {
        items(raw, "SecretList")
            .iter()
            .map(|secret| {
                let name = extract_name_value(tags(secret))
                    .map(Cell::from)
                    .unwrap_or_else(|| field(secret, "Name"));

                Row::new()
                    .cell("Name", name)
                    .cell("ARN", field(secret, "ARN"))
                    .cell("Description", field(secret, "Description"))
                    .cell("LastChangedDate", timestamp(secret, "LastChangedDate", DATETIME_FORMAT))
                    .cell("Tags", join_tags(tags(secret), "=", ";"))
            })
            .collect()
    }
}

/// SES identities with their verification status and tags
pub struct SesIdentities;

const LIST_IDENTITIES: ListCall = ListCall::new("ses", "list_identities", "Identities", NEXT_TOKEN);

/// GetIdentityVerificationAttributes accepts at most this many identities
const VERIFICATION_BATCH: usize = 100;

impl SesIdentities {
    async fn verification_attributes(
        session: &dyn Session,
        identities: &[Value],
    ) -> Result<Map<String, Value>> {
        let mut attributes = Map::new();
        for batch in identities.chunks(VERIFICATION_BATCH) {
            let response = session
                .invoke(
                    "ses",
                    "get_identity_verification_attributes",
                    &json!({"Identities": batch}),
                )
                .await?;
            if let Some(Value::Object(found)) = response.get("VerificationAttributes") {
                attributes.extend(found.clone());
            }
        }
        Ok(attributes)
    }

    async fn identity_tags(session: &dyn Session, identities: &[Value]) -> Map<String, Value> {
        let account = match caller_identity(session).await {
            Ok(identity) => Some(identity.account),
            Err(e) => {
                tracing::warn!("Cannot resolve account for SES tags: {}", format_aws_error(&e));
                None
            },
        };

        let mut tags = Map::new();
        for identity in identities.iter().filter_map(Value::as_str) {
            let found = match account {
                Some(ref account) => {
                    let arn = format!(
                        "arn:aws:ses:{}:{}:identity/{}",
                        session.region(),
                        account,
                        identity
                    );
                    match session
                        .invoke("sesv2", "list_tags_for_resource", &json!({"ResourceArn": arn}))
                        .await
                    {
                        Ok(response) => response.get("Tags").cloned().unwrap_or_else(|| json!([])),
                        Err(e) => {
                            tracing::debug!("No tags for {}: {}", identity, format_aws_error(&e));
                            json!([])
                        },
                    }
                },
                None => json!([]),
            };
            tags.insert(identity.to_string(), found);
        }
        tags
    }
}

#[async_trait]
impl Collector for SesIdentities {
    fn key(&self) -> &'static str {
        "ses_identity"
    }

    async fn fetch(&self, session: &dyn Session) -> Result<Value> {
        let identities = fetch_all(session, &LIST_IDENTITIES).await?;
        if identities.is_empty() {
            return Ok(self.empty());
        }

        let verification = Self::verification_attributes(session, &identities).await?;
        let tags = Self::identity_tags(session, &identities).await;

        Ok(json!({
            "Identities": identities,
            "VerificationAttributes": verification,
            "Tags": tags,
        }))
    }

    fn empty(&self) -> Value {
        json!({"Identities": [], "VerificationAttributes": {}, "Tags": {}})
    }

    fn normalize(&self, raw: &Value) -> Table {
        items(raw, "Identities")
            .iter()
            .filter_map(Value::as_str)
            .map(|identity| {
                let identity_type = if identity.contains('@') { "Email" } else { "Domain" };
                let status = raw
                    .get("VerificationAttributes")
                    .and_then(|attrs| attrs.get(identity))
                    .and_then(|attr| str_at(attr, "VerificationStatus"))
                    .unwrap_or("Unknown");
                let tags = raw
                    .get("Tags")
                    .and_then(|tags| tags.get(identity))
                    .and_then(|tags| join_tags(tags, ":", ", "))
                    .unwrap_or_else(|| "No tags".to_string());

                Row::new()
                    .cell("Identity", identity)
                    .cell("IdentityType", identity_type)
                    .cell("IdentityStatus", status)
                    .cell("Tags", tags)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_secret_name_prefers_tag() {
        let table = SecretsManager.normalize(&json!({"SecretList": [
            {"Name": "db/password", "ARN": "arn:1", "Tags": [{"Key": "Name", "Value": "Database"}, {"Key": "Env", "Value": "prod"}]},
            {"Name": "api/key", "ARN": "arn:2"}
        ]}));
        assert_eq!(table.rows()[0].get("Name"), Some(&Cell::from("Database")));
        assert_eq!(
            table.rows()[0].get("Tags"),
            Some(&Cell::from("Name=Database;Env=prod"))
        );
        assert_eq!(table.rows()[1].get("Name"), Some(&Cell::from("api/key")));
        assert_eq!(table.rows()[1].get("Tags"), Some(&Cell::Null));
    }

    #[test]
    fn test_ses_identity_rows() {
        let raw = json!({
            "Identities": ["ops@example.com", "example.com", "new.example.org"],
            "VerificationAttributes": {
                "ops@example.com": {"VerificationStatus": "Success"},
                "example.com": {"VerificationStatus": "Pending", "VerificationToken": "tok"}
            },
            "Tags": {
                "ops@example.com": [{"Key": "Team", "Value": "ops"}, {"Key": "Env", "Value": "prod"}],
                "example.com": []
            }
        });
        let table = SesIdentities.normalize(&raw);
        assert_eq!(table.len(), 3);

        let email = &table.rows()[0];
        assert_eq!(email.get("IdentityType"), Some(&Cell::from("Email")));
        assert_eq!(email.get("IdentityStatus"), Some(&Cell::from("Success")));
        assert_eq!(email.get("Tags"), Some(&Cell::from("Team:ops, Env:prod")));

        let domain = &table.rows()[1];
        assert_eq!(domain.get("IdentityType"), Some(&Cell::from("Domain")));
        assert_eq!(domain.get("Tags"), Some(&Cell::from("No tags")));

        assert_eq!(table.rows()[2].get("IdentityStatus"), Some(&Cell::from("Unknown")));
    }

    /// Records the ARNs used for tag lookups
    struct Ses {
        arns: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Session for Ses {
        fn region(&self) -> &str {
            "us-west-2"
        }

        async fn invoke(&self, service: &str, operation: &str, params: &Value) -> Result<Value> {
            match (service, operation) {
                ("ses", "list_identities") => Ok(json!({"Identities": ["a@x.com", "x.com"]})),
                ("ses", "get_identity_verification_attributes") => Ok(json!({
                    "VerificationAttributes": {"a@x.com": {"VerificationStatus": "Success"}}
                })),
                ("sts", "get_caller_identity") => Ok(json!({"Account": "111122223333"})),
                ("sesv2", "list_tags_for_resource") => {
                    let arn = params["ResourceArn"].as_str().unwrap_or_default().to_string();
                    self.arns.lock().unwrap().push(arn.clone());
                    if arn.ends_with("x.com") && !arn.contains('@') {
                        Err(anyhow::anyhow!("AccessDenied"))
                    } else {
                        Ok(json!({"Tags": [{"Key": "Env", "Value": "dev"}]}))
                    }
                },
                _ => Err(anyhow::anyhow!("unexpected {}:{}", service, operation)),
            }
        }
    }

    #[test]
    fn test_ses_fetch_builds_identity_arns() {
        let session = Ses {
            arns: Mutex::new(Vec::new()),
        };
        let raw = tokio_test::block_on(SesIdentities.fetch(&session)).unwrap();

        assert_eq!(
            *session.arns.lock().unwrap(),
            vec![
                "arn:aws:ses:us-west-2:111122223333:identity/a@x.com",
                "arn:aws:ses:us-west-2:111122223333:identity/x.com"
            ]
        );
        assert_eq!(raw["Tags"]["x.com"], json!([]));

        let table = SesIdentities.normalize(&raw);
        assert_eq!(table.rows()[0].get("Tags"), Some(&Cell::from("Env:dev")));
        assert_eq!(table.rows()[1].get("IdentityStatus"), Some(&Cell::from("Unknown")));
    }
}
