//! EKS clusters and ECR repositories

use super::{envelope, field, list_envelope, timestamp, timestamp_or_na};
use crate::aws::Session;
use crate::resource::collector::Collector;
use crate::resource::extract::{items, lookup, text_or, DATETIME_FORMAT, DATE_FORMAT};
use crate::resource::fetcher::{describe_each, fetch_all, ListCall, NEXT_TOKEN_CAMEL};
use crate::resource::table::{Row, Table};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

pub struct Eks;

const LIST_CLUSTERS: ListCall = ListCall::new("eks", "list_clusters", "clusters", NEXT_TOKEN_CAMEL);

#[async_trait]
impl Collector for Eks {
    fn key(&self) -> &'static str {
        "eks"
    }

    async fn fetch(&self, session: &dyn Session) -> Result<Value> {
        let names = fetch_all(session, &LIST_CLUSTERS).await?;
        let clusters =
            describe_each(session, "eks", "describe_cluster", "name", &names, "cluster").await;
        Ok(envelope("Clusters", clusters))
    }

    fn empty(&self) -> Value {
        json!({"Clusters": []})
    }

    fn normalize(&self, raw: &Value) -> Table {
        items(raw, "Clusters")
            .iter()
            .map(|cluster| {
                Row::new()
                    .cell("Name", field(cluster, "name"))
                    .cell("Status", field(cluster, "status"))
                    .cell("Endpoint", field(cluster, "endpoint"))
                    .cell("Version", field(cluster, "version"))
                    .cell("CreatedAt", timestamp_or_na(cluster, "createdAt", DATE_FORMAT))
            })
            .collect()
    }
}

pub struct Ecr;

const DESCRIBE_REPOSITORIES: ListCall =
    ListCall::new("ecr", "describe_repositories", "repositories", NEXT_TOKEN_CAMEL);

#[async_trait]
impl Collector for Ecr {
    fn key(&self) -> &'static str {
        "ecr"
    }

    async fn fetch(&self, session: &dyn Session) -> Result<Value> {
        list_envelope(session, &DESCRIBE_REPOSITORIES).await
    }

    fn empty(&self) -> Value {
        json!({"repositories": []})
    }

    fn normalize(&self, raw: &Value) -> Table {
        items(raw, "repositories")
            .iter()
            .map(|repo| {
                let scan_on_push = lookup(repo, "imageScanningConfiguration.scanOnPush")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);

                Row::new()
                    .cell("RepositoryName", text_or(repo, "repositoryName", ""))
                    .cell("RepositoryArn", text_or(repo, "repositoryArn", ""))
                    .cell("RepositoryUri", text_or(repo, "repositoryUri", ""))
                    .cell("CreatedAt", timestamp(repo, "createdAt", DATETIME_FORMAT))
                    .cell("ImageTagMutability", text_or(repo, "imageTagMutability", ""))
                    .cell("ScanOnPush", scan_on_push)
            })
            .collect()
    }
}
