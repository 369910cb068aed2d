//! RDS instances, DynamoDB tables and ElastiCache clusters

use super::{envelope, field, list_envelope, timestamp, timestamp_or_na};
use crate::aws::Session;
use crate::resource::collector::Collector;
use crate::resource::extract::{items, DATETIME_FORMAT, DATE_FORMAT};
use crate::resource::fetcher::{describe_each, fetch_all, ListCall, Paging, MARKER};
use crate::resource::table::{Row, Table};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

pub struct Rds;

const DESCRIBE_DB_INSTANCES: ListCall =
    ListCall::new("rds", "describe_db_instances", "DBInstances", MARKER);

#[async_trait]
impl Collector for Rds {
    fn key(&self) -> &'static str {
        "rds"
    }

    async fn fetch(&self, session: &dyn Session) -> Result<Value> {
        list_envelope(session, &DESCRIBE_DB_INSTANCES).await
    }

    fn empty(&self) -> Value {
        json!({"DBInstances": []})
    }

    fn normalize(&self, raw: &Value) -> Table {
        items(raw, "DBInstances")
            .iter()
            .map(|db| {
                Row::new()
                    .cell("DBInstanceIdentifier", field(db, "DBInstanceIdentifier"))
                    .cell("DBInstanceClass", field(db, "DBInstanceClass"))
                    .cell("Engine", field(db, "Engine"))
                    .cell("DBInstanceStatus", field(db, "DBInstanceStatus"))
                    .cell("Endpoint", field(db, "Endpoint.Address"))
                    .cell("AllocatedStorage", field(db, "AllocatedStorage"))
            })
            .collect()
    }
}

/// DynamoDB tables, one DescribeTable per listed name
pub struct DynamoDb;

const LIST_TABLES: ListCall = ListCall::new(
    "dynamodb",
    "list_tables",
    "TableNames",
    Paging::Token {
        request: "ExclusiveStartTableName",
        response: "LastEvaluatedTableName",
    },
);

#[async_trait]
impl Collector for DynamoDb {
    fn key(&self) -> &'static str {
        "dynamodb"
    }

    async fn fetch(&self, session: &dyn Session) -> Result<Value> {
        let names = fetch_all(session, &LIST_TABLES).await?;
        let tables = describe_each(
            session,
            "dynamodb",
            "describe_table",
            "TableName",
            &names,
            "Table",
        )
        .await;
        Ok(envelope("Tables", tables))
    }

    fn empty(&self) -> Value {
        json!({"Tables": []})
    }

    fn normalize(&self, raw: &Value) -> Table {
        items(raw, "Tables")
            .iter()
            .map(|table| {
                Row::new()
                    .cell("TableName", field(table, "TableName"))
                    .cell("TableStatus", field(table, "TableStatus"))
                    .cell("CreationDateTime", timestamp(table, "CreationDateTime", DATETIME_FORMAT))
                    .cell("ItemCount", field(table, "ItemCount"))
                    .cell("TableSizeBytes", field(table, "TableSizeBytes"))
                    .cell(
                        "ReadCapacityUnits",
                        field(table, "ProvisionedThroughput.ReadCapacityUnits"),
                    )
                    .cell(
                        "WriteCapacityUnits",
                        field(table, "ProvisionedThroughput.WriteCapacityUnits"),
                    )
            })
            .collect()
    }
}

pub struct ElastiCache;

const DESCRIBE_CACHE_CLUSTERS: ListCall =
    ListCall::new("elasticache", "describe_cache_clusters", "CacheClusters", MARKER);

#[async_trait]
impl Collector for ElastiCache {
    fn key(&self) -> &'static str {
        "elasticache"
    }

    async fn fetch(&self, session: &dyn Session) -> Result<Value> {
        list_envelope(session, &DESCRIBE_CACHE_CLUSTERS).await
    }

    fn empty(&self) -> Value {
        json!({"CacheClusters": []})
    }

    fn normalize(&self, raw: &Value) -> Table {
        items(raw, "CacheClusters")
            .iter()
            .map(|cluster| {
                Row::new()
                    .cell("CacheClusterId", field(cluster, "CacheClusterId"))
                    .cell("Engine", field(cluster, "Engine"))
                    .cell("CacheNodeType", field(cluster, "CacheNodeType"))
                    .cell("EngineVersion", field(cluster, "EngineVersion"))
                    .cell("CacheClusterStatus", field(cluster, "CacheClusterStatus"))
                    .cell("NumCacheNodes", field(cluster, "NumCacheNodes"))
                    .cell("PreferredAvailabilityZone", field(cluster, "PreferredAvailabilityZone"))
                    .cell(
                        "CreatedTime",
                        timestamp_or_na(cluster, "CacheClusterCreateTime", DATE_FORMAT),
                    )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::Session;
    use crate::resource::table::Cell;
    use async_trait::async_trait;

    #[test]
    fn test_rds_endpoint_address() {
        let table = Rds.normalize(&json!({"DBInstances": [
            {"DBInstanceIdentifier": "db-1", "Engine": "postgres", "AllocatedStorage": 20,
             "Endpoint": {"Address": "db-1.abc.rds.amazonaws.com", "Port": 5432}},
            {"DBInstanceIdentifier": "db-2", "Engine": "mysql"}
        ]}));
        assert_eq!(
            table.rows()[0].get("Endpoint"),
            Some(&Cell::from("db-1.abc.rds.amazonaws.com"))
        );
        assert_eq!(table.rows()[0].get("AllocatedStorage"), Some(&Cell::Integer(20)));
        assert_eq!(table.rows()[1].get("Endpoint"), Some(&Cell::Null));
    }

    #[test]
    fn test_dynamodb_throughput_columns() {
        let table = DynamoDb.normalize(&json!({"Tables": [{
            "TableName": "orders",
            "TableStatus": "ACTIVE",
            "CreationDateTime": "2023-01-01T00:00:00Z",
            "ItemCount": 10,
            "TableSizeBytes": 2048,
            "ProvisionedThroughput": {"ReadCapacityUnits": 5, "WriteCapacityUnits": 2}
        }]}));
        let row = &table.rows()[0];
        assert_eq!(row.get("ReadCapacityUnits"), Some(&Cell::Integer(5)));
        assert_eq!(row.get("WriteCapacityUnits"), Some(&Cell::Integer(2)));
        assert_eq!(row.get("CreationDateTime"), Some(&Cell::from("2023-01-01 00:00:00")));
    }

    #[test]
    fn test_elasticache_missing_create_time() {
        let table = ElastiCache.normalize(&json!({"CacheClusters": [{"CacheClusterId": "redis-1"}]}));
        assert_eq!(table.rows()[0].get("CreatedTime"), Some(&Cell::from("N/A")));
    }

    struct Tables;

    #[async_trait]
    impl Session for Tables {
        fn region(&self) -> &str {
            "ap-northeast-2"
        }

        async fn invoke(&self, _service: &str, operation: &str, params: &Value) -> Result<Value> {
            match operation {
                "list_tables" => Ok(json!({"TableNames": ["a", "broken", "b"]})),
                "describe_table" => match params["TableName"].as_str() {
                    Some("broken") => Err(anyhow::anyhow!("ResourceNotFoundException")),
                    Some(name) => Ok(json!({"Table": {"TableName": name}})),
                    None => Err(anyhow::anyhow!("missing name")),
                },
                _ => Err(anyhow::anyhow!("unexpected {}", operation)),
            }
        }
    }

    #[test]
    fn test_dynamodb_fetch_skips_failed_tables() {
        let raw = tokio_test::block_on(DynamoDb.fetch(&Tables)).unwrap();
        assert_eq!(
            raw,
            json!({"Tables": [{"TableName": "a"}, {"TableName": "b"}]})
        );
    }
}
