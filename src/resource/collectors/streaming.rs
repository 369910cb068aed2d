//! Kinesis Data Streams, Kinesis Data Firehose and Glue jobs

use super::{envelope, field, list_envelope, timestamp_or_na};
use crate::aws::Session;
use crate::resource::collector::Collector;
use crate::resource::extract::{items, DATE_FORMAT};
use crate::resource::fetcher::{describe_each, fetch_all, ListCall, Paging, NEXT_TOKEN};
use crate::resource::table::{Row, Table};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

pub struct KinesisStreams;

const LIST_STREAMS: ListCall = ListCall::new(
    "kinesis",
    "list_streams",
    "StreamNames",
    Paging::HasMore {
        flag: "HasMoreStreams",
        start: "ExclusiveStartStreamName",
    },
);

#[async_trait]
impl Collector for KinesisStreams {
    fn key(&self) -> &'static str {
        "kinesis_streams"
    }

    async fn fetch(&self, session: &dyn Session) -> Result<Value> {
        let names = fetch_all(session, &LIST_STREAMS).await?;
        let streams = describe_each(
            session,
            "kinesis",
            "describe_stream_summary",
            "StreamName",
            &names,
            "StreamDescriptionSummary",
        )
        .await;
        Ok(envelope("Streams", streams))
    }

    fn empty(&self) -> Value {
        json!({"Streams": []})
    }

    fn normalize(&self, raw: &Value) -> Table {
        items(raw, "Streams")
            .iter()
            .map(|stream| {
                Row::new()
                    .cell("StreamName", field(stream, "StreamName"))
                    .cell("StreamStatus", field(stream, "StreamStatus"))
                    .cell("RetentionPeriodHours", field(stream, "RetentionPeriodHours"))
                    .cell("OpenShardCount", field(stream, "OpenShardCount"))
                    .cell("StreamARN", field(stream, "StreamARN"))
            })
            .collect()
    }
}

pub struct KinesisFirehose;

const LIST_DELIVERY_STREAMS: ListCall = ListCall::new(
    "firehose",
    "list_delivery_streams",
    "DeliveryStreamNames",
    Paging::HasMore {
        flag: "HasMoreDeliveryStreams",
        start: "ExclusiveStartDeliveryStreamName",
    },
);

#[async_trait]
impl Collector for KinesisFirehose {
    fn key(&self) -> &'static str {
        "kinesis_firehose"
    }

    async fn fetch(&self, session: &dyn Session) -> Result<Value> {
        let names = fetch_all(session, &LIST_DELIVERY_STREAMS).await?;
        let streams = describe_each(
            session,
            "firehose",
            "describe_delivery_stream",
            "DeliveryStreamName",
            &names,
            "DeliveryStreamDescription",
        )
        .await;
        Ok(envelope("DeliveryStreams", streams))
    }

    fn empty(&self) -> Value {
        json!({"DeliveryStreams": []})
    }

    fn normalize(&self, raw: &Value) -> Table {
        items(raw, "DeliveryStreams")
            .iter()
            .map(|stream| {
                Row::new()
                    .cell("DeliveryStreamName", field(stream, "DeliveryStreamName"))
                    .cell("DeliveryStreamStatus", field(stream, "DeliveryStreamStatus"))
                    .cell("DeliveryStreamType", field(stream, "DeliveryStreamType"))
                    .cell("VersionId", field(stream, "VersionId"))
                    .cell("DeliveryStreamArn", field(stream, "DeliveryStreamArn"))
            })
            .collect()
    }
}

pub struct GlueJobs;

const GET_JOBS: ListCall = ListCall::new("glue", "get_jobs", "Jobs", NEXT_TOKEN);

#[async_trait]
impl Collector for GlueJobs {
    fn key(&self) -> &'static str {
        "glue_job"
    }

    async fn fetch(&self, session: &dyn Session) -> Result<Value> {
        list_envelope(session, &GET_JOBS).await
    }

    fn empty(&self) -> Value {
        json!({"Jobs": []})
    }

    fn normalize(&self, raw: &Value) -> Table {
        items(raw, "Jobs")
            .iter()
            .map(|job| {
                Row::new()
                    .cell("JobName", field(job, "Name"))
                    .cell("CreatedOn", timestamp_or_na(job, "CreatedOn", DATE_FORMAT))
                    .cell("LastModifiedOn", timestamp_or_na(job, "LastModifiedOn", DATE_FORMAT))
                    .cell("Role", field(job, "Role"))
                    .cell("Command", field(job, "Command.Name"))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::table::Cell;
    use std::sync::Mutex;

    /// Two listing pages, then one summary per stream
    struct Streams {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Session for Streams {
        fn region(&self) -> &str {
            "ap-northeast-2"
        }

        async fn invoke(&self, _service: &str, operation: &str, params: &Value) -> Result<Value> {
            self.calls.lock().unwrap().push(operation.to_string());
            match operation {
                "list_streams" if params.get("ExclusiveStartStreamName").is_none() => {
                    Ok(json!({"StreamNames": ["orders"], "HasMoreStreams": true}))
                },
                "list_streams" => Ok(json!({"StreamNames": ["clicks"], "HasMoreStreams": false})),
                "describe_stream_summary" => Ok(json!({"StreamDescriptionSummary": {
                    "StreamName": params["StreamName"],
                    "StreamStatus": "ACTIVE",
                    "OpenShardCount": 2
                }})),
                _ => Err(anyhow::anyhow!("unexpected {}", operation)),
            }
        }
    }

    #[test]
    fn test_kinesis_fetch_pages_and_describes() {
        let session = Streams {
            calls: Mutex::new(Vec::new()),
        };
        let raw = tokio_test::block_on(KinesisStreams.fetch(&session)).unwrap();
        let table = KinesisStreams.normalize(&raw);

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1].get("StreamName"), Some(&Cell::from("clicks")));
        assert_eq!(table.rows()[0].get("OpenShardCount"), Some(&Cell::Integer(2)));
        assert_eq!(
            *session.calls.lock().unwrap(),
            vec![
                "list_streams",
                "list_streams",
                "describe_stream_summary",
                "describe_stream_summary"
            ]
        );
    }

    #[test]
    fn test_glue_job_rows() {
        let table = GlueJobs.normalize(&json!({"Jobs": [{
            "Name": "etl", "Role": "arn:aws:iam::1:role/glue",
            "CreatedOn": "2023-07-01T00:00:00Z",
            "Command": {"Name": "glueetl"}
        }]}));
        let row = &table.rows()[0];
        assert_eq!(row.get("JobName"), Some(&Cell::from("etl")));
        assert_eq!(row.get("CreatedOn"), Some(&Cell::from("2023-07-01")));
        assert_eq!(row.get("LastModifiedOn"), Some(&Cell::from("N/A")));
        assert_eq!(row.get("Command"), Some(&Cell::from("glueetl")));
    }

    #[test]
    fn test_firehose_rows() {
        let table = KinesisFirehose.normalize(&json!({"DeliveryStreams": [
            {"DeliveryStreamName": "logs", "DeliveryStreamStatus": "ACTIVE", "VersionId": "1"}
        ]}));
        assert_eq!(table.rows()[0].get("VersionId"), Some(&Cell::from("1")));
        assert_eq!(table.rows()[0].get("DeliveryStreamType"), Some(&Cell::Null));
    }
}
