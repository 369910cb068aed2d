//! Resource Fetcher
//!
//! Pagination and per-item detail loops shared by the collectors.

use crate::aws::{format_aws_error, Session};
use anyhow::Result;
use serde_json::{Map, Value};

/// How a listing operation signals further pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paging {
    /// Single call
    None,
    /// Continuation token returned under `response`, sent back under `request`
    Token {
        request: &'static str,
        response: &'static str,
    },
    /// Boolean `flag`; the next page starts after the last item, sent as `start`
    HasMore {
        flag: &'static str,
        start: &'static str,
    },
}

pub const NEXT_TOKEN: Paging = Paging::Token {
    request: "NextToken",
    response: "NextToken",
};

pub const NEXT_TOKEN_CAMEL: Paging = Paging::Token {
    request: "nextToken",
    response: "nextToken",
};

pub const MARKER: Paging = Paging::Token {
    request: "Marker",
    response: "Marker",
};

pub const NEXT_MARKER: Paging = Paging::Token {
    request: "Marker",
    response: "NextMarker",
};

/// A listing call and where its items live in each page
#[derive(Debug, Clone, Copy)]
pub struct ListCall {
    pub service: &'static str,
    pub operation: &'static str,
    pub items_key: &'static str,
    pub paging: Paging,
}

impl ListCall {
    pub const fn new(
        service: &'static str,
        operation: &'static str,
        items_key: &'static str,
        paging: Paging,
    ) -> Self {
        Self {
            service,
            operation,
            items_key,
            paging,
        }
    }
}

/// Fetch all pages of a listing call (auto-paginate)
pub async fn fetch_all(session: &dyn Session, call: &ListCall) -> Result<Vec<Value>> {
    let mut all_items = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let mut params = Map::new();
        if let Some(ref position) = cursor {
            let key = match call.paging {
                Paging::Token { request, .. } => request,
                Paging::HasMore { start, .. } => start,
                Paging::None => break,
            };
            params.insert(key.to_string(), Value::String(position.clone()));
        }

        let page = session
            .invoke(call.service, call.operation, &Value::Object(params))
            .await?;
        let items = page
            .get(call.items_key)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let next = match call.paging {
            Paging::None => None,
            Paging::Token { response, .. } => page
                .get(response)
                .and_then(Value::as_str)
                .filter(|token| !token.is_empty())
                .map(str::to_string),
            Paging::HasMore { flag, .. } => {
                let more = page.get(flag).and_then(Value::as_bool).unwrap_or(false);
                if more {
                    items.last().and_then(Value::as_str).map(str::to_string)
                } else {
                    None
                }
            },
        };

        tracing::debug!(
            "{}:{} page with {} items, more: {}",
            call.service,
            call.operation,
            items.len(),
            next.is_some()
        );
        all_items.extend(items);

        // A repeated cursor would loop forever
        if next.is_none() || next == cursor {
            break;
        }
        cursor = next;
    }

    Ok(all_items)
}

/// Issue one detail call per name and collect `result_key` from each response
///
/// A failed call skips that item with a warning.
pub async fn describe_each(
    session: &dyn Session,
    service: &str,
    operation: &str,
    param: &str,
    names: &[Value],
    result_key: &str,
) -> Vec<Value> {
    let mut details = Vec::with_capacity(names.len());

    for name in names {
        let Some(name) = name.as_str() else {
            continue;
        };
        let mut params = Map::new();
        params.insert(param.to_string(), Value::String(name.to_string()));

        match session
            .invoke(service, operation, &Value::Object(params))
            .await
        {
            Ok(response) => match response.get(result_key) {
                Some(detail) if !detail.is_null() => details.push(detail.clone()),
                _ => tracing::warn!(
                    "{}:{} returned no {} for {}",
                    service,
                    operation,
                    result_key,
                    name
                ),
            },
            Err(e) => {
                tracing::warn!(
                    "Skipping {} ({}:{}): {}",
                    name,
                    service,
                    operation,
                    format_aws_error(&e)
                );
            },
        }
    }

    details
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Replays canned pages and records the params of each call
    struct Pages {
        pages: Mutex<Vec<Value>>,
        calls: Mutex<Vec<Value>>,
    }

    impl Pages {
        fn new(pages: Vec<Value>) -> Self {
            Self {
                pages: Mutex::new(pages.into_iter().rev().collect()),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Session for Pages {
        fn region(&self) -> &str {
            "us-east-1"
        }

        async fn invoke(&self, _service: &str, _operation: &str, params: &Value) -> Result<Value> {
            self.calls.lock().unwrap().push(params.clone());
            self.pages
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| anyhow::anyhow!("no more pages"))
        }
    }

    #[test]
    fn test_token_pagination() {
        let session = Pages::new(vec![
            json!({"Vpcs": [{"VpcId": "vpc-1"}], "NextToken": "t1"}),
            json!({"Vpcs": [{"VpcId": "vpc-2"}]}),
        ]);
        let call = ListCall::new("ec2", "describe_vpcs", "Vpcs", NEXT_TOKEN);
        let items = tokio_test::block_on(fetch_all(&session, &call)).unwrap();

        assert_eq!(items.len(), 2);
        let calls = session.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], json!({}));
        assert_eq!(calls[1], json!({"NextToken": "t1"}));
    }

    #[test]
    fn test_has_more_pagination_starts_after_last_name() {
        let session = Pages::new(vec![
            json!({"StreamNames": ["a", "b"], "HasMoreStreams": true}),
            json!({"StreamNames": ["c"], "HasMoreStreams": false}),
        ]);
        let call = ListCall::new(
            "kinesis",
            "list_streams",
            "StreamNames",
            Paging::HasMore {
                flag: "HasMoreStreams",
                start: "ExclusiveStartStreamName",
            },
        );
        let items = tokio_test::block_on(fetch_all(&session, &call)).unwrap();

        assert_eq!(items, vec![json!("a"), json!("b"), json!("c")]);
        assert_eq!(
            session.calls.lock().unwrap()[1],
            json!({"ExclusiveStartStreamName": "b"})
        );
    }

    #[test]
    fn test_repeated_token_stops() {
        let session = Pages::new(vec![
            json!({"Items": [1], "NextToken": "same"}),
            json!({"Items": [2], "NextToken": "same"}),
            json!({"Items": [3]}),
        ]);
        let call = ListCall::new("x", "list", "Items", NEXT_TOKEN);
        let items = tokio_test::block_on(fetch_all(&session, &call)).unwrap();
        assert_eq!(items, vec![json!(1), json!(2)]);
    }

    #[test]
    fn test_describe_each_skips_failures() {
        // Second call fails because only one page is queued
        let session = Pages::new(vec![json!({"Table": {"TableName": "a"}})]);
        let names = vec![json!("a"), json!("b")];
        let details = tokio_test::block_on(describe_each(
            &session,
            "dynamodb",
            "describe_table",
            "TableName",
            &names,
            "Table",
        ));
        assert_eq!(details, vec![json!({"TableName": "a"})]);
    }
}
