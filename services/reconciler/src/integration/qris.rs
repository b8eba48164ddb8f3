// QRIS gateway client for fetching payment mutations

use async_trait::async_trait;
use reconciler_core::MutationEntry;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use super::MutationFeed;
use crate::error::{ReconcileError, Result};

pub struct QrisFeedClient {
    api_url: String,
    api_key: String,
    merchant_key: String,
    http_client: Client,
}

impl QrisFeedClient {
    pub fn new(api_url: &str, api_key: &str, merchant_key: &str) -> Self {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
            merchant_key: merchant_key.to_string(),
            http_client,
        }
    }
}

#[async_trait]
impl MutationFeed for QrisFeedClient {
    async fn fetch_mutations(&self) -> Result<Vec<MutationEntry>> {
        let response = self
            .http_client
            .post(&self.api_url)
            .form(&[
                ("api_key", self.api_key.as_str()),
                ("merchant_key", self.merchant_key.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ReconcileError::Feed(format!(
                "gateway returned {}",
                response.status()
            )));
        }

        let payload: Value = response.json().await?;
        Ok(parse_feed_payload(&payload))
    }
}

/// Lenient decoding of the gateway response. The API has been observed to
/// return a bare array, an object wrapping the array under `data`, `null`
/// on quiet periods, and error objects on upstream trouble. Anything that
/// is not a list of entries becomes an empty list; individual malformed
/// entries are dropped.
pub(crate) fn parse_feed_payload(payload: &Value) -> Vec<MutationEntry> {
    let items = match payload {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => match map.get("data") {
            Some(Value::Array(items)) => items.as_slice(),
            _ => {
                warn!("gateway payload has no mutation list");
                debug!("raw gateway payload: {}", payload);
                return Vec::new();
            }
        },
        _ => {
            warn!("gateway payload is not a mutation list");
            debug!("raw gateway payload: {}", payload);
            return Vec::new();
        }
    };

    items
        .iter()
        .filter_map(|item| match parse_entry(item) {
            Some(entry) => Some(entry),
            None => {
                debug!("dropping malformed mutation entry: {}", item);
                None
            }
        })
        .collect()
}

fn parse_entry(item: &Value) -> Option<MutationEntry> {
    let amount = parse_amount(item.get("amount")?)?;
    let date = item.get("date")?.as_str()?.to_string();
    Some(MutationEntry { amount, date })
}

/// Amounts arrive as numbers or as numeric strings, occasionally with a
/// decimal part; only the integer currency unit is kept.
fn parse_amount(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let integral = s.trim().split('.').next().unwrap_or("");
            integral.parse::<i64>().ok()
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_payload_is_empty() {
        assert!(parse_feed_payload(&Value::Null).is_empty());
    }

    #[test]
    fn test_object_without_data_is_empty() {
        assert!(parse_feed_payload(&json!({})).is_empty());
        assert!(parse_feed_payload(&json!({"status": "error"})).is_empty());
        assert!(parse_feed_payload(&json!({"data": "down for maintenance"})).is_empty());
    }

    #[test]
    fn test_empty_array_is_empty() {
        assert!(parse_feed_payload(&json!([])).is_empty());
        assert!(parse_feed_payload(&json!({"data": []})).is_empty());
    }

    #[test]
    fn test_bare_array_payload() {
        let payload = json!([
            {"amount": 50000, "date": "2025-08-25 10:00:00"},
            {"amount": "20000", "date": "2025-08-25 10:01:00"},
        ]);
        let entries = parse_feed_payload(&payload);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].amount, 50_000);
        assert_eq!(entries[1].amount, 20_000);
        assert_eq!(entries[1].date, "2025-08-25 10:01:00");
    }

    #[test]
    fn test_wrapped_array_payload() {
        let payload = json!({"status": "ok", "data": [
            {"amount": "15000.00", "date": "2025-08-25 09:59:30"},
        ]});
        let entries = parse_feed_payload(&payload);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].amount, 15_000);
    }

    #[test]
    fn test_malformed_entries_are_dropped() {
        let payload = json!([
            {"amount": 50000, "date": "2025-08-25 10:00:00"},
            {"amount": "lots", "date": "2025-08-25 10:00:00"},
            {"date": "2025-08-25 10:00:00"},
            {"amount": 10000},
            "not an object",
        ]);
        let entries = parse_feed_payload(&payload);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].amount, 50_000);
    }
}
