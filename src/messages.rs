//! Queue message payloads
//!
//! Inbound jobs and the three kinds of outbound messages, with their JSON
//! wire shapes:
//!
//! | Queue | Payload |
//! |-------|---------|
//! | inbound | `{"url": "...", "url_id": ...}` |
//! | `landing_crawler` | `[{"source_url_id": ..., "url": "..."}, ...]` |
//! | `landing_crawler_goose` | `{"source_url_id": ...}` |
//! | `error_crawler` | `{"url_id": ..., "url": "...", "error_message": "..."}` |
//!
//! Identifiers are opaque: whatever JSON value the producer sent as `url_id`
//! is echoed back unchanged.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A unit of work received from the inbound queue
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Job {
    /// The page to fetch
    pub url: String,

    /// Producer-assigned identifier, `null` when absent
    #[serde(default)]
    pub url_id: Value,
}

/// Whatever identifying fields could be read from an inbound body
///
/// Filled in before the body is checked against the [`Job`] shape so that an
/// error report can still name the job when that check fails.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobIdentity {
    pub url_id: Option<Value>,
    pub url: Option<String>,
}

impl Job {
    /// Parses an inbound message body
    ///
    /// `identity` receives the `url` and `url_id` fields as soon as the body
    /// is valid JSON, even if the body turns out not to be a valid job.
    pub fn parse(body: &[u8], identity: &mut JobIdentity) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_slice(body)?;

        identity.url_id = value.get("url_id").cloned();
        identity.url = value
            .get("url")
            .and_then(Value::as_str)
            .map(str::to_string);

        serde_json::from_value(value)
    }
}

/// One link found on a page, published as part of a link batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub source_url_id: Value,
    pub url: String,
}

/// All unique links found on one page
pub type LinkBatch = Vec<LinkRecord>;

/// Builds the link batch for a page, one record per link, in iteration order
pub fn link_batch<I>(source_url_id: &Value, links: I) -> LinkBatch
where
    I: IntoIterator<Item = String>,
{
    links
        .into_iter()
        .map(|url| LinkRecord {
            source_url_id: source_url_id.clone(),
            url,
        })
        .collect()
}

/// Signals that a page yielded no links
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmptyResultSignal {
    pub source_url_id: Value,
}

/// Describes a job that failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub url_id: Option<Value>,
    pub url: Option<String>,
    pub error_message: String,
}

impl ErrorReport {
    pub fn new(identity: &JobIdentity, error_message: impl Into<String>) -> Self {
        Self {
            url_id: identity.url_id.clone(),
            url: identity.url.clone(),
            error_message: error_message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_job() {
        let mut identity = JobIdentity::default();
        let job = Job::parse(br#"{"url": "https://a.com/", "url_id": 42}"#, &mut identity).unwrap();

        assert_eq!(job.url, "https://a.com/");
        assert_eq!(job.url_id, json!(42));
        assert_eq!(identity.url.as_deref(), Some("https://a.com/"));
        assert_eq!(identity.url_id, Some(json!(42)));
    }

    #[test]
    fn test_parse_job_with_string_id() {
        let mut identity = JobIdentity::default();
        let job = Job::parse(br#"{"url": "https://a.com/", "url_id": "abc-1"}"#, &mut identity)
            .unwrap();

        assert_eq!(job.url_id, json!("abc-1"));
    }

    #[test]
    fn test_missing_url_id_is_null() {
        let mut identity = JobIdentity::default();
        let job = Job::parse(br#"{"url": "https://a.com/"}"#, &mut identity).unwrap();

        assert_eq!(job.url_id, Value::Null);
        assert_eq!(identity.url_id, None);
    }

    #[test]
    fn test_missing_url_keeps_identity() {
        let mut identity = JobIdentity::default();
        let result = Job::parse(br#"{"url_id": 7}"#, &mut identity);

        assert!(result.is_err());
        assert_eq!(identity.url_id, Some(json!(7)));
        assert_eq!(identity.url, None);
    }

    #[test]
    fn test_invalid_json_leaves_identity_empty() {
        let mut identity = JobIdentity::default();
        let result = Job::parse(b"{not json", &mut identity);

        assert!(result.is_err());
        assert_eq!(identity, JobIdentity::default());
    }

    #[test]
    fn test_link_batch_shape() {
        let batch = link_batch(
            &json!(5),
            vec!["https://a.com/x".to_string(), "https://a.com/y".to_string()],
        );

        assert_eq!(
            serde_json::to_value(&batch).unwrap(),
            json!([
                {"source_url_id": 5, "url": "https://a.com/x"},
                {"source_url_id": 5, "url": "https://a.com/y"},
            ])
        );
    }

    #[test]
    fn test_empty_result_signal_shape() {
        let signal = EmptyResultSignal {
            source_url_id: json!("id-9"),
        };
        assert_eq!(
            serde_json::to_value(&signal).unwrap(),
            json!({"source_url_id": "id-9"})
        );
    }

    #[test]
    fn test_error_report_with_unknown_identity() {
        let report = ErrorReport::new(&JobIdentity::default(), "boom");
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({"url_id": null, "url": null, "error_message": "boom"})
        );
    }
}
