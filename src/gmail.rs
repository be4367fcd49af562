use base64::{Engine as _, engine::general_purpose};
use log::debug;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::FetchError;

const GMAIL_API: &str = "https://gmail.googleapis.com/gmail/v1";

/// Only the first page of results is fetched. More than 500 matches in one
/// window is an accepted scope limit, not handled by pagination.
pub const MAX_RESULTS: u32 = 500;

/// One authenticated Gmail REST session (blocking).
pub struct GmailSession {
    http: reqwest::blocking::Client,
    access_token: String,
}

/// Opaque provider-assigned message id.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageSummary {
    pub id: String,
}

/// Structured headers and raw MIME payload for one message, merged from two
/// fetch calls by id.
#[derive(Debug, Clone)]
pub struct MessageContent {
    pub id: String,
    pub headers: Vec<(String, String)>,
    pub raw_body: Vec<u8>,
}

#[derive(Deserialize)]
struct ListResponse {
    #[serde(default)]
    messages: Vec<MessageSummary>,
}

#[derive(Deserialize)]
struct RawMessage {
    raw: String,
}

#[derive(Deserialize)]
struct MetadataMessage {
    #[serde(default)]
    payload: MessagePayload,
}

#[derive(Deserialize, Default)]
struct MessagePayload {
    #[serde(default)]
    headers: Vec<Header>,
}

#[derive(Deserialize)]
struct Header {
    name: String,
    value: String,
}

/// List/fetch seam between the pipeline and the Gmail REST calls, so tests
/// can run the pipeline against an in-memory mailbox.
pub trait MessageSource {
    fn list_messages(
        &self,
        label_id: &str,
        start_epoch_seconds: i64,
        end_epoch_seconds: i64,
    ) -> Result<Vec<MessageSummary>, FetchError>;

    fn fetch_message(&self, id: &str) -> Result<MessageContent, FetchError>;
}

/// Server-side time window filter, [start, end) in epoch seconds.
pub fn time_window_query(start_epoch_seconds: i64, end_epoch_seconds: i64) -> String {
    format!("after:{start_epoch_seconds} before:{end_epoch_seconds}")
}

fn list_url(label_id: &str, start: i64, end: i64) -> Result<Url, url::ParseError> {
    Url::parse_with_params(
        &format!("{GMAIL_API}/users/me/messages"),
        &[
            ("labelIds", label_id),
            ("q", &time_window_query(start, end)),
            ("maxResults", &MAX_RESULTS.to_string()),
        ],
    )
}

/// Gmail's raw payload is base64url; padding varies, so accept both.
fn decode_base64url(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
    general_purpose::URL_SAFE
        .decode(s)
        .or_else(|_| general_purpose::URL_SAFE_NO_PAD.decode(s))
}

impl GmailSession {
    pub fn new(access_token: String) -> Self {
        Self {
            http: reqwest::blocking::Client::new(),
            access_token,
        }
    }

    fn get_json<T: DeserializeOwned>(&self, url: Url, context: &str) -> Result<T, FetchError> {
        let resp = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                context: context.to_string(),
                body: resp.text().unwrap_or_default(),
            });
        }
        Ok(resp.json()?)
    }
}

impl MessageSource for GmailSession {
    /// List up to [`MAX_RESULTS`] message ids carrying `label_id` whose
    /// server-side timestamp falls in [start, end). Provider order, not
    /// re-sorted.
    fn list_messages(
        &self,
        label_id: &str,
        start_epoch_seconds: i64,
        end_epoch_seconds: i64,
    ) -> Result<Vec<MessageSummary>, FetchError> {
        let url = list_url(label_id, start_epoch_seconds, end_epoch_seconds)?;
        debug!("listing messages: {url}");
        let resp: ListResponse = self.get_json(url, "list messages")?;
        Ok(resp.messages)
    }

    /// Fetch one message as two calls (raw payload, then header metadata)
    /// merged into one [`MessageContent`].
    fn fetch_message(&self, id: &str) -> Result<MessageContent, FetchError> {
        let raw_url = Url::parse(&format!("{GMAIL_API}/users/me/messages/{id}?format=raw"))?;
        let raw: RawMessage = self.get_json(raw_url, &format!("message {id} (raw)"))?;

        let meta_url = Url::parse(&format!(
            "{GMAIL_API}/users/me/messages/{id}?format=metadata"
        ))?;
        let meta: MetadataMessage = self.get_json(meta_url, &format!("message {id} (metadata)"))?;

        let raw_body = decode_base64url(&raw.raw).map_err(|source| FetchError::RawDecode {
            id: id.to_string(),
            source,
        })?;

        Ok(MessageContent {
            id: id.to_string(),
            headers: meta
                .payload
                .headers
                .into_iter()
                .map(|h| (h.name, h.value))
                .collect(),
            raw_body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn time_window_is_after_before() {
        assert_eq!(time_window_query(1000, 2000), "after:1000 before:2000");
    }

    #[test]
    fn list_url_carries_label_window_and_cap() {
        let url = list_url("Label_7", 1000, 2000).unwrap();
        assert_eq!(url.path(), "/gmail/v1/users/me/messages");
        let pairs: HashMap<String, String> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(pairs["labelIds"], "Label_7");
        assert_eq!(pairs["q"], "after:1000 before:2000");
        assert_eq!(pairs["maxResults"], "500");
    }

    #[test]
    fn raw_payload_decodes_with_or_without_padding() {
        // "ab" encodes to "YWI=" padded, "YWI" unpadded
        assert_eq!(decode_base64url("YWI=").unwrap(), b"ab");
        assert_eq!(decode_base64url("YWI").unwrap(), b"ab");
        assert!(decode_base64url("!!!").is_err());
    }

    #[test]
    fn empty_list_response_deserializes() {
        // Gmail omits the messages field entirely when nothing matched
        let resp: ListResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.messages.is_empty());
    }

    #[test]
    fn list_response_yields_ids() {
        let resp: ListResponse =
            serde_json::from_str(r#"{"messages":[{"id":"m1","threadId":"t1"},{"id":"m2"}]}"#)
                .unwrap();
        let ids: Vec<&str> = resp.messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2"]);
    }

    #[test]
    fn metadata_response_yields_ordered_headers() {
        let meta: MetadataMessage = serde_json::from_str(
            r#"{"id":"m1","payload":{"headers":[
                {"name":"From","value":"a@example.com"},
                {"name":"Subject","value":"Invoice"}
            ]}}"#,
        )
        .unwrap();
        let headers: Vec<(String, String)> = meta
            .payload
            .headers
            .into_iter()
            .map(|h| (h.name, h.value))
            .collect();
        assert_eq!(headers[0].0, "From");
        assert_eq!(headers[1], ("Subject".to_string(), "Invoice".to_string()));
    }
}
