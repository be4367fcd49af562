use log::debug;
use serde_json::{Value, json};

use crate::error::{AuthError, PublishError};

const NOTION_API: &str = "https://api.notion.com/v1";
const NOTION_VERSION: &str = "2022-06-28";

/// Page-creation seam between the pipeline and the Notion API, so tests can
/// record pages in memory instead of creating them remotely.
pub trait PagePublisher {
    fn create_page(
        &self,
        database_id: &str,
        subject: &str,
        url: Option<&str>,
    ) -> Result<(), PublishError>;
}

/// Blocking Notion API client. One page is created per extracted message;
/// creation is fire-and-forget (no read-back of the created page).
pub struct NotionClient {
    http: reqwest::blocking::Client,
    token: String,
}

/// Create-page payload: `subject` lands in the `Name` title property, `url`
/// in the `URL` url property (null when the message had no link).
fn page_payload(database_id: &str, subject: &str, url: Option<&str>) -> Value {
    json!({
        "parent": { "database_id": database_id },
        "properties": {
            "Name": { "title": [{ "text": { "content": subject } }] },
            "URL": { "url": url },
        }
    })
}

impl NotionClient {
    /// Validates the integration token up front so a bad token fails the run
    /// before any Gmail fetches happen.
    pub fn new(token: String) -> Result<Self, AuthError> {
        let http = reqwest::blocking::Client::new();
        let resp = http
            .get(format!("{NOTION_API}/users/me"))
            .bearer_auth(&token)
            .header("Notion-Version", NOTION_VERSION)
            .send()
            .map_err(AuthError::NotionTransport)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AuthError::NotionToken {
                status,
                body: resp.text().unwrap_or_default(),
            });
        }
        Ok(Self { http, token })
    }
}

impl PagePublisher for NotionClient {
    fn create_page(
        &self,
        database_id: &str,
        subject: &str,
        url: Option<&str>,
    ) -> Result<(), PublishError> {
        debug!("creating page in {database_id} for subject {subject:?}");
        let resp = self
            .http
            .post(format!("{NOTION_API}/pages"))
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
            .json(&page_payload(database_id, subject, url))
            .send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(PublishError::Rejected {
                status,
                body: resp.text().unwrap_or_default(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_places_subject_and_url() {
        let p = page_payload("db-1", "Invoice", Some("http://b.example"));
        assert_eq!(p["parent"]["database_id"], "db-1");
        assert_eq!(
            p["properties"]["Name"]["title"][0]["text"]["content"],
            "Invoice"
        );
        assert_eq!(p["properties"]["URL"]["url"], "http://b.example");
    }

    #[test]
    fn missing_url_serializes_as_null() {
        let p = page_payload("db-1", "", None);
        assert!(p["properties"]["URL"]["url"].is_null());
        assert_eq!(p["properties"]["Name"]["title"][0]["text"]["content"], "");
    }
}
