use indicatif::ProgressBar;
use log::{debug, info};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::auth::AccessTokenProvider;
use crate::config;
use crate::error::Error;
use crate::extract;
use crate::gmail::{GmailSession, MessageSource};
use crate::notion::{NotionClient, PagePublisher};

#[derive(Debug)]
pub struct RunReport {
    pub uploaded: usize,
}

pub fn now_epoch_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Authenticate to both providers, then run one batch against the live
/// endpoints.
pub fn run(
    config_path: &Path,
    tokens: &dyn AccessTokenProvider,
    notion_token: &str,
) -> Result<RunReport, Error> {
    let access_token = tokens.access_token()?;
    let gmail = GmailSession::new(access_token);
    let notion = NotionClient::new(notion_token.to_string())?;
    run_batch(config_path, &gmail, &notion)
}

/// One full batch: load state, list the window [watermark, now), fetch and
/// extract each message, create one page per message, then persist `now` as
/// the new watermark.
///
/// The watermark write is gated on the whole batch succeeding. Any failure
/// before it leaves the config untouched, so the next run replays the same
/// window; that can duplicate pages already created before the failure, an
/// accepted property of the single-watermark design.
pub fn run_batch(
    config_path: &Path,
    mail: &dyn MessageSource,
    notes: &dyn PagePublisher,
) -> Result<RunReport, Error> {
    let mut cfg = config::load_config(config_path)?;
    let end = now_epoch_seconds();

    let summaries = mail.list_messages(&cfg.gmail_label, cfg.last_update_seconds, end)?;
    info!(
        "{} message(s) in window [{}, {})",
        summaries.len(),
        cfg.last_update_seconds,
        end
    );

    let uploaded = summaries.len();
    if uploaded > 0 {
        let bar = ProgressBar::new(uploaded as u64);
        for summary in &summaries {
            debug!("processing message {}", summary.id);
            let message = mail.fetch_message(&summary.id)?;
            let subject = extract::extract_subject(&message.headers);
            let url = extract::extract_url(&message.raw_body);
            notes.create_page(&cfg.notion_database_id, &subject, url.as_deref())?;
            bar.inc(1);
        }
        bar.finish_and_clear();
    }

    // never move the watermark backwards, whatever the clock said
    cfg.last_update_seconds = end.max(cfg.last_update_seconds);
    config::save_config(config_path, &cfg)?;

    Ok(RunReport { uploaded })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::{FetchError, PublishError};
    use crate::gmail::{MessageContent, MessageSummary};
    use std::cell::RefCell;
    use std::fs;
    use std::path::PathBuf;

    struct FakeMail {
        messages: Vec<MessageContent>,
    }

    impl MessageSource for FakeMail {
        fn list_messages(
            &self,
            _label_id: &str,
            _start: i64,
            _end: i64,
        ) -> Result<Vec<MessageSummary>, FetchError> {
            Ok(self
                .messages
                .iter()
                .map(|m| MessageSummary { id: m.id.clone() })
                .collect())
        }

        fn fetch_message(&self, id: &str) -> Result<MessageContent, FetchError> {
            self.messages
                .iter()
                .find(|m| m.id == id)
                .cloned()
                .ok_or_else(|| FetchError::Status {
                    status: reqwest::StatusCode::NOT_FOUND,
                    context: format!("message {id}"),
                    body: String::new(),
                })
        }
    }

    struct FakeNotion {
        created: RefCell<Vec<(String, String, Option<String>)>>,
        fail_on_call: Option<usize>,
    }

    impl FakeNotion {
        fn new(fail_on_call: Option<usize>) -> Self {
            Self {
                created: RefCell::new(Vec::new()),
                fail_on_call,
            }
        }
    }

    impl PagePublisher for FakeNotion {
        fn create_page(
            &self,
            database_id: &str,
            subject: &str,
            url: Option<&str>,
        ) -> Result<(), PublishError> {
            let call = self.created.borrow().len();
            if self.fail_on_call == Some(call) {
                return Err(PublishError::Rejected {
                    status: reqwest::StatusCode::TOO_MANY_REQUESTS,
                    body: "rate limited".to_string(),
                });
            }
            self.created.borrow_mut().push((
                database_id.to_string(),
                subject.to_string(),
                url.map(str::to_string),
            ));
            Ok(())
        }
    }

    fn temp_config(name: &str, watermark: i64) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "gmail2notion-sync-{}-{}.json",
            std::process::id(),
            name
        ));
        let cfg = Config {
            gmail_label: "Label_1".to_string(),
            notion_database_id: "db-1".to_string(),
            last_update_seconds: watermark,
        };
        config::save_config(&path, &cfg).unwrap();
        path
    }

    fn plain_message(id: &str, subject: &str, body: &str) -> MessageContent {
        MessageContent {
            id: id.to_string(),
            headers: vec![("Subject".to_string(), subject.to_string())],
            raw_body: format!("Content-Type: text/plain\r\n\r\n{body}\r\n").into_bytes(),
        }
    }

    #[test]
    fn empty_window_publishes_nothing_and_advances_watermark() {
        let path = temp_config("empty", 1000);
        let mail = FakeMail { messages: vec![] };
        let notes = FakeNotion::new(None);

        let report = run_batch(&path, &mail, &notes).unwrap();

        assert_eq!(report.uploaded, 0);
        assert!(notes.created.borrow().is_empty());
        assert!(config::load_config(&path).unwrap().last_update_seconds >= 1000);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn one_message_becomes_one_page() {
        let path = temp_config("single", 1000);
        let mail = FakeMail {
            messages: vec![plain_message(
                "m1",
                "Invoice",
                "see http://a.example and also http://b.example thanks",
            )],
        };
        let notes = FakeNotion::new(None);

        let report = run_batch(&path, &mail, &notes).unwrap();

        assert_eq!(report.uploaded, 1);
        assert_eq!(
            *notes.created.borrow(),
            vec![(
                "db-1".to_string(),
                "Invoice".to_string(),
                Some("http://b.example".to_string()),
            )]
        );
        assert!(config::load_config(&path).unwrap().last_update_seconds >= 1000);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn failed_publish_mid_batch_leaves_watermark_untouched() {
        let path = temp_config("midfail", 1000);
        let mail = FakeMail {
            messages: vec![
                plain_message("m1", "First", "http://a.example"),
                plain_message("m2", "Second", "http://b.example"),
            ],
        };
        // first page succeeds, second is rejected
        let notes = FakeNotion::new(Some(1));

        let err = run_batch(&path, &mail, &notes).unwrap_err();

        assert!(matches!(err, Error::Publish(_)));
        assert_eq!(notes.created.borrow().len(), 1);
        assert_eq!(config::load_config(&path).unwrap().last_update_seconds, 1000);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn watermark_never_decreases() {
        // watermark already past "now": a successful run must not regress it
        let future = 4102444800; // 2100-01-01
        let path = temp_config("future", future);
        let mail = FakeMail { messages: vec![] };
        let notes = FakeNotion::new(None);

        run_batch(&path, &mail, &notes).unwrap();

        assert_eq!(
            config::load_config(&path).unwrap().last_update_seconds,
            future
        );
        let _ = fs::remove_file(&path);
    }
}
