//! Pure extraction of (subject, url) from one fetched message. No network,
//! no state; everything here is a function of its arguments.

use mailparse::ParsedMail;
use once_cell::sync::Lazy;
use regex::Regex;

static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").unwrap());

/// Body part preference when a message has alternatives.
const PART_PREFERENCE: [&str; 3] = ["text/plain", "multipart/related", "text/html"];

/// Value of the first header named exactly `Subject` (case-sensitive), taken
/// raw: MIME encoded-word subjects are not decoded. Empty string if absent.
pub fn extract_subject(headers: &[(String, String)]) -> String {
    headers
        .iter()
        .find(|(name, _)| name == "Subject")
        .map(|(_, value)| value.clone())
        .unwrap_or_default()
}

/// The **last** URL-shaped substring in the preferred body part of the raw
/// MIME payload. Forwarded/quoted mail tends to carry the relevant link at
/// the end, so the last match wins over the first.
pub fn extract_url(raw_body: &[u8]) -> Option<String> {
    let parsed = mailparse::parse_mail(raw_body).ok()?;
    let text = select_body_text(&parsed)?;
    last_url(&text)
}

/// Last `https?://` match in `text`, if any.
pub fn last_url(text: &str) -> Option<String> {
    URL_RE.find_iter(text).last().map(|m| m.as_str().to_string())
}

fn select_body_text(mail: &ParsedMail) -> Option<String> {
    for wanted in PART_PREFERENCE {
        if let Some(part) = find_part(mail, wanted) {
            return part_text(part);
        }
    }
    None
}

fn find_part<'a>(p: &'a ParsedMail<'a>, mimetype: &str) -> Option<&'a ParsedMail<'a>> {
    if p.ctype.mimetype.eq_ignore_ascii_case(mimetype) {
        return Some(p);
    }
    p.subparts.iter().find_map(|sp| find_part(sp, mimetype))
}

fn part_text(p: &ParsedMail) -> Option<String> {
    if p.ctype.mimetype.starts_with("multipart/") {
        // serialize the whole subtree; a URL in any child still counts
        Some(String::from_utf8_lossy(p.raw_bytes).into_owned())
    } else {
        p.get_body().ok()
    }
}
