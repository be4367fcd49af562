use log::{debug, warn};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::auth::{AccessTokenProvider, client_secret, oauth, token_store, tokens_file};
use crate::error::AuthError;

/// Decides how to obtain a Gmail access token: cached token, refresh token,
/// then interactive PKCE consent, in that order.
#[derive(Clone)]
pub struct TokenManager {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
}

impl TokenManager {
    pub fn from_client_secret(path: &Path) -> Result<Self, AuthError> {
        let app = client_secret::load(path)?;
        let redirect_uri = app
            .redirect_uris
            .first()
            .cloned()
            .unwrap_or_else(|| client_secret::DEFAULT_REDIRECT_URI.to_string());

        Ok(Self {
            client_id: app.client_id,
            client_secret: app.client_secret,
            redirect_uri,
        })
    }

    fn cache_access_token(&self, t: &oauth::Tokens, now: i64) -> Result<(), AuthError> {
        let exp = t.expires_in.map(|s| now + s as i64).unwrap_or(now + 3500);
        tokens_file::save_tokens(Some(&t.access_token), Some(exp))
    }
}

impl AccessTokenProvider for TokenManager {
    /// Returns a valid access token; refreshes/PKCE if needed.
    fn access_token(&self) -> Result<String, AuthError> {
        // a clock before the epoch just makes every cached token look expired
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);

        // 1) cached & not expired
        if let Some(tf) = tokens_file::load_tokens()? {
            if let (Some(at), Some(exp)) = (tf.access_token, tf.expires_at_epoch) {
                if now < exp {
                    debug!("using cached access token");
                    return Ok(at);
                }
            }
        }

        // 2) refresh if possible
        if let Some(rt) = token_store::load_refresh_token(&self.client_id)? {
            match oauth::refresh_access_token(&self.client_id, self.client_secret.as_deref(), &rt)
            {
                Ok(t) => {
                    self.cache_access_token(&t, now)?;
                    return Ok(t.access_token);
                }
                Err(e) => warn!("refresh failed: {e}; falling back to interactive consent"),
            }
        }

        // 3) otherwise PKCE
        let t = oauth::perform_pkce_flow(
            &self.client_id,
            self.client_secret.as_deref(),
            &self.redirect_uri,
        )?;

        // best-effort: a missing keyring shouldn't lose the session we just got
        if let Some(rt) = &t.refresh_token {
            if let Err(e) = token_store::save_refresh_token(&self.client_id, rt) {
                warn!("could not store refresh token in keyring: {e}");
            }
        }

        self.cache_access_token(&t, now)?;
        Ok(t.access_token)
    }
}
