use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::error::AuthError;

/// Non-secret tokens metadata stored in ~/.config/gmail2notion/tokens.json
#[derive(Debug, Serialize, Deserialize)]
pub struct TokensFile {
    pub access_token: Option<String>,
    pub expires_at_epoch: Option<i64>, // epoch seconds
}

fn tokens_path() -> Result<PathBuf, AuthError> {
    let mut p = dirs::config_dir()
        .ok_or_else(|| AuthError::TokenCache("no config dir available".to_string()))?
        .join("gmail2notion");
    fs::create_dir_all(&p).map_err(|e| AuthError::TokenCache(e.to_string()))?;
    p.push("tokens.json");
    Ok(p)
}

/// Save access_token (non-secret) and expiry epoch
pub fn save_tokens(access_token: Option<&str>, expires_at_epoch: Option<i64>) -> Result<(), AuthError> {
    let p = tokens_path()?;
    let tf = TokensFile {
        access_token: access_token.map(|s| s.to_string()),
        expires_at_epoch,
    };
    let s = serde_json::to_string_pretty(&tf).map_err(|e| AuthError::TokenCache(e.to_string()))?;
    fs::write(&p, s).map_err(|e| AuthError::TokenCache(e.to_string()))
}

/// Load tokens file if present
pub fn load_tokens() -> Result<Option<TokensFile>, AuthError> {
    let p = tokens_path()?;
    if !p.exists() {
        return Ok(None);
    }
    let s = fs::read_to_string(&p).map_err(|e| AuthError::TokenCache(e.to_string()))?;
    let tf: TokensFile =
        serde_json::from_str(&s).map_err(|e| AuthError::TokenCache(e.to_string()))?;
    Ok(Some(tf))
}
