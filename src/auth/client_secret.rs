use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::AuthError;

pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8080/callback";

/// The `installed` section of a Google "installed app" credentials.json.
#[derive(Debug, Deserialize)]
pub struct InstalledApp {
    pub client_id: String,
    pub client_secret: Option<String>,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    installed: InstalledApp,
}

pub fn load(path: &Path) -> Result<InstalledApp, AuthError> {
    let err = |reason: String| AuthError::ClientSecret {
        path: path.to_path_buf(),
        reason,
    };
    let s = fs::read_to_string(path).map_err(|e| err(e.to_string()))?;
    let parsed: ClientSecretFile = serde_json::from_str(&s).map_err(|e| err(e.to_string()))?;
    Ok(parsed.installed)
}
