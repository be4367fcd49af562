use keyring::{Entry, Error as KeyringError};

use crate::error::AuthError;

const SERVICE: &str = "gmail2notion";

fn entry(client_id: &str) -> Result<Entry, AuthError> {
    Entry::new(SERVICE, client_id).map_err(|e| AuthError::Keyring(e.to_string()))
}

/// Save a refresh token into the OS keyring, keyed by client_id
pub fn save_refresh_token(client_id: &str, refresh_token: &str) -> Result<(), AuthError> {
    entry(client_id)?
        .set_password(refresh_token)
        .map_err(|e| AuthError::Keyring(e.to_string()))
}

/// Load a refresh token from the keyring, keyed by client_id
pub fn load_refresh_token(client_id: &str) -> Result<Option<String>, AuthError> {
    match entry(client_id)?.get_password() {
        Ok(v) => Ok(Some(v)),
        Err(KeyringError::NoEntry) => Ok(None),
        Err(e) => Err(AuthError::Keyring(e.to_string())),
    }
}
