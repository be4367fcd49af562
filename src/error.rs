use std::path::PathBuf;

use thiserror::Error;

/// Local state file problems.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no user config directory available")]
    NoConfigDir,
    #[error("created template config at {0}; edit it and run again")]
    TemplateCreated(PathBuf),
    #[error("could not access config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config at {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Either provider rejecting credentials, or the consent flow failing.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("client secret file {path}: {reason}")]
    ClientSecret { path: PathBuf, reason: String },
    #[error("invalid oauth endpoint or redirect uri: {0}")]
    BadEndpoint(#[from] url::ParseError),
    #[error("could not bind oauth callback listener on {addr}: {reason}")]
    CallbackBind { addr: String, reason: String },
    #[error("no authorization code received within the consent timeout")]
    ConsentTimeout,
    #[error("token exchange failed: {0}")]
    TokenExchange(String),
    #[error("keyring: {0}")]
    Keyring(String),
    #[error("token cache: {0}")]
    TokenCache(String),
    #[error("notion rejected the integration token ({status}): {body}")]
    NotionToken {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("notion auth request failed: {0}")]
    NotionTransport(#[source] reqwest::Error),
}

/// Gmail listing or retrieval rejected. Propagated, never retried.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("gmail request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("bad gmail url: {0}")]
    BadUrl(#[from] url::ParseError),
    #[error("gmail returned {status} for {context}: {body}")]
    Status {
        status: reqwest::StatusCode,
        context: String,
        body: String,
    },
    #[error("message {id}: raw payload is not valid base64url: {source}")]
    RawDecode {
        id: String,
        #[source]
        source: base64::DecodeError,
    },
}

/// Notion rejected a page creation. One failure aborts the batch.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("notion request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("notion rejected page creation ({status}): {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Publish(#[from] PublishError),
}
