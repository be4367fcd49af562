pub mod client_secret;
pub mod oauth;
pub mod token_manager;
pub mod token_store;
pub mod tokens_file;

use crate::error::AuthError;

/// Anything that can mint a Gmail access token. Lets tests drive the
/// pipeline without a browser consent flow.
pub trait AccessTokenProvider {
    fn access_token(&self) -> Result<String, AuthError>;
}
