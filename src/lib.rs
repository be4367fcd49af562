//! Push labelled Gmail messages into a Notion database.

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod gmail;
pub mod notion;
pub mod sync;
