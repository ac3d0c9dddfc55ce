//! ERP remote-object API
//!
//! Talks to an Odoo-compatible server over its JSON-RPC endpoint:
//! - `common` service: `version`, `authenticate`
//! - `object` service: `execute_kw` against any model
//!
//! Records are decoded into typed structs right after each call (see
//! [`records`]) so nothing downstream pokes at raw JSON.

pub mod client;
pub mod records;
pub mod url;

pub use client::{ErpClient, ErpConnection, SearchOptions, Session};
pub use url::{http_fallback, normalize_url};

/// ERP call errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ErpError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {0} from ERP server")]
    Http(u16),

    #[error("{message}")]
    Remote {
        /// Exception class reported by the server, if any
        name: Option<String>,
        message: String,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ErpError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => ErpError::Http(status.as_u16()),
            None => ErpError::Network(e.to_string()),
        }
    }
}
