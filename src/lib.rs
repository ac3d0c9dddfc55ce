//! Ascari Gateway - HTTP backend for the Ascari sales dashboard
//!
//! The browser never talks to the ERP directly. It posts its ERP credentials
//! here with every call; the gateway runs the remote-object queries, reshapes
//! the results for display and serves the built frontend.
//!
//! ## Modules
//!
//! - **catalog**: Flat product categories to a nested tree
//! - **erp**: JSON-RPC client for the ERP object API
//! - **cache**: Quote snapshots behind short public codes
//! - **dashboard**: Router, handlers and display shapes
//! - **config**: TOML configuration

pub mod cache;
pub mod catalog;
pub mod config;
pub mod dashboard;
pub mod erp;

pub use config::Config;
pub use dashboard::{create_router, AppState, SharedState};
