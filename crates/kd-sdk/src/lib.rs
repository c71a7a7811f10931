//! # Kodopo SDK for Rust
//!
//! Client for the Kodopo job marketplace API, where students apply to
//! company job posts and companies invite students.
//!
//! ## Features
//!
//! - **Session pipeline**: bearer token on every call, one shared token
//!   refresh on 401 with queued replays, session termination when the
//!   refresh cannot recover
//! - **Asset URLs**: server-relative logo, avatar and file URLs are made
//!   absolute against the asset origin
//! - **Entity services**: auth, jobs, company and student endpoints
//! - **Navigation**: route guards by scope and API error routing
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kd_sdk::{Client, Config, FileCredentialStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(FileCredentialStore::open("./data/credentials.json")?);
//!     let client = Client::new(Config::new("https://kodopo.tech/api"), store)?;
//!
//!     client.auth().login("lan@example.com", "secret").await?;
//!     let jobs = client.jobs().list().await?;
//!     println!("{jobs:#}");
//!
//!     Ok(())
//! }
//! ```

pub mod assets;
pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod middleware;
pub mod navigation;
pub mod refresh;
pub mod request;
pub mod services;
pub mod session;

// Re-export main types
pub use client::Client;
pub use config::Config;
pub use credentials::{CredentialStore, Credentials, FileCredentialStore, MemoryCredentialStore};
pub use error::{Error, RefreshError, Result};
pub use kd_common::Role;
pub use middleware::Middleware;
pub use navigation::{NavigationDecision, Navigator, RouteTable};
pub use request::{ApiRequest, MultipartForm};
pub use reqwest::Method;
pub use services::Decision;
pub use session::{Session, SessionEvent, TerminationReason};
