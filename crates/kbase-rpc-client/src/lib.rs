//! # KBase JSON-RPC Client
//!
//! Async client for KBase services speaking JSON-RPC 1.1 or 2.0 over HTTP POST.
//!
//! ## Features
//!
//! - **Both dialects**: envelopes built and validated by `kbase-rpc-envelope`
//! - **Typed errors**: transport, protocol and remote failures stay distinct
//! - **Service clients**: `Module.func` naming with typed params and results
//! - **Dynamic services**: module locations looked up through the ServiceWizard
//!   and held in a single-flight [`ResolutionCache`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kbase_rpc_client::prelude::*;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RpcClient::builder("https://ci.kbase.us/services/ws")
//!         .dialect(Dialect::V1_1)
//!         .authorization("TOKEN")
//!         .build()?;
//!
//!     let version = client.call("Workspace.ver", None, CallOptions::default()).await?;
//!     println!("Workspace version: {}", version);
//!     Ok(())
//! }
//! ```
//!
//! ## Dynamic Services
//!
//! ```rust,no_run
//! use kbase_rpc_client::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::default().with_env_token();
//! let cache = Arc::new(ServiceCache::new(config.cache.clone())?);
//! cache.start_monitor();
//!
//! let wizard = RpcClient::builder("https://ci.kbase.us/services/service_wizard")
//!     .config(config)
//!     .build()?;
//! let client = DynamicServiceClient::new("RAST_SDK", wizard, Dialect::V1_1, cache)?;
//! let status: serde_json::Value = client.call_func_single("status", &serde_json::json!({})).await?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod dynamic;
pub mod error;
pub mod prelude;
pub mod service;
pub mod services;
pub mod transport;

// Re-export main types
pub use cache::{CacheError, CacheStatistics, ResolutionCache};
pub use client::{CallOptions, RpcClient, RpcClientBuilder};
pub use config::{CacheConfig, ClientConfig, ConnectionConfig, TimeoutConfig};
pub use dynamic::{DynamicServiceClient, ServiceCache};
pub use error::{RpcClientError, RpcClientResult, TransportError};
pub use service::ServiceClient;
pub use services::{Search2LegacyClient, ServiceStatus, ServiceWizardClient};

// Re-export transport types
pub use transport::{HttpTransport, Transport};

// Re-export envelope types for convenience
pub use kbase_rpc_envelope::{Dialect, ErrorCode, ProtocolError, RequestError, RpcErrorObject};
