//! # RPC Client Prelude
//!
//! ```rust
//! use kbase_rpc_client::prelude::*;
//! ```

// Core client types
pub use crate::client::{CallOptions, RpcClient, RpcClientBuilder};
pub use crate::config::{CacheConfig, ClientConfig, ConnectionConfig, TimeoutConfig};
pub use crate::error::{RpcClientError, RpcClientResult, TransportError};
pub use crate::service::ServiceClient;

// Service resolution
pub use crate::cache::{CacheError, ResolutionCache};
pub use crate::dynamic::{DynamicServiceClient, ServiceCache};
pub use crate::services::{Search2LegacyClient, ServiceStatus, ServiceWizardClient};

// Transport types
pub use crate::transport::{HttpTransport, Transport};

// Envelope types
pub use kbase_rpc_envelope::prelude::*;

pub use std::time::Duration;
