//! # Envelope Prelude
//!
//! ```rust
//! use kbase_rpc_envelope::prelude::*;
//! ```

pub use crate::error::{EnvelopeResult, ProtocolError, RequestError};
pub use crate::request::{JsonRpc11Request, JsonRpc20Request, RequestEnvelope};
pub use crate::response::{ErrorCode, ResponseEnvelope, ResponsePayload, RpcErrorObject};
pub use crate::types::{Dialect, RequestId};
pub use crate::{JSONRPC_11_VERSION, JSONRPC_20_VERSION, error_codes};
