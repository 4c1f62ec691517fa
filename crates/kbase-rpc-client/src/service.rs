//! Service client: qualifies method names with a module name

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::client::{CallOptions, RpcClient};
use crate::error::{RpcClientError, RpcClientResult};

/// Calls `Module.func` on one endpoint
#[derive(Debug, Clone)]
pub struct ServiceClient {
    module: String,
    client: RpcClient,
}

impl ServiceClient {
    pub fn new(module: impl Into<String>, client: RpcClient) -> Self {
        Self {
            module: module.into(),
            client,
        }
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn rpc_client(&self) -> &RpcClient {
        &self.client
    }

    /// Fully qualified method name
    pub fn method_name(&self, func: &str) -> String {
        format!("{}.{}", self.module, func)
    }

    /// Call `func` with raw params and return the raw result
    pub async fn call_func_raw(
        &self,
        func: &str,
        params: Option<Value>,
        options: CallOptions,
    ) -> RpcClientResult<Value> {
        self.client.call(&self.method_name(func), params, options).await
    }

    /// Call `func` with typed params. A `null` params value is sent as absent.
    pub async fn call_func<P, R>(&self, func: &str, params: &P) -> RpcClientResult<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let params = match serde_json::to_value(params)? {
            Value::Null => None,
            other => Some(other),
        };
        let result = self.call_func_raw(func, params, CallOptions::default()).await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Call a method that takes one positional argument and returns one value.
    ///
    /// The argument is sent as `[params]` and the result is read from
    /// `result[0]`, whichever dialect carries it.
    pub async fn call_func_single<P, R>(&self, func: &str, params: &P) -> RpcClientResult<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let params = Value::Array(vec![serde_json::to_value(params)?]);
        let result = self
            .call_func_raw(func, Some(params), CallOptions::default())
            .await?;
        Ok(serde_json::from_value(first_element(func, result)?)?)
    }
}

/// Unwrap the single-element array convention
pub(crate) fn first_element(func: &str, result: Value) -> RpcClientResult<Value> {
    match result {
        Value::Array(items) => items.into_iter().next().ok_or_else(|| {
            RpcClientError::UnexpectedResult(format!("{} returned an empty result array", func))
        }),
        other => Err(RpcClientError::UnexpectedResult(format!(
            "{} returned {} where a result array was expected",
            func,
            kbase_rpc_envelope::error::json_type_name(&other)
        ))),
    }
}
