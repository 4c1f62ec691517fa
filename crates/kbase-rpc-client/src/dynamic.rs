//! Service client whose location is looked up through the ServiceWizard

use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use url::Url;

use kbase_rpc_envelope::Dialect;

use crate::cache::ResolutionCache;
use crate::client::{CallOptions, RpcClient};
use crate::error::{RpcClientError, RpcClientResult};
use crate::service::ServiceClient;
use crate::services::{ServiceStatus, ServiceWizardClient};
use crate::transport::parse_endpoint;

/// Version tag meaning "whatever the discovery service considers current"
pub const AUTO_VERSION: &str = "auto";

/// Cache of module locations shared between dynamic clients
pub type ServiceCache = ResolutionCache<ServiceStatus, RpcClientError>;

/// Resolves its module on every call, then calls it like a [`ServiceClient`]
#[derive(Debug)]
pub struct DynamicServiceClient {
    /// Module as configured; the discovery service may canonicalize it
    module: String,
    version: Option<String>,
    discovery: ServiceWizardClient,
    /// Settings used to call the resolved endpoint
    service_template: RpcClient,
    cache: Arc<ServiceCache>,
    resolved: RwLock<Option<ServiceStatus>>,
}

impl DynamicServiceClient {
    /// `client` points at the ServiceWizard; its token, timeout and transport
    /// are reused for the resolved service, which is spoken to in `dialect`.
    pub fn new(
        module: impl Into<String>,
        client: RpcClient,
        dialect: Dialect,
        cache: Arc<ServiceCache>,
    ) -> RpcClientResult<Self> {
        let service_template = client.with_dialect(dialect);
        let discovery = ServiceWizardClient::new(client.with_dialect(Dialect::V1_1))?;
        Ok(Self {
            module: module.into(),
            version: None,
            discovery,
            service_template,
            cache,
            resolved: RwLock::new(None),
        })
    }

    /// Pin a release version or tag. `"auto"` and empty clear the pin.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        let version = version.into();
        self.version = if version.is_empty() || version == AUTO_VERSION {
            None
        } else {
            Some(version)
        };
        self
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Module name, canonicalized once a lookup has completed
    pub fn module(&self) -> String {
        self.resolved
            .read()
            .as_ref()
            .map(|status| status.module_name.clone())
            .unwrap_or_else(|| self.module.clone())
    }

    /// Endpoint of the last successful lookup
    pub fn url(&self) -> Option<String> {
        self.resolved.read().as_ref().map(|status| status.url.clone())
    }

    pub fn discovery_url(&self) -> &Url {
        self.discovery.url()
    }

    /// Key under which this module's location is cached
    pub fn module_key(&self) -> String {
        format!(
            "{}:{}",
            self.module,
            self.version.as_deref().unwrap_or(AUTO_VERSION)
        )
    }

    /// Look up the module, through the shared cache
    pub async fn resolve(&self) -> RpcClientResult<ServiceStatus> {
        let key = self.module_key();
        let discovery = self.discovery.clone();
        let module = self.module.clone();
        let version = self.version.clone();

        let status = self
            .cache
            .get_item_with_wait(&key, move || {
                let discovery = discovery.clone();
                let module = module.clone();
                let version = version.clone();
                async move {
                    debug!(module = %module, version = ?version, "Looking up service location");
                    discovery
                        .get_service_status(&module, version.as_deref())
                        .await
                }
            })
            .await?;

        *self.resolved.write() = Some(status.clone());
        Ok(status)
    }

    async fn service_client(&self) -> RpcClientResult<ServiceClient> {
        let status = self.resolve().await?;
        let url = parse_endpoint(&status.url)?;
        Ok(ServiceClient::new(
            status.module_name,
            self.service_template.with_url(url),
        ))
    }

    pub async fn call_func_raw(
        &self,
        func: &str,
        params: Option<Value>,
        options: CallOptions,
    ) -> RpcClientResult<Value> {
        self.service_client()
            .await?
            .call_func_raw(func, params, options)
            .await
    }

    pub async fn call_func<P, R>(&self, func: &str, params: &P) -> RpcClientResult<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.service_client().await?.call_func(func, params).await
    }

    pub async fn call_func_single<P, R>(&self, func: &str, params: &P) -> RpcClientResult<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.service_client()
            .await?
            .call_func_single(func, params)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;

    fn client(module: &str) -> DynamicServiceClient {
        let wizard = RpcClient::new("http://localhost:5000/services/service_wizard", Dialect::V2_0)
            .unwrap();
        let cache = Arc::new(ServiceCache::new(CacheConfig::default()).unwrap());
        DynamicServiceClient::new(module, wizard, Dialect::V2_0, cache).unwrap()
    }

    #[test]
    fn test_module_key() {
        assert_eq!(client("RAST_SDK").module_key(), "RAST_SDK:auto");
        assert_eq!(
            client("RAST_SDK").with_version("beta").module_key(),
            "RAST_SDK:beta"
        );
        let auto = client("RAST_SDK").with_version("auto");
        assert_eq!(auto.version(), None);
        assert_eq!(auto.module_key(), "RAST_SDK:auto");
    }

    #[test]
    fn test_unresolved_state() {
        let client = client("RAST_SDK");
        assert_eq!(client.module(), "RAST_SDK");
        assert!(client.url().is_none());
        assert_eq!(client.discovery_url().path(), "/services/service_wizard");
    }
}
