//! ServiceWizard: the discovery service for dynamic services

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use kbase_rpc_envelope::Dialect;

use crate::client::RpcClient;
use crate::error::{RpcClientError, RpcClientResult};
use crate::service::ServiceClient;

/// Module name the discovery service registers under
pub const SERVICE_WIZARD_MODULE: &str = "ServiceWizard";

/// Params of `ServiceWizard.get_service_status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetServiceStatusParams {
    pub module_name: String,
    /// Release version or tag; `null` asks for the default release
    pub version: Option<String>,
}

/// Where a dynamic service is running
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub module_name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_commit_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub up: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<String>,
    /// Fields this client does not model
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Client for the ServiceWizard (JSON-RPC 1.1)
#[derive(Debug, Clone)]
pub struct ServiceWizardClient {
    service: ServiceClient,
}

impl ServiceWizardClient {
    /// Wrap an RPC client aimed at the ServiceWizard URL
    pub fn new(client: RpcClient) -> RpcClientResult<Self> {
        if client.dialect() != Dialect::V1_1 {
            return Err(RpcClientError::config(format!(
                "{} speaks {}, not {}",
                SERVICE_WIZARD_MODULE,
                Dialect::V1_1,
                client.dialect()
            )));
        }
        Ok(Self {
            service: ServiceClient::new(SERVICE_WIZARD_MODULE, client),
        })
    }

    pub fn url(&self) -> &url::Url {
        self.service.rpc_client().url()
    }

    /// Look up where `module_name` is served
    pub async fn get_service_status(
        &self,
        module_name: &str,
        version: Option<&str>,
    ) -> RpcClientResult<ServiceStatus> {
        let params = GetServiceStatusParams {
            module_name: module_name.to_string(),
            version: version.map(str::to_string),
        };
        self.service
            .call_func_single("get_service_status", &params)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_params_send_null_version() {
        let params = GetServiceStatusParams {
            module_name: "KBaseSearchEngine".to_string(),
            version: None,
        };
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({"module_name": "KBaseSearchEngine", "version": null})
        );
    }

    #[test]
    fn test_status_keeps_unknown_fields() {
        let status: ServiceStatus = serde_json::from_value(json!({
            "module_name": "RAST_SDK",
            "url": "https://ci.kbase.us/dynserv/abc.RAST-SDK",
            "version": "1.0.0",
            "up": 1,
            "release_tags": ["release", "beta"],
            "dynamic_service": 1
        }))
        .unwrap();
        assert_eq!(status.module_name, "RAST_SDK");
        assert_eq!(status.up, Some(1));
        assert_eq!(status.extra.get("dynamic_service"), Some(&json!(1)));
        assert!(status.health.is_none());
    }

    #[test]
    fn test_requires_v11_client() {
        let client = RpcClient::new("http://localhost:5000", Dialect::V2_0).unwrap();
        assert!(matches!(
            ServiceWizardClient::new(client),
            Err(RpcClientError::Config(_))
        ));
    }
}
