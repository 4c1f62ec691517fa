//! Search2 legacy API (`KBaseSearchEngine`)
//!
//! The endpoint speaks JSON-RPC 2.0 but keeps the 1.1 convention of wrapping
//! params and result in single-element arrays.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::HashMap;

use kbase_rpc_envelope::Dialect;

use crate::client::RpcClient;
use crate::error::{RpcClientError, RpcClientResult};
use crate::service::ServiceClient;

pub const SEARCH2_MODULE: &str = "KBaseSearchEngine";

/// KIDL boolean, carried on the wire as `0` or `1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SdkBoolean(pub bool);

impl From<bool> for SdkBoolean {
    fn from(value: bool) -> Self {
        Self(value)
    }
}

impl From<SdkBoolean> for bool {
    fn from(value: SdkBoolean) -> Self {
        value.0
    }
}

impl Serialize for SdkBoolean {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(self.0))
    }
}

impl<'de> Deserialize<'de> for SdkBoolean {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match u8::deserialize(deserializer)? {
            0 => Ok(Self(false)),
            1 => Ok(Self(true)),
            other => Err(serde::de::Error::custom(format!(
                "expected 0 or 1 for a boolean, found {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchFilter {
    pub full_text_in_all: String,
    pub exclude_subobjects: SdkBoolean,
    pub source_tags: Vec<String>,
    pub source_tags_blacklist: SdkBoolean,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    pub start: u64,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostProcessing {
    pub ids_only: SdkBoolean,
    pub skip_info: SdkBoolean,
    pub skip_keys: SdkBoolean,
    pub skip_data: SdkBoolean,
    pub include_highlights: SdkBoolean,
    pub add_narrative_info: SdkBoolean,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessFilter {
    pub with_private: SdkBoolean,
    pub with_public: SdkBoolean,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortingRule {
    pub is_object_property: SdkBoolean,
    pub property: String,
    pub ascending: SdkBoolean,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchObjectsParams {
    pub match_filter: MatchFilter,
    pub pagination: Pagination,
    pub post_processing: PostProcessing,
    pub access_filter: AccessFilter,
    pub sorting_rules: Vec<SortingRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectData {
    pub object_name: String,
    pub access_group: i64,
    pub obj_id: i64,
    pub version: i64,
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub object_type: String,
    pub creator: String,
    #[serde(default)]
    pub data: Option<Map<String, Value>>,
    #[serde(default)]
    pub key_props: Option<Map<String, Value>>,
    pub guid: String,
    #[serde(default)]
    pub kbase_id: Option<String>,
    #[serde(default)]
    pub index_name: Option<String>,
    #[serde(default)]
    pub type_ver: Option<i64>,
    #[serde(default)]
    pub highlight: HashMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchObjectsResult {
    pub pagination: Pagination,
    pub sorting_rules: Vec<SortingRule>,
    pub total: u64,
    pub search_time: u64,
    pub objects: Vec<ObjectData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchTypesParams {
    pub match_filter: MatchFilter,
    pub access_filter: AccessFilter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchTypesResult {
    pub type_to_count: HashMap<String, u64>,
    pub search_time: u64,
}

/// Client for the Search2 legacy endpoint
#[derive(Debug, Clone)]
pub struct Search2LegacyClient {
    service: ServiceClient,
}

impl Search2LegacyClient {
    pub fn new(client: RpcClient) -> RpcClientResult<Self> {
        if client.dialect() != Dialect::V2_0 {
            return Err(RpcClientError::config(format!(
                "{} speaks {}, not {}",
                SEARCH2_MODULE,
                Dialect::V2_0,
                client.dialect()
            )));
        }
        Ok(Self {
            service: ServiceClient::new(SEARCH2_MODULE, client),
        })
    }

    pub async fn search_objects(
        &self,
        params: &SearchObjectsParams,
    ) -> RpcClientResult<SearchObjectsResult> {
        self.service.call_func_single("search_objects", params).await
    }

    pub async fn search_types(
        &self,
        params: &SearchTypesParams,
    ) -> RpcClientResult<SearchTypesResult> {
        self.service.call_func_single("search_types", params).await
    }
}

impl SearchTypesParams {
    /// Full-text search across public and private data
    pub fn full_text(text: impl Into<String>) -> Self {
        Self {
            match_filter: MatchFilter {
                full_text_in_all: text.into(),
                exclude_subobjects: SdkBoolean(true),
                source_tags: vec!["refdata".to_string(), "noindex".to_string()],
                source_tags_blacklist: SdkBoolean(true),
            },
            access_filter: AccessFilter {
                with_private: SdkBoolean(true),
                with_public: SdkBoolean(true),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sdk_boolean_wire_form() {
        assert_eq!(serde_json::to_value(SdkBoolean(true)).unwrap(), json!(1));
        assert_eq!(serde_json::to_value(SdkBoolean(false)).unwrap(), json!(0));
        assert_eq!(serde_json::from_value::<SdkBoolean>(json!(1)).unwrap(), SdkBoolean(true));
        assert!(serde_json::from_value::<SdkBoolean>(json!(2)).is_err());
        assert!(serde_json::from_value::<SdkBoolean>(json!(true)).is_err());
    }

    #[test]
    fn test_search_types_params_shape() {
        let params = SearchTypesParams::full_text("Prochlorococcus");
        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value["match_filter"]["full_text_in_all"], "Prochlorococcus");
        assert_eq!(value["match_filter"]["exclude_subobjects"], 1);
        assert_eq!(value["access_filter"], json!({"with_private": 1, "with_public": 1}));
    }

    #[test]
    fn test_search_objects_result_decodes() {
        let result: SearchObjectsResult = serde_json::from_value(json!({
            "pagination": {"start": 0, "count": 1},
            "sorting_rules": [{"is_object_property": 0, "property": "timestamp", "ascending": 0}],
            "total": 1,
            "search_time": 42,
            "objects": [{
                "object_name": "Prochlorococcus_marinus",
                "access_group": 33192,
                "obj_id": 2,
                "version": 1,
                "timestamp": 1531222570501i64,
                "type": "Genome",
                "creator": "kbasedata",
                "data": {"scientific_name": "Prochlorococcus marinus"},
                "key_props": {},
                "guid": "WS:33192/2/1",
                "kbase_id": "33192/2/1",
                "index_name": "genome_2",
                "type_ver": 0,
                "highlight": {"scientific_name": ["<em>Prochlorococcus</em> marinus"]}
            }]
        }))
        .unwrap();
        assert_eq!(result.objects[0].object_type, "Genome");
        assert!(!bool::from(result.sorting_rules[0].ascending));
        assert_eq!(result.objects[0].highlight["scientific_name"].len(), 1);
    }

    #[test]
    fn test_requires_v20_client() {
        let client = RpcClient::new("http://localhost:5000", Dialect::V1_1).unwrap();
        assert!(Search2LegacyClient::new(client).is_err());
    }
}
