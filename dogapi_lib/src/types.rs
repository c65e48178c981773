//! Wire DTOs. Field names follow the API's snake_case JSON.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Body of a non-2xx JSON response: `{"errors": ["..."]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorInfo {
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Marker result for operations whose successful response has no body worth decoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoContent;

/// Dashboard template variable.
///
/// No dedicated endpoint wraps dashboards; callers embed these in request
/// bodies sent with [`ApiRequest::json`](crate::ApiRequest::json).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateVariable {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

/// `GET /api/v1/validate`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub valid: bool,
}

/// `GET /api/v1/tags/hosts`: tag -> hosts carrying it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostTags {
    #[serde(default)]
    pub tags: BTreeMap<String, Vec<String>>,
}
