//! Concrete API operations built on [`Client::execute`].

use crate::client::{ApiRequest, Client};
use crate::error::Result;
use crate::params::Params;
use crate::transport::Transport;
use crate::types::{HostTags, NoContent, ValidateResponse};

impl<T: Transport> Client<T> {
    /// Check that the API key is accepted.
    pub async fn validate(&self) -> Result<ValidateResponse> {
        self.execute(ApiRequest::get("/api/v1/validate")).await
    }

    /// Every host tag, optionally limited to one tag source (e.g. `users`, `chef`).
    pub async fn host_tags(&self, source: Option<&str>) -> Result<HostTags> {
        let params = source_params(source);
        self.execute(ApiRequest::get("/api/v1/tags/hosts").params(&params))
            .await
    }

    /// Remove every tag from `host`.
    pub async fn delete_host_tags(&self, host: &str, source: Option<&str>) -> Result<NoContent> {
        let params = source_params(source);
        let path = format!("/api/v1/tags/hosts/{}", urlencoding::encode(host));
        self.execute_no_content(ApiRequest::delete(path).params(&params))
            .await
    }
}

fn source_params(source: Option<&str>) -> Params {
    let mut params = Params::new();
    if let Some(source) = source {
        params.add("source", source);
    }
    params
}
