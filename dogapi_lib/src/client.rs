//! Request orchestration for the monitoring REST API.
//!
//! Every call goes through [`Client::execute`] (or [`Client::execute_no_content`]):
//! credentials are appended to a copy of the caller's query parameters, the
//! transport performs the exchange, and the response is classified by status
//! class and media type.

use crate::config::{ClientConfig, ConfigError};
use crate::error::{ApiError, Error, Result};
use crate::params::Params;
use crate::rate_limit::{RateLimit, RateLimitTracker};
use crate::transport::{
    CancelSignal, Deadline, Envelope, HttpTransport, RequestContent, Transport, TransportError,
    TransportRequest,
};
use crate::types::{ApiErrorInfo, NoContent};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// One API call: method, path below the host, optional query, body and cancel signal.
///
/// Query parameters are borrowed; the client works on its own copy.
#[derive(Debug, Clone)]
pub struct ApiRequest<'a> {
    method: Method,
    path: String,
    params: Option<&'a Params>,
    body: Option<RequestContent>,
    cancel: Option<CancelSignal>,
}

impl<'a> ApiRequest<'a> {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        let mut path = path.into();
        if !path.starts_with('/') {
            path.insert(0, '/');
        }
        Self {
            method,
            path,
            params: None,
            body: None,
            cancel: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    #[must_use]
    pub fn params(mut self, params: &'a Params) -> Self {
        self.params = Some(params);
        self
    }

    #[must_use]
    pub fn body(mut self, body: RequestContent) -> Self {
        self.body = Some(body);
        self
    }

    pub fn json<B: Serialize + ?Sized>(self, body: &B) -> std::result::Result<Self, serde_json::Error> {
        Ok(self.body(RequestContent::json(body)?))
    }

    /// Bound the call by `signal` instead of the client's timeout.
    #[must_use]
    pub fn cancel_on(mut self, signal: CancelSignal) -> Self {
        self.cancel = Some(signal);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// How a response is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disposition {
    Success,
    ApiError,
    Http,
}

fn classify(status: u16, media_type: Option<&str>) -> Disposition {
    match (status, media_type) {
        (200..=299, _) => Disposition::Success,
        (_, Some(mt)) if is_json_media_type(mt) => Disposition::ApiError,
        _ => Disposition::Http,
    }
}

fn is_json_media_type(media_type: &str) -> bool {
    let essence = media_type.split(';').next().unwrap_or_default().trim();
    essence.eq_ignore_ascii_case("application/json") || essence.eq_ignore_ascii_case("text/json")
}

enum Adapter<T> {
    Owned(T),
    Shared(Arc<T>),
}

impl<T> Adapter<T> {
    fn get(&self) -> &T {
        match self {
            Adapter::Owned(t) => t,
            Adapter::Shared(t) => t,
        }
    }
}

/// Monitoring API client.
///
/// Owns its transport when built by [`Client::new`], [`Client::from_config`] or
/// [`Client::with_transport`], and only borrows it when given an `Arc` through
/// [`Client::with_shared_transport`]. [`Client::close`] (or drop) releases an
/// owned transport once and leaves a shared one alone.
pub struct Client<T: Transport = HttpTransport> {
    api_key: String,
    app_key: Option<String>,
    host: String,
    timeout: Duration,
    adapter: Option<Adapter<T>>,
    rate_limit: RateLimitTracker,
}

impl Client<HttpTransport> {
    /// Client for the default host with an internally created transport.
    pub fn new(api_key: impl Into<String>) -> std::result::Result<Self, ConfigError> {
        Self::from_config(ClientConfig::new(api_key))
    }

    /// Validate `config` and create the default transport for it.
    pub fn from_config(config: ClientConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let transport =
            HttpTransport::new().map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> Client<T> {
    /// Take ownership of `transport`; it is closed with the client.
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self::build(config, Adapter::Owned(transport))
    }

    /// Use a transport the caller keeps ownership of; the client never closes it.
    pub fn with_shared_transport(config: ClientConfig, transport: Arc<T>) -> Self {
        Self::build(config, Adapter::Shared(transport))
    }

    fn build(config: ClientConfig, adapter: Adapter<T>) -> Self {
        let ClientConfig {
            api_key,
            app_key,
            host,
            timeout,
        } = config;
        Self {
            api_key,
            app_key,
            host: host.trim_end_matches('/').to_string(),
            timeout,
            adapter: Some(adapter),
            rate_limit: RateLimitTracker::new(),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn app_key(&self) -> Option<&str> {
        self.app_key.as_deref()
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Bound for calls made without a cancel signal.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Most recent rate-limit snapshot from any response, if one was ever reported.
    pub fn latest_rate_limit(&self) -> Option<RateLimit> {
        self.rate_limit.latest()
    }

    pub fn is_closed(&self) -> bool {
        self.adapter.is_none()
    }

    /// Release the transport if this client owns it. Safe to call repeatedly.
    pub fn close(&mut self) {
        match self.adapter.take() {
            Some(Adapter::Owned(transport)) => {
                debug!("closing owned transport");
                transport.close();
            }
            Some(Adapter::Shared(_)) => debug!("detaching from shared transport"),
            None => {}
        }
    }

    /// Perform `request` and decode a 2xx body as JSON into `R`.
    pub async fn execute<R: DeserializeOwned>(&self, request: ApiRequest<'_>) -> Result<R> {
        let envelope = self.dispatch(request).await?;
        match classify(envelope.status, envelope.media_type.as_deref()) {
            Disposition::Success => decode_json(&envelope.body),
            disposition => Err(failure(disposition, &envelope)),
        }
    }

    /// Perform `request` and ignore the body of a 2xx response.
    pub async fn execute_no_content(&self, request: ApiRequest<'_>) -> Result<NoContent> {
        let envelope = self.dispatch(request).await?;
        match classify(envelope.status, envelope.media_type.as_deref()) {
            Disposition::Success => Ok(NoContent),
            disposition => Err(failure(disposition, &envelope)),
        }
    }

    async fn dispatch(&self, request: ApiRequest<'_>) -> Result<Envelope> {
        let ApiRequest {
            method,
            path,
            params,
            body,
            cancel,
        } = request;

        let mut query = params.cloned().unwrap_or_default();
        query.add("api_key", self.api_key.as_str());
        if let Some(app_key) = &self.app_key {
            query.add("application_key", app_key.as_str());
        }

        let deadline = match cancel {
            Some(signal) => Deadline::Cancel(signal),
            None => Deadline::Timeout(self.timeout),
        };

        let adapter = self
            .adapter
            .as_ref()
            .ok_or_else(|| Error::Transport(Box::new(TransportError::Closed)))?;

        debug!(%method, %path, "sending request");
        let transport_request = TransportRequest {
            method: method.clone(),
            url: format!("{}{}", self.host, path),
            headers: Vec::new(),
            query,
            body,
            deadline,
        };
        let envelope = adapter
            .get()
            .send(transport_request)
            .await
            .map_err(|cause| {
                let err = Error::from_transport(cause);
                warn!(%method, %path, error = %err, "request failed");
                err
            })?;

        if let Some(snapshot) = &envelope.rate_limit {
            self.rate_limit.record(snapshot.clone());
        }
        debug!(
            %method,
            %path,
            status = envelope.status,
            media_type = envelope.media_type.as_deref().unwrap_or("-"),
            "response received"
        );
        Ok(envelope)
    }
}

impl<T: Transport> Drop for Client<T> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<T: Transport> std::fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("host", &self.host)
            .field("timeout", &self.timeout)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

fn decode_json<R: DeserializeOwned>(body: &[u8]) -> Result<R> {
    serde_json::from_slice(body).map_err(|e| Error::invalid_json(body, e))
}

fn failure(disposition: Disposition, envelope: &Envelope) -> Error {
    match disposition {
        Disposition::ApiError => match decode_json::<ApiErrorInfo>(&envelope.body) {
            Ok(info) => ApiError::new(envelope.status, info.errors).into(),
            Err(err) => err,
        },
        Disposition::Http | Disposition::Success => Error::Http {
            status: envelope.status,
        },
    }
}
