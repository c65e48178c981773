//! Transport adapter contract and the default `reqwest` implementation.
//!
//! The client never touches the network itself: it hands a [`TransportRequest`]
//! to a [`Transport`] and interprets the returned [`Envelope`]. Credentials only
//! ever travel in [`TransportRequest::query`].

use crate::error::BoxError;
use crate::params::Params;
use crate::rate_limit::RateLimit;
use reqwest::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::Client as HttpClient;
use reqwest::Method;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use url::Url;

/// Performs one HTTP exchange.
///
/// Implementations may return a boxed [`crate::Error`] to report an already
/// classified failure; anything else is wrapped as a transport failure by the
/// client.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: TransportRequest,
    ) -> impl Future<Output = Result<Envelope, BoxError>> + Send;

    /// Release the adapter. Called at most once, and only by a client that owns it.
    fn close(self)
    where
        Self: Sized,
    {
    }
}

/// Everything a transport needs for one call.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    /// Host plus path, without query string.
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query: Params,
    pub body: Option<RequestContent>,
    pub deadline: Deadline,
}

/// How a call is bounded. Exactly one applies per call.
#[derive(Debug, Clone)]
pub enum Deadline {
    Timeout(Duration),
    Cancel(CancelSignal),
}

/// Pre-serialised request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContent {
    pub content_type: String,
    pub data: Vec<u8>,
}

impl RequestContent {
    pub fn new(content_type: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::new("application/json", serde_json::to_vec(value)?))
    }
}

/// What came back from the server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Envelope {
    pub status: u16,
    /// Lower-cased media type without parameters (`application/json`).
    pub media_type: Option<String>,
    pub body: Vec<u8>,
    pub rate_limit: Option<RateLimit>,
}

/// Caller side of a cancellation pair.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// A signal to pass with a request. Every signal from this handle fires together.
    pub fn signal(&self) -> CancelSignal {
        CancelSignal {
            rx: self.tx.subscribe(),
        }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Request side of a cancellation pair.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the handle cancels. Never resolves if the handle is
    /// dropped without cancelling.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        let handle_dropped = rx.wait_for(|cancelled| *cancelled).await.is_err();
        if handle_dropped {
            std::future::pending::<()>().await;
        }
    }
}

/// Failures raised by [`HttpTransport`] and by a closed client.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("request cancelled")]
    Cancelled,

    #[error("client has been closed")]
    Closed,

    #[error("could not build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
}

/// Default transport over `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: HttpClient,
    user_agent: String,
}

impl HttpTransport {
    pub fn new() -> Result<Self, TransportError> {
        let http = HttpClient::builder()
            .build()
            .map_err(TransportError::Build)?;
        Ok(Self::with_client(http))
    }

    /// Use a preconfigured `reqwest` client (proxies, TLS roots, pools).
    pub fn with_client(http: HttpClient) -> Self {
        Self {
            http,
            user_agent: format!("dogapi-rs/{}", crate::VERSION),
        }
    }

    async fn exchange(&self, request: TransportRequest) -> Result<Envelope, TransportError> {
        let TransportRequest {
            method,
            url,
            headers,
            query,
            body,
            deadline,
        } = request;

        let mut url = Url::parse(&url)?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query.iter() {
                pairs.append_pair(k, v);
            }
        }

        let mut builder = self
            .http
            .request(method, url)
            .header(USER_AGENT, self.user_agent.as_str())
            .header(ACCEPT, "application/json");
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(content) = body {
            builder = builder
                .header(CONTENT_TYPE, content.content_type.as_str())
                .body(content.data);
        }
        if let Deadline::Timeout(timeout) = &deadline {
            builder = builder.timeout(*timeout);
        }

        let exchange = async move {
            let response = builder.send().await?;
            let status = response.status().as_u16();
            let media_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(media_type_of);
            let rate_limit = RateLimit::from_headers(response.headers());
            let body = response.bytes().await?.to_vec();
            Ok::<_, TransportError>(Envelope {
                status,
                media_type,
                body,
                rate_limit,
            })
        };

        match deadline {
            Deadline::Timeout(_) => exchange.await,
            Deadline::Cancel(signal) => {
                tokio::select! {
                    result = exchange => result,
                    () = signal.cancelled() => Err(TransportError::Cancelled),
                }
            }
        }
    }
}

impl Transport for HttpTransport {
    fn send(
        &self,
        request: TransportRequest,
    ) -> impl Future<Output = Result<Envelope, BoxError>> + Send {
        async move { self.exchange(request).await.map_err(BoxError::from) }
    }
}

/// `Application/JSON; charset=utf-8` -> `application/json`.
fn media_type_of(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
