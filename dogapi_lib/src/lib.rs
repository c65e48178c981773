//! Monitoring API client library.
//!
//! Provides a typed client for a Datadog-style REST API: credential injection,
//! a pluggable transport, response classification, rate-limit tracking, and
//! `key:value` tag parsing.

pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod params;
pub mod rate_limit;
pub mod tag;
pub mod transport;
pub mod types;

pub use client::{ApiRequest, Client};
pub use config::{ClientConfig, ConfigError, DEFAULT_HOST, DEFAULT_TIMEOUT};
pub use error::{ApiError, BoxError, Error, Result};
pub use params::Params;
pub use rate_limit::{RateLimit, RateLimitTracker};
pub use reqwest::Method;
pub use tag::{split_tag, Tag};
pub use transport::{
    CancelHandle, CancelSignal, Deadline, Envelope, HttpTransport, RequestContent, Transport,
    TransportError, TransportRequest,
};
pub use types::{ApiErrorInfo, HostTags, NoContent, TemplateVariable, ValidateResponse};

/// Library version for User-Agent and diagnostics.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
