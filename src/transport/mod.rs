//! The one network capability the engine needs: a synchronous POST.

pub mod cookies;
pub mod http;

pub use cookies::{cookie_header, parse_cookie_string};
pub use http::HttpTransport;

use crate::error::TransportError;
use crate::{Cookies, Headers};

/// Raw reply: status code and body text. Interpreting either is the fetcher's job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs one blocking request. Shared by every worker thread, so it must be `Send + Sync`.
/// Implementations apply their own timeout.
pub trait Transport: Send + Sync {
    fn post(
        &self,
        url: &str,
        headers: &Headers,
        payload: &serde_json::Value,
        cookies: &Cookies,
    ) -> Result<TransportResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn post(
        &self,
        url: &str,
        headers: &Headers,
        payload: &serde_json::Value,
        cookies: &Cookies,
    ) -> Result<TransportResponse, TransportError> {
        (**self).post(url, headers, payload, cookies)
    }
}
