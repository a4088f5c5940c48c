//! Blocking HTTP transport on `reqwest`.

use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use reqwest::header::COOKIE;

use super::cookies::cookie_header;
use super::{Transport, TransportResponse};
use crate::error::TransportError;
use crate::{Cookies, Headers};

/// Pooled blocking client. One instance is shared by all workers of a run.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Client with a per-request `timeout`. System proxy settings are ignored.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).no_proxy().build()?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn post(
        &self,
        url: &str,
        headers: &Headers,
        payload: &serde_json::Value,
        cookies: &Cookies,
    ) -> Result<TransportResponse, TransportError> {
        let mut req = self.client.post(url);
        for (name, value) in headers {
            req = req.header(name.as_str(), value.as_str());
        }
        if let Some(cookie) = cookie_header(cookies) {
            req = req.header(COOKIE, cookie);
        }
        // After the headers so a configured Content-Type is not duplicated.
        let resp = req.json(payload).send().map_err(classify)?;
        let status = resp.status().as_u16();
        debug!("POST {} -> {}", url, status);
        let body = resp.text().map_err(classify)?;
        Ok(TransportResponse { status, body })
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else {
        TransportError::Other(err.to_string())
    }
}
