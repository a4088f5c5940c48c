//! One page: bounds → request → transport → normalized [`PageResult`].

use std::sync::Arc;

use log::{debug, info, warn};
use serde_json::Value;

use crate::error::{FailureKind, PageError};
use crate::query::{Query, SessionMeta, build_page_request, page_span};
use crate::transport::Transport;
use crate::{Cookies, EngineConfig, Metadata, PageResult, Record};

/// Longest body excerpt logged for a failed page.
const BODY_EXCERPT_CHARS: usize = 200;

/// Everything a worker needs to fetch any page of a run. Shared read-only via `Arc`.
pub struct PageFetcher {
    transport: Arc<dyn Transport>,
    config: Arc<EngineConfig>,
    cookies: Cookies,
    session: SessionMeta,
}

impl PageFetcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        config: Arc<EngineConfig>,
        cookies: Cookies,
        session: SessionMeta,
    ) -> Self {
        Self {
            transport,
            config,
            cookies,
            session,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fetch page `page_index` of a `total_size` request. Never retries; failures come back
    /// as a `PageResult` with `error` set and no items.
    pub fn fetch(&self, query: &Query, page_index: usize, total_size: usize) -> PageResult {
        let Some(span) = page_span(page_index, total_size) else {
            return failed(
                page_index,
                0,
                FailureKind::InvalidRequest(format!(
                    "page {page_index} is past the end of {total_size} records"
                )),
            );
        };
        let pages_total = crate::query::pages_for(total_size);
        info!(
            "Fetching page {}/{} (start: {}, size: {})",
            page_index + 1,
            pages_total,
            span.start,
            span.size
        );

        let payload = build_page_request(
            query.cleaned(),
            span.size as i64,
            span.start as i64,
            &self.session,
        )
        .map_err(|e| FailureKind::InvalidRequest(e.to_string()))
        .and_then(|req| {
            serde_json::to_value(&req).map_err(|e| FailureKind::InvalidRequest(e.to_string()))
        });
        let payload = match payload {
            Ok(p) => p,
            Err(kind) => return failed(page_index, span.size, kind),
        };

        let response = match self.transport.post(
            &self.config.base_url,
            &self.config.headers,
            &payload,
            &self.cookies,
        ) {
            Ok(r) => r,
            Err(e) => return failed(page_index, span.size, e.into()),
        };

        if !response.is_success() {
            debug!(
                "page {} error body: {}",
                page_index,
                excerpt(&response.body)
            );
            return failed(
                page_index,
                span.size,
                FailureKind::Status {
                    code: response.status,
                },
            );
        }

        match parse_page_body(&response.body) {
            Ok((items, metadata)) => {
                info!(
                    "Retrieved {} results from page {}",
                    items.len(),
                    page_index + 1
                );
                if items.len() < span.size {
                    warn!(
                        "Page {} returned fewer results than requested ({} < {})",
                        page_index + 1,
                        items.len(),
                        span.size
                    );
                }
                PageResult {
                    page_index,
                    requested: span.size,
                    items,
                    metadata,
                    error: None,
                }
            }
            Err(kind) => failed(page_index, span.size, kind),
        }
    }
}

/// Split a response body into `data` items and `meta` object.
/// The body must be a JSON object with a `data` array; `meta` is optional.
pub fn parse_page_body(body: &str) -> Result<(Vec<Record>, Metadata), FailureKind> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| FailureKind::MalformedBody(e.to_string()))?;
    let Value::Object(mut obj) = value else {
        return Err(FailureKind::MalformedBody(
            "response is not a JSON object".to_string(),
        ));
    };
    let items = match obj.remove("data") {
        Some(Value::Array(items)) => items,
        _ => {
            let hint = obj
                .get("message")
                .and_then(Value::as_str)
                .map(|m| format!(" (message: {m})"))
                .unwrap_or_default();
            return Err(FailureKind::MalformedBody(format!(
                "missing `data` array{hint}"
            )));
        }
    };
    let metadata = match obj.remove("meta") {
        Some(Value::Object(meta)) => meta,
        _ => Metadata::new(),
    };
    Ok((items, metadata))
}

fn failed(page_index: usize, requested: usize, kind: FailureKind) -> PageResult {
    PageResult {
        page_index,
        requested,
        error: Some(PageError { page_index, kind }),
        ..Default::default()
    }
}

fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_CHARS).collect()
}
