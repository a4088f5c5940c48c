//! Shared test doubles: a scripted in-memory transport.

#![allow(dead_code)]

use quakeq::transport::{Transport, TransportResponse};
use quakeq::{
    CancellationToken, Cookies, EngineConfig, Headers, ProgressSink, Query, QueryResult,
    RunOutcome, RunParams, TransportError,
};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Behavior =
    dyn Fn(usize, usize) -> Result<TransportResponse, TransportError> + Send + Sync + 'static;

/// Transport whose reply for each page comes from a closure `(page_index, size) -> reply`.
/// Records every call and tracks how many calls overlap.
pub struct ScriptedTransport {
    behavior: Box<Behavior>,
    pub calls: Mutex<Vec<Value>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new<F>(behavior: F) -> Arc<Self>
    where
        F: Fn(usize, usize) -> Result<TransportResponse, TransportError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            behavior: Box::new(behavior),
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    /// Every page answers with exactly the number of items it asked for.
    pub fn full_pages() -> Arc<Self> {
        Self::new(|page, size| Ok(ok_page(page, size)))
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// `(start, size)` of every call, sorted by start.
    pub fn spans(&self) -> Vec<(u64, u64)> {
        let mut spans: Vec<(u64, u64)> = self
            .calls
            .lock()
            .unwrap()
            .iter()
            .map(|p| (p["start"].as_u64().unwrap(), p["size"].as_u64().unwrap()))
            .collect();
        spans.sort();
        spans
    }
}

impl Transport for ScriptedTransport {
    fn post(
        &self,
        _url: &str,
        _headers: &Headers,
        payload: &Value,
        _cookies: &Cookies,
    ) -> Result<TransportResponse, TransportError> {
        self.calls.lock().unwrap().push(payload.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let start = payload["start"].as_u64().unwrap() as usize;
        let size = payload["size"].as_u64().unwrap() as usize;
        let reply = (self.behavior)(start / 100, size);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        reply
    }
}

/// Item `i` of page `page`.
pub fn item(page: usize, i: usize) -> Value {
    json!({ "page": page, "i": i })
}

/// 200 reply with `n` items tagged with `page` and a `meta` block.
pub fn ok_page(page: usize, n: usize) -> TransportResponse {
    let data: Vec<Value> = (0..n).map(|i| item(page, i)).collect();
    let mut meta = serde_json::Map::new();
    meta.insert("last_page".to_string(), json!(page));
    meta.insert(format!("page_{page}"), json!(true));
    TransportResponse {
        status: 200,
        body: json!({
            "code": 0,
            "data": data,
            "meta": meta,
            "message": "Successful."
        })
        .to_string(),
    }
}

pub fn status(code: u16) -> TransportResponse {
    TransportResponse {
        status: code,
        body: "{\"message\":\"nope\"}".to_string(),
    }
}

/// Engine config tuned for tests: no pacing, fast polling.
pub fn test_config() -> EngineConfig {
    EngineConfig {
        pacing: Duration::ZERO,
        poll_interval: Duration::from_millis(5),
        ..EngineConfig::default()
    }
}

pub fn cookies() -> Cookies {
    let mut c = Cookies::new();
    c.insert("session".to_string(), "abc".to_string());
    c
}

/// Run `query` through `transport` with the test config.
pub fn run(
    transport: Arc<ScriptedTransport>,
    config: &EngineConfig,
    total_size: usize,
    max_workers: usize,
    cancel: &CancellationToken,
    progress: &dyn ProgressSink,
) -> QueryResult<RunOutcome> {
    let query = Query::new("domain: example.com").unwrap();
    quakeq::run_query_with_transport(
        transport,
        config,
        cookies(),
        RunParams {
            query: &query,
            total_size,
            max_workers,
            cancel,
            progress,
        },
    )
}
