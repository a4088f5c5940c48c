//! Public and internal types for the quakeq API and pipeline.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::PageError;
use crate::utils::config::EngineDefaults;

/// One search hit. The remote API's record shape is not interpreted by the engine.
pub type Record = serde_json::Value;

/// Response metadata object. Merged last-write-wins per key across pages.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Request headers, sent as-is.
pub type Headers = BTreeMap<String, String>;

/// Parsed authentication cookies (name → value).
pub type Cookies = BTreeMap<String, String>;

/// Device metadata the remote API expects in every request payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub device_type: String,
    pub os: String,
    pub os_version: String,
    pub language: String,
    pub network: String,
    pub browser_info: String,
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self {
            device_type: "PC".to_string(),
            os: "Windows".to_string(),
            os_version: "10.0".to_string(),
            language: "zh_CN".to_string(),
            network: "3g".to_string(),
            browser_info: "Chrome（版本: 100.0.4896.60  内核: Blink）".to_string(),
        }
    }
}

/// Bounds of one page: `start = index * 100`, `size = min(100, total - start)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageSpan {
    pub index: usize,
    pub start: usize,
    pub size: usize,
}

/// Outcome of one page fetch. Owned by the worker that produced it until merged.
#[derive(Clone, Debug, Default)]
pub struct PageResult {
    pub page_index: usize,
    /// Items the page was asked for (used to spot short pages).
    pub requested: usize,
    pub items: Vec<Record>,
    pub metadata: Metadata,
    pub error: Option<PageError>,
}

impl PageResult {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Merged, truncated result across all pages. Owned by the caller once returned.
#[derive(Clone, Debug, Default)]
pub struct AggregateResult {
    /// At most `total_size` records, in merge (completion) order.
    pub items: Vec<Record>,
    pub metadata: Metadata,
    pub pages_completed: usize,
    pub pages_total: usize,
    /// Pages that contributed nothing, in the order they completed.
    pub failures: Vec<PageError>,
}

impl AggregateResult {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Why a run stopped before every page reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CancelReason {
    /// The cancellation token was triggered (e.g. Ctrl+C).
    Requested,
    /// The optional run deadline elapsed.
    DeadlineExceeded,
}

/// Non-error result of [`ConcurrentScheduler::run`](crate::pipeline::ConcurrentScheduler::run).
#[derive(Clone, Debug)]
pub enum RunOutcome {
    Completed(AggregateResult),
    Cancelled {
        partial: AggregateResult,
        reason: CancelReason,
    },
}

impl RunOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunOutcome::Cancelled { .. })
    }

    /// The aggregate, complete or partial.
    pub fn aggregate(&self) -> &AggregateResult {
        match self {
            RunOutcome::Completed(agg) => agg,
            RunOutcome::Cancelled { partial, .. } => partial,
        }
    }

    pub fn into_aggregate(self) -> AggregateResult {
        match self {
            RunOutcome::Completed(agg) => agg,
            RunOutcome::Cancelled { partial, .. } => partial,
        }
    }
}

/// Immutable snapshot handed to a [`ProgressSink`](crate::pipeline::ProgressSink) after each
/// successful merge. `pages_done` counts every completed page, failed ones included.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub pages_done: usize,
    pub pages_total: usize,
    pub running_count: usize,
    pub failed_pages: usize,
}

/// Explicit engine configuration. Built once and shared read-only by every worker.
///
/// The page size ceiling is not configurable; see
/// [`PAGE_SIZE_CEILING`](crate::utils::config::PAGE_SIZE_CEILING).
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Search endpoint receiving one POST per page.
    pub base_url: String,
    pub headers: Headers,
    pub device: DeviceInfo,
    /// Saved-search shortcut ids the API expects alongside the query.
    pub shortcuts: Vec<String>,
    /// Per-request timeout applied by the transport.
    pub request_timeout: Duration,
    /// Fixed delay before dispatching each page after the first.
    pub pacing: Duration,
    /// How often the collector wakes to check the cancellation token while waiting.
    pub poll_interval: Duration,
    /// Optional bound on the whole run. `None` waits as long as the transport does.
    pub deadline: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let mut headers = Headers::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert(
            "User-Agent".to_string(),
            EngineDefaults::USER_AGENT.to_string(),
        );
        Self {
            base_url: EngineDefaults::BASE_URL.to_string(),
            headers,
            device: DeviceInfo::default(),
            shortcuts: vec![EngineDefaults::SHORTCUT.to_string()],
            request_timeout: EngineDefaults::REQUEST_TIMEOUT,
            pacing: EngineDefaults::PACING,
            poll_interval: EngineDefaults::POLL_INTERVAL,
            deadline: None,
        }
    }
}

impl EngineConfig {
    /// User agent from the configured headers (case-insensitive), or the default.
    pub fn user_agent(&self) -> &str {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("user-agent"))
            .map(|(_, v)| v.as_str())
            .unwrap_or(EngineDefaults::USER_AGENT)
    }
}

/// Export formats supported by the CLI.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
    Url,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Url => "txt",
        }
    }
}

/// Full options (CLI). Library callers build an [`EngineConfig`] directly.
#[derive(Clone, Debug)]
pub struct Opts {
    pub engine: EngineConfig,
    /// Raw query text as typed.
    pub query: String,
    /// Total number of records requested.
    pub size: usize,
    /// Upper bound for `size`; larger requests are capped.
    pub max_size: usize,
    pub max_workers: usize,
    /// Raw cookie string (`a=1; b=2`) from the settings file. `--cookie` and the environment
    /// take precedence over it.
    pub cookie: Option<String>,
    pub format: ExportFormat,
    /// Dotted field paths for CSV columns.
    pub export_fields: Vec<String>,
    /// Export destination. When None, a timestamped file name in the working directory.
    pub output: Option<PathBuf>,
    pub verbose: bool,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            query: String::new(),
            size: EngineDefaults::DEFAULT_SIZE,
            max_size: EngineDefaults::MAX_SIZE,
            max_workers: EngineDefaults::MAX_WORKERS,
            cookie: None,
            format: ExportFormat::default(),
            export_fields: EngineDefaults::export_fields(),
            output: None,
            verbose: false,
        }
    }
}
