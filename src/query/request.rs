//! Page request payloads.

use serde::Serialize;

use crate::error::{QueryError, QueryResult};
use crate::utils::config::{EngineDefaults, PAGE_SIZE_CEILING};
use crate::{DeviceInfo, EngineConfig};

/// Device block of the payload: configured device info plus per-run user agent and date.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SessionDevice {
    #[serde(flatten)]
    pub info: DeviceInfo,
    pub user_agent: String,
    pub date: String,
}

/// Session metadata shared by every page of a run. Stamped once, so building a page
/// request stays deterministic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionMeta {
    pub device: SessionDevice,
    pub shortcuts: Vec<String>,
}

impl SessionMeta {
    /// Stamp the session with the current local time.
    pub fn now(config: &EngineConfig) -> Self {
        let date = chrono::Local::now()
            .format(EngineDefaults::DATE_FORMAT)
            .to_string();
        Self::at(config, date)
    }

    /// Stamp the session with a fixed date string.
    pub fn at(config: &EngineConfig, date: impl Into<String>) -> Self {
        Self {
            device: SessionDevice {
                info: config.device.clone(),
                user_agent: config.user_agent().to_string(),
                date: date.into(),
            },
            shortcuts: config.shortcuts.clone(),
        }
    }
}

/// JSON body POSTed for one page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    pub query: String,
    pub size: usize,
    pub start: usize,
    pub latest: bool,
    pub ignore_cache: bool,
    pub shortcuts: Vec<String>,
    pub device: SessionDevice,
}

/// Build the request for one page. `size` is clamped to `1..=100`; negative bounds are
/// rejected.
pub fn build_page_request(
    query: &str,
    size: i64,
    start: i64,
    session: &SessionMeta,
) -> QueryResult<PageRequest> {
    if size < 0 || start < 0 {
        return Err(QueryError::invalid("invalid page bounds"));
    }
    let size = (size as u64).clamp(1, PAGE_SIZE_CEILING as u64) as usize;
    let start = usize::try_from(start).map_err(|_| QueryError::invalid("invalid page bounds"))?;
    Ok(PageRequest {
        query: query.to_string(),
        size,
        start,
        latest: true,
        ignore_cache: false,
        shortcuts: session.shortcuts.clone(),
        device: session.device.clone(),
    })
}
