//! Load `quakeq.toml` (CLI only). Lib callers build an `EngineConfig` themselves.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::{ExportFormat, Opts};

#[derive(Debug, Default, Deserialize)]
pub struct SettingsToml {
    #[serde(default)]
    api: ApiSection,
    #[serde(default)]
    query: QuerySection,
    #[serde(default)]
    device: DeviceSection,
    #[serde(default)]
    export: ExportSection,
    #[serde(default)]
    auth: AuthSection,
}

#[derive(Debug, Default, Deserialize)]
struct ApiSection {
    base_url: Option<String>,
    headers: Option<BTreeMap<String, String>>,
    timeout_secs: Option<u64>,
    shortcuts: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct QuerySection {
    default_size: Option<usize>,
    max_size: Option<usize>,
    max_workers: Option<usize>,
    pacing_ms: Option<u64>,
    deadline_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct DeviceSection {
    device_type: Option<String>,
    os: Option<String>,
    os_version: Option<String>,
    language: Option<String>,
    network: Option<String>,
    browser_info: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ExportSection {
    fields: Option<Vec<String>>,
    format: Option<ExportFormat>,
}

#[derive(Debug, Default, Deserialize)]
struct AuthSection {
    cookie: Option<String>,
}

/// Load settings from `path` if present. Returns None if the file is missing or unreadable.
pub fn load_settings_toml(path: &Path) -> Option<SettingsToml> {
    let s = std::fs::read_to_string(path).ok()?;
    parse_settings_toml(&s)
        .map_err(|e| log::warn!("{}: {}", path.display(), e))
        .ok()
}

pub fn parse_settings_toml(s: &str) -> Result<SettingsToml, toml::de::Error> {
    toml::from_str(s)
}

/// Overwrite opts field from file when present.
macro_rules! apply_file_opt {
    ($section:expr, $target:expr, $field:ident => $target_field:ident) => {
        if let Some(v) = $section.$field.clone() {
            $target.$target_field = v;
        }
    };
}

/// Apply file settings to opts (only fields present in the file). Call before applying CLI
/// flags. The query itself is never read from the file.
pub fn apply_file_to_opts(file: &SettingsToml, opts: &mut Opts) {
    let api = &file.api;
    apply_file_opt!(api, opts.engine, base_url => base_url);
    if let Some(ref headers) = api.headers {
        opts.engine.headers.extend(headers.clone());
    }
    if let Some(secs) = api.timeout_secs {
        opts.engine.request_timeout = Duration::from_secs(secs);
    }
    apply_file_opt!(api, opts.engine, shortcuts => shortcuts);

    let query = &file.query;
    apply_file_opt!(query, opts, default_size => size);
    apply_file_opt!(query, opts, max_size => max_size);
    apply_file_opt!(query, opts, max_workers => max_workers);
    if let Some(ms) = query.pacing_ms {
        opts.engine.pacing = Duration::from_millis(ms);
    }
    if let Some(secs) = query.deadline_secs {
        opts.engine.deadline = (secs > 0).then(|| Duration::from_secs(secs));
    }

    let device = &file.device;
    let info = &mut opts.engine.device;
    apply_file_opt!(device, info, device_type => device_type);
    apply_file_opt!(device, info, os => os);
    apply_file_opt!(device, info, os_version => os_version);
    apply_file_opt!(device, info, language => language);
    apply_file_opt!(device, info, network => network);
    apply_file_opt!(device, info, browser_info => browser_info);

    apply_file_opt!(file.export, opts, fields => export_fields);
    apply_file_opt!(file.export, opts, format => format);

    if let Some(ref cookie) = file.auth.cookie
        && !cookie.trim().is_empty()
    {
        opts.cookie = Some(cookie.clone());
    }
}
