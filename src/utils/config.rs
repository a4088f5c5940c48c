//! Application configuration constants.
//! Limits, defaults and package-derived file names in one place.

use std::sync::OnceLock;
use std::time::Duration;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    pkg_name: &'static str,
    settings_filename: String,
    cookie_env_key: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                pkg_name: pkg,
                settings_filename: format!("{pkg}.toml"),
                cookie_env_key: format!("{}_COOKIE", pkg.to_uppercase()),
            }
        })
    }

    pub fn pkg_name(&self) -> &str {
        self.pkg_name
    }

    /// Settings file looked up in the working directory (e.g. `quakeq.toml`).
    pub fn settings_filename(&self) -> &str {
        &self.settings_filename
    }

    /// Environment variable holding the auth cookie string (e.g. `QUAKEQ_COOKIE`).
    pub fn cookie_env_key(&self) -> &str {
        &self.cookie_env_key
    }
}

// ---- Paging ----

/// Hard per-page ceiling. Every page request carries 1..=100 records.
pub const PAGE_SIZE_CEILING: usize = 100;

// ---- Engine defaults ----

/// Defaults for [`EngineConfig`](crate::EngineConfig) and [`Opts`](crate::Opts).
pub struct EngineDefaults;

impl EngineDefaults {
    pub const BASE_URL: &'static str =
        "https://quake.360.net/api/search/query_string/quake_service";
    pub const USER_AGENT: &'static str =
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
    pub const SHORTCUT: &'static str = "63734bfa9c27d4249ca7261c";
    /// Total records requested when the caller gives no size.
    pub const DEFAULT_SIZE: usize = 100;
    /// Largest total the CLI accepts before capping.
    pub const MAX_SIZE: usize = 1000;
    /// Ceiling on concurrent page fetches.
    pub const MAX_WORKERS: usize = 10;
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
    pub const PACING: Duration = Duration::from_millis(100);
    pub const POLL_INTERVAL: Duration = Duration::from_millis(50);
    /// Request date format stamped into the device payload.
    pub const DATE_FORMAT: &'static str = "%Y/%m/%d %H:%M:%S";

    pub fn export_fields() -> Vec<String> {
        [
            "domain",
            "ip",
            "port",
            "service.name",
            "location.country_cn",
            "location.province_cn",
            "location.city_cn",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }
}

// ---- Export ----

/// Prefix of generated export file names (`quake_results_<timestamp>.<ext>`).
pub const EXPORT_FILE_PREFIX: &str = "quake_results";
/// Timestamp format in generated export file names.
pub const EXPORT_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
