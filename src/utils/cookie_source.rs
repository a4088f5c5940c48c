//! Auth cookie loading: flag → env var → .env in dir → settings file → hidden prompt.

use anyhow::{Context, Result};
use colored::Colorize;
use log::{debug, info};
use std::path::Path;

use crate::utils::config::PackagePaths;

fn try_env_then_dotenv(dir: &Path) -> Option<String> {
    let key = PackagePaths::get().cookie_env_key();
    if let Ok(s) = std::env::var(key) {
        let s = s.trim().to_string();
        if !s.is_empty() {
            return Some(s);
        }
    }
    let env_path = dir.join(".env");
    if env_path.is_file() {
        let _ = dotenvy::from_path(&env_path);
        if let Ok(s) = std::env::var(key) {
            let s = s.trim().to_string();
            if !s.is_empty() {
                return Some(s);
            }
        }
    }
    None
}

/// Resolve the raw cookie string: `flag` (`--cookie`), then `QUAKEQ_COOKIE`, then `.env` in
/// `dir`, then `from_settings` (`[auth].cookie`), finally a hidden prompt.
pub fn get_cookie(flag: Option<&str>, from_settings: Option<&str>, dir: &Path) -> Result<String> {
    if let Some(s) = non_blank(flag) {
        return Ok(s);
    }
    if let Some(s) = try_env_then_dotenv(dir) {
        info!("Cookie found in environment");
        return Ok(s);
    }
    if let Some(s) = non_blank(from_settings) {
        debug!("Cookie taken from settings file");
        return Ok(s);
    }
    let label = format!("[{}]", PackagePaths::get().pkg_name()).cyan().bold();
    let cookie =
        rpassword::prompt_password(format!("{} Cookie: ", label)).context("read cookie")?;
    Ok(cookie.trim().to_string())
}

fn non_blank(s: Option<&str>) -> Option<String> {
    s.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
